//! Configuration management for crewsync.
//!
//! This module handles loading configuration from `~/.crewsync/`.

mod paths;
mod settings;

pub use paths::{Paths, HOME_ENV};
pub use settings::{
    ApiConfig, ColorSetting, Config, ConnectivityConfig, GeneralConfig, QueueConfig,
    PROCEDURE_ID_PLACEHOLDER,
};
