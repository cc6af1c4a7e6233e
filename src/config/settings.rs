//! Configuration settings for crewsync.
//!
//! Settings are loaded from `~/.crewsync/config.yaml`. Every field has a
//! default, so a partial file (or none at all) is valid.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::error::CrewsyncError;
use crate::offline::{DrainPolicy, QueueLimits};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Training backend settings.
    pub api: ApiConfig,
    /// Offline queue settings.
    pub queue: QueueConfig,
    /// Connectivity monitoring settings.
    pub connectivity: ConnectivityConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    pub default_output: OutputFormat,
    /// Color output setting.
    pub color: ColorSetting,
}

/// Color output setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    /// Auto-detect based on terminal.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

impl ColorSetting {
    /// Apply this setting to the global `colored` override.
    pub fn apply(self) {
        match self {
            Self::Auto => colored::control::unset_override(),
            Self::Always => colored::control::set_override(true),
            Self::Never => colored::control::set_override(false),
        }
    }
}

/// Training backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, without trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Path probed to decide reachability.
    pub health_path: String,
    /// Timeout for the reachability probe in seconds.
    pub probe_timeout_secs: u64,
    /// Language sent with chat queries.
    pub language: String,
    /// Endpoint for procedure completions; `{id}` is replaced with the
    /// procedure ID.
    pub procedure_path: String,
}

/// Placeholder in [`ApiConfig::procedure_path`].
pub const PROCEDURE_ID_PLACEHOLDER: &str = "{id}";

/// Offline queue settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QueueConfig {
    /// What a drain pass does after a failed delivery.
    pub drain_policy: DrainPolicy,
    /// Maximum number of queued actions; oldest are evicted beyond it.
    pub max_items: Option<usize>,
    /// Actions older than this are dropped when the queue is loaded.
    pub max_age_hours: Option<i64>,
}

/// Connectivity monitoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Seconds between reachability probes in `watch` mode.
    pub poll_interval_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Pretty,
            color: ColorSetting::Auto,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            health_path: "/".to_string(),
            probe_timeout_secs: 3,
            language: "en".to_string(),
            procedure_path: "/api/procedures/{id}/complete".to_string(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Probe timeout as a `Duration`.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Check the endpoint settings are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if `procedure_path` has no `{id}` placeholder.
    pub fn validate(&self) -> Result<(), CrewsyncError> {
        if !self.procedure_path.contains(PROCEDURE_ID_PLACEHOLDER) {
            return Err(CrewsyncError::Config(format!(
                "api.procedure_path must contain {PROCEDURE_ID_PLACEHOLDER}, got {}",
                self.procedure_path
            )));
        }
        Ok(())
    }
}

impl QueueConfig {
    /// Queue limits derived from this config.
    ///
    /// An age that does not fit a `TimeDelta` is treated as no age limit;
    /// [`QueueConfig::validate`] rejects it up front.
    #[must_use]
    pub fn limits(&self) -> QueueLimits {
        QueueLimits {
            max_items: self.max_items,
            max_age: self.max_age_hours.and_then(TimeDelta::try_hours),
        }
    }

    /// Check the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_items` is zero or `max_age_hours` is not a
    /// positive number of hours in range.
    pub fn validate(&self) -> Result<(), CrewsyncError> {
        if self.max_items == Some(0) {
            return Err(CrewsyncError::Config(
                "queue.max_items must be at least 1".to_string(),
            ));
        }

        if let Some(hours) = self.max_age_hours {
            if hours <= 0 || TimeDelta::try_hours(hours).is_none() {
                return Err(CrewsyncError::Config(format!(
                    "queue.max_age_hours must be a positive number of hours, got {hours}"
                )));
            }
        }

        Ok(())
    }
}

impl ConnectivityConfig {
    /// Poll interval as a `Duration`, never shorter than one second.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed, or
    /// holds values that cannot be used.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, CrewsyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CrewsyncError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            CrewsyncError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })?;

        config.api.validate()?;
        config.queue.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.general.default_output, OutputFormat::Pretty);
        assert_eq!(config.general.color, ColorSetting::Auto);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.queue.drain_policy, DrainPolicy::StopOnFirstFailure);
        assert!(config.queue.max_items.is_none());
        assert_eq!(config.connectivity.poll_interval_secs, 5);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from_path(&temp_dir.path().join("config.yaml")).unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8000");
    }

    fn load_yaml(yaml: &str) -> Result<Config, CrewsyncError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, yaml).unwrap();
        Config::load_from_path(&config_path)
    }

    #[test]
    fn test_load_full_config() {
        let config = load_yaml(
            r"
api:
  base_url: https://training.example.com
  procedure_path: /api/v2/procedures/{id}/done
queue:
  drain_policy: continue_past_failures
  max_items: 50
",
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://training.example.com");
        assert_eq!(config.api.procedure_path, "/api/v2/procedures/{id}/done");
        assert_eq!(config.queue.max_items, Some(50));
        assert_eq!(config.queue.drain_policy, DrainPolicy::ContinuePastFailures);
    }

    #[test]
    fn test_non_positive_max_age_is_rejected() {
        for hours in ["0", "-1"] {
            let result = load_yaml(&format!("queue:\n  max_age_hours: {hours}\n"));
            assert!(matches!(result, Err(CrewsyncError::Config(_))), "{hours}");
        }
    }

    #[test]
    fn test_out_of_range_max_age_is_rejected() {
        let result = load_yaml("queue:\n  max_age_hours: 9223372036854775807\n");
        assert!(matches!(result, Err(CrewsyncError::Config(msg)) if msg.contains("max_age_hours")));

        // Built by hand, the limits simply carry no age
        let queue = QueueConfig {
            max_age_hours: Some(i64::MAX),
            ..QueueConfig::default()
        };
        assert_eq!(queue.limits().max_age, None);
    }

    #[test]
    fn test_zero_max_items_is_rejected() {
        assert!(matches!(
            load_yaml("queue:\n  max_items: 0\n"),
            Err(CrewsyncError::Config(_))
        ));
    }

    #[test]
    fn test_procedure_path_needs_placeholder() {
        assert!(matches!(
            load_yaml("api:\n  procedure_path: /api/procedures/complete\n"),
            Err(CrewsyncError::Config(_))
        ));
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let partial_yaml = r"
queue:
  drain_policy: continue_past_failures
  max_age_hours: 72
";
        std::fs::write(&config_path, partial_yaml).unwrap();

        let config = Config::load_from_path(&config_path).unwrap();

        assert_eq!(config.queue.drain_policy, DrainPolicy::ContinuePastFailures);
        assert_eq!(config.queue.max_age_hours, Some(72));
        assert_eq!(
            config.queue.limits().max_age,
            TimeDelta::try_hours(72)
        );
        // Defaults for everything else
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.general.default_output, OutputFormat::Pretty);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "queue: [not, a, map]").unwrap();

        assert!(matches!(
            Config::load_from_path(&config_path),
            Err(CrewsyncError::Config(_))
        ));
    }

    #[test]
    fn test_poll_interval_floor() {
        let config = ConnectivityConfig {
            poll_interval_secs: 0,
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
