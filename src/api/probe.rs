//! HTTP reachability probe.

use std::time::Duration;

use tracing::trace;
use ureq::{Agent, AgentBuilder};

use crate::config::ApiConfig;
use crate::offline::ConnectivitySource;

/// Treats the backend as reachable when it answers a GET with any status.
pub struct HttpProbe {
    agent: Agent,
    url: String,
}

impl HttpProbe {
    /// Probe `url` with the given timeout.
    #[must_use]
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            agent: AgentBuilder::new().timeout(timeout).build(),
            url: url.to_string(),
        }
    }

    /// Probe the configured health path.
    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Self {
        let url = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.health_path.trim_start_matches('/')
        );
        Self::new(&url, config.probe_timeout())
    }

    /// The URL being probed.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ConnectivitySource for HttpProbe {
    fn is_reachable(&self) -> bool {
        let reachable = match self.agent.get(&self.url).call() {
            Ok(_) | Err(ureq::Error::Status(..)) => true,
            Err(ureq::Error::Transport(_)) => false,
        };
        trace!(url = %self.url, reachable, "probe");
        reachable
    }
}
