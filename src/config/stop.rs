// ABOUTME: Container graceful shutdown configuration.
// ABOUTME: Grace period before a stopping container is killed.

use crate::constants::STOP_TIMEOUT;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct StopConfig {
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    STOP_TIMEOUT
}

impl Default for StopConfig {
    fn default() -> Self {
        StopConfig {
            timeout: default_timeout(),
        }
    }
}
