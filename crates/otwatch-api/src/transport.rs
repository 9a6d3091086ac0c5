// Shared transport configuration for building reqwest::Client instances.
//
// The regular client and the health-probe client differ only in timeout,
// so both are built from this one config.

use std::time::Duration;

use crate::error::Error;

/// Timeout for regular REST calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the `/health` availability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Transport settings shared by every HTTP client this crate builds.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: REQUEST_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build the client used for regular REST calls.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(concat!("otwatch/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }

    /// Build the short-timeout client used only for the availability probe.
    pub fn build_probe_client(&self) -> Result<reqwest::Client, Error> {
        Ok(reqwest::Client::builder()
            .timeout(self.probe_timeout)
            .user_agent(concat!("otwatch/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }
}
