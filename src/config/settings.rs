use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime settings for discovery runs.
///
/// Every section has defaults, so a profile file may omit `settings:` or any
/// part of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Network timeouts and TLS behaviour
    pub connection: ConnectionSettings,
    /// Credentials handed to the transport
    pub auth: AuthSettings,
    /// Unit fan-out
    pub collection: CollectionSettings,
    /// Severity thresholds applied to unit readings
    pub thresholds: Thresholds,
    /// Fallback generator
    pub synthetic: SyntheticSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Timeout for every data request (seconds)
    pub request_timeout: u64,
    /// Timeout for one endpoint probe (seconds)
    pub probe_timeout: u64,
    /// Upper bound for a whole discovery run (seconds); `None` disables it
    pub run_deadline: Option<u64>,
    /// Accept self-signed certificates, common on on-site API hosts
    pub accept_invalid_certs: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            request_timeout: 15,
            probe_timeout: 10,
            run_deadline: Some(120),
            accept_invalid_certs: false,
        }
    }
}

impl ConnectionSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout.max(1))
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Raw `Cookie` header value, for sessions negotiated elsewhere
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    /// Units resolved concurrently
    pub max_concurrency: usize,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

impl CollectionSettings {
    pub const MAX_WORKERS: usize = 32;

    pub fn workers(&self) -> usize {
        self.max_concurrency.clamp(1, Self::MAX_WORKERS)
    }
}

/// Limits that escalate a unit to warning or alert.
///
/// Water cut is a percentage; pressure ceilings are in the site's units and
/// are disabled when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub water_cut_warning: f64,
    pub water_cut_alert: f64,
    pub tubing_pressure_warning: Option<f64>,
    pub tubing_pressure_alert: Option<f64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            water_cut_warning: 85.0,
            water_cut_alert: 95.0,
            tubing_pressure_warning: None,
            tubing_pressure_alert: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticSettings {
    /// Fixed seed for reproducible output; entropy-seeded when unset
    pub seed: Option<u64>,
    /// Units per synthetic group
    pub group_size: usize,
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            seed: None,
            group_size: 6,
        }
    }
}
