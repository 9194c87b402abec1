use confique::Config;
use std::time::Duration;

/// Configuration for the rotation agent binary
#[derive(Debug, Config, Clone)]
pub struct AgentConfig {
    /// URL of the token service issuance endpoint
    #[config(env = "ROTATION_ISSUE_URL", default = "http://localhost:7000/issue")]
    pub issue_url: String,

    /// Subject the rotated credential is issued to (default: "accounts")
    #[config(env = "ROTATION_SERVICE_ID", default = "accounts")]
    pub service_id: String,

    /// Scope requested for the rotated credential (default: "accounts:read")
    #[config(env = "ROTATION_SCOPE", default = "accounts:read")]
    pub scope: String,

    /// Seconds between rotations (default: 300)
    #[config(env = "ROTATION_INTERVAL_SEC", default = 300)]
    pub interval_sec: u64,

    /// Timeout for a single issuance call in milliseconds (default: 5000)
    #[config(env = "ROTATION_REQUEST_TIMEOUT_MS", default = 5000)]
    pub request_timeout_ms: u64,

    /// Port of the metrics endpoint (default: 9103)
    #[config(env = "ROTATION_METRICS_PORT", default = 9103)]
    pub metrics_port: u16,
}

impl AgentConfig {
    /// Load the configuration from environment variables
    pub fn new() -> Result<Self, String> {
        let config = Self::builder().env().load().map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.interval_sec == 0 {
            return Err("ROTATION_INTERVAL_SEC must be greater than zero".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("ROTATION_REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_sec)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
