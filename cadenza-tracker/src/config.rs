//! Tracker configuration
//!
//! Defines all configurable parameters for the tracker including the
//! gateway connection, storage location, list bounds, and retention.

use std::path::PathBuf;
use std::time::Duration;

/// Tracker configuration
///
/// All bounds and intervals are configurable to allow tuning for different
/// deployment scenarios (dev vs prod, fast vs slow networks).
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform API base URL (e.g., "http://localhost:3000")
    pub gateway_url: String,

    /// Directory holding one persisted job list per owner
    pub data_dir: PathBuf,

    /// Most recent entries kept per owner's job list
    pub max_stored_jobs: usize,

    /// How long terminal jobs are retained before garbage collection
    pub retention: Duration,

    /// How often the garbage collector runs
    pub gc_interval: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(gateway_url: String, data_dir: PathBuf) -> Self {
        Self {
            gateway_url,
            data_dir,
            max_stored_jobs: 50,
            retention: Duration::from_secs(24 * 60 * 60),
            gc_interval: Duration::from_secs(60 * 60),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - GATEWAY_URL (required)
    /// - DATA_DIR (optional, default: ./data)
    /// - MAX_STORED_JOBS (optional, default: 50)
    /// - RETENTION_HOURS (optional, default: 24)
    /// - GC_INTERVAL_MINUTES (optional, default: 60)
    pub fn from_env() -> anyhow::Result<Self> {
        let gateway_url = std::env::var("GATEWAY_URL")
            .map_err(|_| anyhow::anyhow!("GATEWAY_URL environment variable not set"))?;

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let max_stored_jobs = std::env::var("MAX_STORED_JOBS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(50);

        let retention = std::env::var("RETENTION_HOURS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|h| Duration::from_secs(h * 60 * 60))
            .unwrap_or(Duration::from_secs(24 * 60 * 60));

        let gc_interval = std::env::var("GC_INTERVAL_MINUTES")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|m| Duration::from_secs(m * 60))
            .unwrap_or(Duration::from_secs(60 * 60));

        Ok(Self {
            gateway_url,
            data_dir,
            max_stored_jobs,
            retention,
            gc_interval,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.gateway_url.is_empty() {
            anyhow::bail!("gateway_url cannot be empty");
        }

        if !self.gateway_url.starts_with("http://") && !self.gateway_url.starts_with("https://") {
            anyhow::bail!("gateway_url must start with http:// or https://");
        }

        if self.max_stored_jobs == 0 {
            anyhow::bail!("max_stored_jobs must be greater than 0");
        }

        if self.retention.as_secs() == 0 {
            anyhow::bail!("retention must be greater than 0");
        }

        if self.gc_interval.as_secs() == 0 {
            anyhow::bail!("gc_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:3000".to_string(), PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_stored_jobs, 50);
        assert_eq!(config.retention, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.gc_interval, Duration::from_secs(60 * 60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Invalid URL should fail
        config.gateway_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.gateway_url = "http://localhost:3000".to_string();
        assert!(config.validate().is_ok());

        // Zero bounds should fail
        config.max_stored_jobs = 0;
        assert!(config.validate().is_err());
    }
}
