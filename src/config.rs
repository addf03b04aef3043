use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub mapper: MapperConfig,
    pub store: StoreConfig,
    pub rights_index: RightsIndexConfig,
    pub logging: LoggingConfig,
}

/// Retry policy of the ACL update loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Maximum number of conditional-write attempts per update
    pub max_retries: u32,
    /// Upper bound of the random jitter added to each backoff delay
    pub jitter_ms: u64,
    /// Delay between a lost race and the next read
    pub retry_backoff: RetryBackoffStrategy,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            jitter_ms: 5,
            retry_backoff: RetryBackoffStrategy::Exponential {
                base_ms: 5,
                max_ms: 200,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryBackoffStrategy {
    #[serde(rename = "linear")]
    Linear { increment_ms: u64 },
    #[serde(rename = "exponential")]
    Exponential { base_ms: u64, max_ms: u64 },
    #[serde(rename = "fixed")]
    Fixed { delay_ms: u64 },
}

impl RetryBackoffStrategy {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            RetryBackoffStrategy::Linear { increment_ms } => {
                Duration::from_millis(increment_ms.saturating_mul(attempt as u64 + 1))
            }
            RetryBackoffStrategy::Exponential { base_ms, max_ms } => {
                let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
                let delay = base_ms.saturating_mul(factor);
                Duration::from_millis(std::cmp::min(delay, *max_ms))
            }
            RetryBackoffStrategy::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
        }
    }

    pub fn validate(&self, section: &str) -> crate::Result<()> {
        if let RetryBackoffStrategy::Exponential { base_ms, max_ms } = self {
            if max_ms < base_ms {
                return Err(crate::error::MailboxAclError::InvalidConfig(format!(
                    "{}.retry_backoff.max_ms must be >= base_ms",
                    section
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Deadline applied to every read and conditional write
    pub operation_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RightsIndexConfig {
    /// Attempts per index write before the change is reported as failed
    pub max_retries: u32,
    pub retry_backoff: RetryBackoffStrategy,
}

impl Default for RightsIndexConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: RetryBackoffStrategy::Exponential {
                base_ms: 10,
                max_ms: 500,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub const LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];

    pub fn validate(&self) -> crate::Result<()> {
        if !Self::LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(crate::error::MailboxAclError::InvalidConfig(format!(
                "logging.level '{}' is not one of {:?}",
                self.level,
                Self::LEVELS
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::error::MailboxAclError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.mapper.max_retries == 0 {
            return Err(crate::error::MailboxAclError::InvalidConfig(
                "mapper.max_retries must be greater than 0".to_string(),
            ));
        }

        if self.store.operation_timeout_ms == 0 {
            return Err(crate::error::MailboxAclError::InvalidConfig(
                "store.operation_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.rights_index.max_retries == 0 {
            return Err(crate::error::MailboxAclError::InvalidConfig(
                "rights_index.max_retries must be greater than 0".to_string(),
            ));
        }

        self.mapper.retry_backoff.validate("mapper")?;
        self.rights_index.retry_backoff.validate("rights_index")?;
        self.logging.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mapper.max_retries, 10);
        assert_eq!(config.store.operation_timeout_ms, 5_000);
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut config = Config::default();
        config.mapper.max_retries = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("mapper.max_retries must be greater than 0"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.store.operation_timeout_ms = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("store.operation_timeout_ms"));
    }

    #[test]
    fn test_inverted_exponential_bounds_rejected() {
        let mut config = Config::default();
        config.rights_index.retry_backoff = RetryBackoffStrategy::Exponential {
            base_ms: 100,
            max_ms: 10,
        };
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("rights_index.retry_backoff.max_ms"));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_delays() {
        let exponential = RetryBackoffStrategy::Exponential {
            base_ms: 5,
            max_ms: 200,
        };
        assert_eq!(exponential.delay_for(0), Duration::from_millis(5));
        assert_eq!(exponential.delay_for(3), Duration::from_millis(40));
        assert_eq!(exponential.delay_for(10), Duration::from_millis(200));
        assert_eq!(exponential.delay_for(80), Duration::from_millis(200));

        let linear = RetryBackoffStrategy::Linear { increment_ms: 10 };
        assert_eq!(linear.delay_for(2), Duration::from_millis(30));

        let fixed = RetryBackoffStrategy::Fixed { delay_ms: 7 };
        assert_eq!(fixed.delay_for(9), Duration::from_millis(7));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();
        let deserialized = Config::from_toml_str(&toml_string).unwrap();

        assert!(deserialized.validate().is_ok());
        assert_eq!(deserialized.mapper.retry_backoff, config.mapper.retry_backoff);
        assert_eq!(deserialized.logging.level, "info");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let config = Config {
            mapper: MapperConfig {
                max_retries: 3,
                jitter_ms: 0,
                retry_backoff: RetryBackoffStrategy::Fixed { delay_ms: 1 },
            },
            ..Default::default()
        };
        write!(file, "{}", toml::to_string(&config).unwrap()).unwrap();

        let loaded = Config::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(loaded.mapper.max_retries, 3);
        assert_eq!(
            loaded.mapper.retry_backoff,
            RetryBackoffStrategy::Fixed { delay_ms: 1 }
        );
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = Config::from_toml_str("mapper = [");
        assert!(matches!(
            result,
            Err(crate::error::MailboxAclError::Config(_))
        ));
    }
}
