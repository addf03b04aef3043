use tracing::Level;

use crate::config::LoggingConfig;
use crate::error::{MailboxAclError, Result};

pub fn parse_level(level: &str) -> Result<Level> {
    level
        .parse::<Level>()
        .map_err(|e| MailboxAclError::InvalidConfig(format!("logging.level '{}': {}", level, e)))
}

/// Install the global fmt subscriber. Returns `Ok(false)` when a subscriber
/// was already installed, which is the case after the first call.
pub fn init(config: &LoggingConfig) -> Result<bool> {
    config.validate()?;
    let level = parse_level(&config.level)?;

    Ok(tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init()
        .is_ok())
}
