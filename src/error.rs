use thiserror::Error;

use crate::types::MailboxId;

pub type Result<T> = std::result::Result<T, MailboxAclError>;

#[derive(Error, Debug)]
pub enum MailboxAclError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Concurrent ACL update on mailbox {mailbox_id} gave up after {attempts} attempts")]
    ConcurrencyExhausted {
        mailbox_id: MailboxId,
        attempts: u32,
    },

    #[error("ACL version {version} of mailbox {mailbox_id} cannot be incremented")]
    VersionOverflow {
        mailbox_id: MailboxId,
        version: i64,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Rights index error: {0}")]
    RightsIndex(String),

    #[error("Listener error: {0}")]
    Listener(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation timeout")]
    Timeout,
}

impl MailboxAclError {
    /// Whether a storage call failed because the backend could not be reached
    /// in time, as opposed to a logical failure.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            MailboxAclError::StoreUnavailable(_) | MailboxAclError::Timeout
        )
    }
}
