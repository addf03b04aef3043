use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type Username = String;
pub type Version = i64;

/// Stable identifier of a mailbox, independent of its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MailboxId(Uuid);

impl MailboxId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MailboxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MailboxId {
    type Err = crate::error::MailboxAclError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::error::MailboxAclError::MalformedInput(format!("mailbox id {}: {}", s, e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MailboxPath {
    pub namespace: String,
    pub user: Option<Username>,
    pub name: String,
}

impl MailboxPath {
    pub const PRIVATE_NAMESPACE: &'static str = "#private";

    pub fn for_user(user: impl Into<Username>, name: impl Into<String>) -> Self {
        Self {
            namespace: Self::PRIVATE_NAMESPACE.to_string(),
            user: Some(user.into()),
            name: name.into(),
        }
    }

    pub fn inbox(user: impl Into<Username>) -> Self {
        Self::for_user(user, "INBOX")
    }
}

impl fmt::Display for MailboxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "{}:{}:{}", self.namespace, user, self.name),
            None => write!(f, "{}:{}", self.namespace, self.name),
        }
    }
}
