//! ACL edit commands
//!
//! A command is a pure function of the current ACL: it names a key, a set of
//! rights and how to combine them. It never remembers the ACL it was built
//! against, so it can be re-applied on top of a fresher read.

use super::{EntryKey, Rights};
use crate::error::{MailboxAclError, Result};

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditMode {
    Addition,
    Removal,
    Replace,
}

impl FromStr for EditMode {
    type Err = MailboxAclError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" | "addition" | "+" => Ok(EditMode::Addition),
            "remove" | "removal" | "-" => Ok(EditMode::Removal),
            "replace" | "=" => Ok(EditMode::Replace),
            other => Err(MailboxAclError::MalformedInput(format!(
                "unknown edit mode '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            EditMode::Addition => "addition",
            EditMode::Removal => "removal",
            EditMode::Replace => "replace",
        };
        f.write_str(mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclCommand {
    key: EntryKey,
    rights: Rights,
    mode: EditMode,
}

impl AclCommand {
    pub fn new(key: EntryKey, rights: Rights, mode: EditMode) -> Self {
        Self { key, rights, mode }
    }

    pub fn builder() -> AclCommandBuilder {
        AclCommandBuilder::default()
    }

    /// Build a command from its textual parts, e.g. `("-$staff", "lr", "add")`.
    pub fn parse(key: &str, rights: &str, mode: &str) -> Result<Self> {
        Ok(Self {
            key: EntryKey::deserialize(key)?,
            rights: rights.parse()?,
            mode: mode.parse()?,
        })
    }

    pub fn key(&self) -> &EntryKey {
        &self.key
    }

    pub fn rights(&self) -> Rights {
        self.rights
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }
}

impl fmt::Display for AclCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.mode, self.key, self.rights)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AclCommandBuilder {
    key: Option<EntryKey>,
    rights: Option<Rights>,
}

impl AclCommandBuilder {
    pub fn key(mut self, key: EntryKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn rights(mut self, rights: Rights) -> Self {
        self.rights = Some(rights);
        self
    }

    pub fn as_addition(self) -> Result<AclCommand> {
        self.build(EditMode::Addition)
    }

    pub fn as_removal(self) -> Result<AclCommand> {
        self.build(EditMode::Removal)
    }

    pub fn as_replacement(self) -> Result<AclCommand> {
        self.build(EditMode::Replace)
    }

    fn build(self, mode: EditMode) -> Result<AclCommand> {
        let key = self.key.ok_or_else(|| {
            MailboxAclError::MalformedInput("ACL command requires an entry key".to_string())
        })?;
        Ok(AclCommand {
            key,
            rights: self.rights.unwrap_or(Rights::EMPTY),
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::Right;

    #[test]
    fn test_builder_requires_key() {
        let result = AclCommand::builder()
            .rights(Rights::of(Right::Read))
            .as_addition();
        assert!(matches!(result, Err(MailboxAclError::MalformedInput(_))));
    }

    #[test]
    fn test_builder_sets_mode() {
        let key = EntryKey::for_user("bob").unwrap();
        let command = AclCommand::builder()
            .key(key.clone())
            .rights(Rights::of(Right::Read))
            .as_replacement()
            .unwrap();
        assert_eq!(command.mode(), EditMode::Replace);
        assert_eq!(command.key(), &key);
        assert_eq!(command.to_string(), "replace bob:r");
    }

    #[test]
    fn test_parse_textual_command() {
        let command = AclCommand::parse("-$staff", "lr", "remove").unwrap();
        assert!(command.key().is_negative());
        assert_eq!(command.rights(), "lr".parse().unwrap());
        assert_eq!(command.mode(), EditMode::Removal);
    }

    #[test]
    fn test_parse_rejects_bad_parts() {
        assert!(AclCommand::parse("bob", "lrQ", "add").is_err());
        assert!(AclCommand::parse("", "lr", "add").is_err());
        assert!(AclCommand::parse("bob", "lr", "merge").is_err());
    }
}
