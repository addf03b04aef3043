//! ACL Entry Keys
//!
//! An entry key names the subject of one ACL entry. Its textual form is
//! `[-][$]name`: a leading `-` marks a negative entry and `$` marks a group.

use crate::error::{MailboxAclError, Result};

use std::fmt;
use std::str::FromStr;

const NEGATIVE_MARKER: char = '-';
const GROUP_MARKER: char = '$';

/// Kind of subject an entry key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameType {
    User,
    Group,
    /// `owner`, `anybody` or `authenticated`
    Special,
}

impl NameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameType::User => "user",
            NameType::Group => "group",
            NameType::Special => "special",
        }
    }
}

impl FromStr for NameType {
    type Err = MailboxAclError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(NameType::User),
            "group" => Ok(NameType::Group),
            "special" => Ok(NameType::Special),
            other => Err(MailboxAclError::MalformedInput(format!(
                "unknown entry type '{}'",
                other
            ))),
        }
    }
}

/// Well-known subject names
pub struct SpecialName;

impl SpecialName {
    pub const OWNER: &'static str = "owner";
    pub const ANYBODY: &'static str = "anybody";
    pub const AUTHENTICATED: &'static str = "authenticated";

    pub fn is_special(name: &str) -> bool {
        matches!(name, Self::OWNER | Self::ANYBODY | Self::AUTHENTICATED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    name: String,
    name_type: NameType,
    negative: bool,
}

impl EntryKey {
    pub fn new(name: impl Into<String>, name_type: NameType, negative: bool) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(MailboxAclError::MalformedInput(
                "entry key name cannot be empty".to_string(),
            ));
        }
        match name_type {
            NameType::Special if !SpecialName::is_special(&name) => {
                return Err(MailboxAclError::MalformedInput(format!(
                    "'{}' is not a special entry name",
                    name
                )));
            }
            // A user name must not read back as a special, negative or group key.
            NameType::User
                if SpecialName::is_special(&name)
                    || name.starts_with(NEGATIVE_MARKER)
                    || name.starts_with(GROUP_MARKER) =>
            {
                return Err(MailboxAclError::MalformedInput(format!(
                    "'{}' is not a valid user name for an entry key",
                    name
                )));
            }
            _ => {}
        }
        Ok(Self {
            name,
            name_type,
            negative,
        })
    }

    pub fn for_user(name: impl Into<String>) -> Result<Self> {
        Self::new(name, NameType::User, false)
    }

    pub fn for_group(name: impl Into<String>) -> Result<Self> {
        Self::new(name, NameType::Group, false)
    }

    pub fn owner() -> Self {
        Self {
            name: SpecialName::OWNER.to_string(),
            name_type: NameType::Special,
            negative: false,
        }
    }

    pub fn anybody() -> Self {
        Self {
            name: SpecialName::ANYBODY.to_string(),
            name_type: NameType::Special,
            negative: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_type(&self) -> NameType {
        self.name_type
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn negated(&self) -> Self {
        Self {
            negative: !self.negative,
            ..self.clone()
        }
    }

    /// Positive user entries are the only ones projected into the
    /// rights-by-user index.
    pub fn is_positive_user(&self) -> bool {
        !self.negative && self.name_type == NameType::User
    }

    /// Parse the `[-][$]name` textual form
    pub fn deserialize(serialized: &str) -> Result<Self> {
        let (negative, rest) = match serialized.strip_prefix(NEGATIVE_MARKER) {
            Some(rest) => (true, rest),
            None => (false, serialized),
        };

        if let Some(group) = rest.strip_prefix(GROUP_MARKER) {
            return Self::new(group, NameType::Group, negative);
        }

        let name_type = if SpecialName::is_special(rest) {
            NameType::Special
        } else {
            NameType::User
        };
        Self::new(rest, name_type, negative)
    }

    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl FromStr for EntryKey {
    type Err = MailboxAclError;

    fn from_str(s: &str) -> Result<Self> {
        EntryKey::deserialize(s)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "{}", NEGATIVE_MARKER)?;
        }
        if self.name_type == NameType::Group {
            write!(f, "{}", GROUP_MARKER)?;
        }
        write!(f, "{}", self.name)
    }
}
