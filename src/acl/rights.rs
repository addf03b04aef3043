//! Mailbox Rights
//!
//! RFC 4314 permission flags and the immutable set type built on top of them.

use crate::error::{MailboxAclError, Result};

use std::fmt;
use std::str::FromStr;

/// A single RFC 4314 right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Right {
    /// `l`: mailbox is visible to LIST/LSUB
    Lookup,
    /// `r`: SELECT, EXAMINE, FETCH, SEARCH, COPY from the mailbox
    Read,
    /// `s`: keep seen/unseen state across sessions
    WriteSeenFlag,
    /// `w`: set or clear flags other than \Seen and \Deleted
    Write,
    /// `i`: APPEND and COPY into the mailbox
    Insert,
    /// `p`: send mail to the submission address of the mailbox
    Post,
    /// `k`: create child mailboxes
    CreateMailbox,
    /// `x`: delete or rename the mailbox
    DeleteMailbox,
    /// `t`: set or clear \Deleted
    DeleteMessages,
    /// `e`: EXPUNGE
    PerformExpunge,
    /// `a`: administer the ACL itself
    Administer,
}

impl Right {
    /// Canonical ordering used for display and serialization
    pub const ALL: [Right; 11] = [
        Right::Lookup,
        Right::Read,
        Right::WriteSeenFlag,
        Right::Write,
        Right::Insert,
        Right::Post,
        Right::CreateMailbox,
        Right::DeleteMailbox,
        Right::DeleteMessages,
        Right::PerformExpunge,
        Right::Administer,
    ];

    pub fn as_char(self) -> char {
        match self {
            Right::Lookup => 'l',
            Right::Read => 'r',
            Right::WriteSeenFlag => 's',
            Right::Write => 'w',
            Right::Insert => 'i',
            Right::Post => 'p',
            Right::CreateMailbox => 'k',
            Right::DeleteMailbox => 'x',
            Right::DeleteMessages => 't',
            Right::PerformExpunge => 'e',
            Right::Administer => 'a',
        }
    }

    pub fn from_char(c: char) -> Result<Self> {
        Right::ALL
            .iter()
            .copied()
            .find(|right| right.as_char() == c)
            .ok_or_else(|| MailboxAclError::MalformedInput(format!("unsupported right flag '{}'", c)))
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Immutable set of rights
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rights {
    bits: u16,
}

impl Rights {
    pub const EMPTY: Rights = Rights { bits: 0 };

    pub fn new(rights: impl IntoIterator<Item = Right>) -> Self {
        let bits = rights.into_iter().fold(0, |acc, right| acc | right.bit());
        Self { bits }
    }

    pub fn of(right: Right) -> Self {
        Self { bits: right.bit() }
    }

    pub fn full() -> Self {
        Self::new(Right::ALL)
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn contains(&self, right: Right) -> bool {
        self.bits & right.bit() != 0
    }

    pub fn contains_all(&self, other: Rights) -> bool {
        self.bits & other.bits == other.bits
    }

    pub fn union(&self, other: Rights) -> Rights {
        Rights {
            bits: self.bits | other.bits,
        }
    }

    /// Rights held by `self` but not by `other`
    pub fn except(&self, other: Rights) -> Rights {
        Rights {
            bits: self.bits & !other.bits,
        }
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Right> + '_ {
        Right::ALL.iter().copied().filter(move |right| self.contains(*right))
    }
}

impl FromIterator<Right> for Rights {
    fn from_iter<I: IntoIterator<Item = Right>>(iter: I) -> Self {
        Rights::new(iter)
    }
}

impl FromStr for Rights {
    type Err = MailboxAclError;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(Right::from_char)
            .collect::<Result<Vec<_>>>()
            .map(Rights::new)
    }
}

impl fmt::Display for Rights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for right in self.iter() {
            write!(f, "{}", right.as_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Rights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rights({})", self)
    }
}
