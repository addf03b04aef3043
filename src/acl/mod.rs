//! Mailbox Access Control Lists
//!
//! Pure value types for ACLs: rights, entry keys, the ACL map itself, edit
//! commands and diffs, plus the blob codec used by the record store.

pub mod codec;
pub mod command;
pub mod diff;
pub mod entry_key;
pub mod model;
pub mod rights;

pub use codec::DecodeOutcome;
pub use command::{AclCommand, AclCommandBuilder, EditMode};
pub use diff::{AclDiff, EntryChange, RightsIndexChange};
pub use entry_key::{EntryKey, NameType, SpecialName};
pub use model::MailboxAcl;
pub use rights::{Right, Rights};
