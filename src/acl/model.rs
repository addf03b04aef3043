//! Mailbox ACL value type

use super::{AclCommand, EditMode, EntryKey, Rights};

use std::collections::BTreeMap;

/// Immutable mapping from entry key to rights.
///
/// Every operation returns a new value; entries with empty rights are never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MailboxAcl {
    entries: BTreeMap<EntryKey, Rights>,
}

impl MailboxAcl {
    pub const EMPTY: MailboxAcl = MailboxAcl {
        entries: BTreeMap::new(),
    };

    pub fn new() -> Self {
        Self::EMPTY
    }

    /// ACL granting every right to the mailbox owner
    pub fn owner_full_acl() -> Self {
        Self::EMPTY.union(&EntryKey::owner(), Rights::full())
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (EntryKey, Rights)>) -> Self {
        entries
            .into_iter()
            .fold(Self::EMPTY, |acl, (key, rights)| acl.union(&key, rights))
    }

    pub fn entries(&self) -> &BTreeMap<EntryKey, Rights> {
        &self.entries
    }

    pub fn get(&self, key: &EntryKey) -> Option<Rights> {
        self.entries.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Add `rights` to whatever `key` already holds.
    pub fn union(&self, key: &EntryKey, rights: Rights) -> MailboxAcl {
        let existing = self.get(key).unwrap_or(Rights::EMPTY);
        self.replace(key, existing.union(rights))
    }

    /// Take `rights` away from `key`; the key disappears once it holds nothing.
    pub fn except(&self, key: &EntryKey, rights: Rights) -> MailboxAcl {
        match self.get(key) {
            Some(existing) => self.replace(key, existing.except(rights)),
            None => self.clone(),
        }
    }

    /// Set `key` to exactly `rights`.
    pub fn replace(&self, key: &EntryKey, rights: Rights) -> MailboxAcl {
        let mut entries = self.entries.clone();
        if rights.is_empty() {
            entries.remove(key);
        } else {
            entries.insert(key.clone(), rights);
        }
        MailboxAcl { entries }
    }

    pub fn apply(&self, command: &AclCommand) -> MailboxAcl {
        match command.mode() {
            EditMode::Addition => self.union(command.key(), command.rights()),
            EditMode::Removal => self.except(command.key(), command.rights()),
            EditMode::Replace => self.replace(command.key(), command.rights()),
        }
    }

    /// Merge every entry of `other` into this ACL.
    pub fn union_acl(&self, other: &MailboxAcl) -> MailboxAcl {
        other
            .entries
            .iter()
            .fold(self.clone(), |acl, (key, rights)| acl.union(key, *rights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::Right;
    use pretty_assertions::assert_eq;

    fn bob() -> EntryKey {
        EntryKey::for_user("bob").unwrap()
    }

    fn alice() -> EntryKey {
        EntryKey::for_user("alice").unwrap()
    }

    #[test]
    fn test_union_on_absent_key_inserts() {
        let acl = MailboxAcl::EMPTY.union(&bob(), Rights::of(Right::Read));
        assert_eq!(acl.get(&bob()), Some(Rights::of(Right::Read)));
        assert_eq!(acl.len(), 1);
    }

    #[test]
    fn test_union_merges_existing_rights() {
        let acl = MailboxAcl::EMPTY
            .union(&bob(), Rights::of(Right::Read))
            .union(&bob(), Rights::of(Right::Lookup));
        assert_eq!(acl.get(&bob()), Some("lr".parse().unwrap()));
    }

    #[test]
    fn test_except_removes_key_when_rights_drained() {
        let acl = MailboxAcl::EMPTY
            .union(&bob(), "lr".parse().unwrap())
            .except(&bob(), "lr".parse().unwrap());
        assert!(acl.is_empty());
    }

    #[test]
    fn test_except_on_absent_key_is_noop() {
        let acl = MailboxAcl::EMPTY.union(&alice(), Rights::of(Right::Read));
        assert_eq!(acl.except(&bob(), Rights::full()), acl);
    }

    #[test]
    fn test_replace_sets_exact_rights_and_deletes_on_empty() {
        let acl = MailboxAcl::EMPTY.union(&bob(), "lrw".parse().unwrap());
        let replaced = acl.replace(&bob(), Rights::of(Right::Insert));
        assert_eq!(replaced.get(&bob()), Some(Rights::of(Right::Insert)));
        assert!(replaced.replace(&bob(), Rights::EMPTY).is_empty());
    }

    #[test]
    fn test_removal_then_addition_composes() {
        let initial = MailboxAcl::EMPTY.union(&bob(), "lrw".parse().unwrap());
        let removal = AclCommand::builder()
            .key(bob())
            .rights("rw".parse().unwrap())
            .as_removal()
            .unwrap();
        let addition = AclCommand::builder()
            .key(bob())
            .rights("ri".parse().unwrap())
            .as_addition()
            .unwrap();

        let result = initial.apply(&removal).apply(&addition);

        let expected = "lrw"
            .parse::<Rights>()
            .unwrap()
            .except("rw".parse().unwrap())
            .union("ri".parse().unwrap());
        assert_eq!(result.get(&bob()), Some(expected));
    }

    #[test]
    fn test_apply_leaves_original_untouched() {
        let original = MailboxAcl::EMPTY.union(&bob(), Rights::of(Right::Read));
        let command = AclCommand::builder()
            .key(alice())
            .rights(Rights::of(Right::Read))
            .as_addition()
            .unwrap();

        let _ = original.apply(&command);

        assert_eq!(original.len(), 1);
    }

    #[test]
    fn test_owner_full_acl() {
        let acl = MailboxAcl::owner_full_acl();
        assert_eq!(acl.get(&EntryKey::owner()), Some(Rights::full()));
    }
}
