//! Structural difference between two ACL values.
//!
//! Diffs are never persisted; they feed the rights-by-user index and the
//! `AclUpdated` event.

use super::{EntryKey, MailboxAcl, Rights};
use crate::types::Username;

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryChange {
    pub old: Rights,
    pub new: Rights,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AclDiff {
    added: BTreeMap<EntryKey, Rights>,
    removed: BTreeMap<EntryKey, Rights>,
    changed: BTreeMap<EntryKey, EntryChange>,
}

/// One write against the rights-by-user index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RightsIndexChange {
    Upsert { user: Username, rights: Rights },
    Delete { user: Username },
}

impl RightsIndexChange {
    pub fn user(&self) -> &str {
        match self {
            RightsIndexChange::Upsert { user, .. } | RightsIndexChange::Delete { user } => user,
        }
    }
}

impl AclDiff {
    pub fn compute(old: &MailboxAcl, new: &MailboxAcl) -> Self {
        let mut diff = AclDiff::default();

        for (key, new_rights) in new.entries() {
            match old.get(key) {
                None => {
                    diff.added.insert(key.clone(), *new_rights);
                }
                Some(old_rights) if old_rights != *new_rights => {
                    diff.changed.insert(
                        key.clone(),
                        EntryChange {
                            old: old_rights,
                            new: *new_rights,
                        },
                    );
                }
                Some(_) => {}
            }
        }

        for (key, old_rights) in old.entries() {
            if new.get(key).is_none() {
                diff.removed.insert(key.clone(), *old_rights);
            }
        }

        diff
    }

    pub fn added(&self) -> &BTreeMap<EntryKey, Rights> {
        &self.added
    }

    pub fn removed(&self) -> &BTreeMap<EntryKey, Rights> {
        &self.removed
    }

    pub fn changed(&self) -> &BTreeMap<EntryKey, EntryChange> {
        &self.changed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Index writes needed to follow this diff. Only positive user entries
    /// carry per-user rights; group, special and negative entries are skipped.
    pub fn rights_index_changes(&self) -> Vec<RightsIndexChange> {
        let upserts = self
            .added
            .iter()
            .chain(self.changed.iter().map(|(key, change)| (key, &change.new)))
            .filter(|(key, _)| key.is_positive_user())
            .map(|(key, rights)| RightsIndexChange::Upsert {
                user: key.name().to_string(),
                rights: *rights,
            });

        let deletes = self
            .removed
            .keys()
            .filter(|key| key.is_positive_user())
            .map(|key| RightsIndexChange::Delete {
                user: key.name().to_string(),
            });

        upserts.chain(deletes).collect()
    }
}
