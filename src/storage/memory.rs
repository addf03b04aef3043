//! In-process storage backends.
//!
//! Conditional writes are made atomic by the per-shard locking of `DashMap`:
//! the version check and the write happen under the same entry guard.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use super::traits::{AclRow, RightsIndex, RowStore, WriteOutcome};
use crate::acl::Rights;
use crate::types::{MailboxId, Username, Version};
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct InMemoryRowStore {
    rows: Arc<DashMap<MailboxId, AclRow>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a row unconditionally, bypassing the version check.
    pub fn put_raw(&self, mailbox_id: MailboxId, acl: impl Into<Bytes>, version: Version) {
        self.rows.insert(
            mailbox_id,
            AclRow {
                acl: acl.into(),
                version,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn read_row(&self, mailbox_id: MailboxId) -> Result<Option<AclRow>> {
        Ok(self.rows.get(&mailbox_id).map(|row| row.clone()))
    }

    async fn insert_if_absent(&self, mailbox_id: MailboxId, row: AclRow) -> Result<WriteOutcome> {
        match self.rows.entry(mailbox_id) {
            Entry::Occupied(_) => Ok(WriteOutcome::Conflict),
            Entry::Vacant(vacant) => {
                vacant.insert(row);
                Ok(WriteOutcome::Applied)
            }
        }
    }

    async fn update_if_version(
        &self,
        mailbox_id: MailboxId,
        expected_version: Version,
        row: AclRow,
    ) -> Result<WriteOutcome> {
        match self.rows.get_mut(&mailbox_id) {
            Some(mut current) if current.version == expected_version => {
                *current = row;
                Ok(WriteOutcome::Applied)
            }
            _ => Ok(WriteOutcome::Conflict),
        }
    }

    async fn delete_if_version(
        &self,
        mailbox_id: MailboxId,
        expected_version: Version,
    ) -> Result<WriteOutcome> {
        match self
            .rows
            .remove_if(&mailbox_id, |_, row| row.version == expected_version)
        {
            Some(_) => Ok(WriteOutcome::Applied),
            None => Ok(WriteOutcome::Conflict),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRightsIndex {
    by_user: Arc<DashMap<Username, HashMap<MailboxId, Rights>>>,
}

impl InMemoryRightsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full copy of the index, for comparisons in tests and diagnostics.
    pub fn snapshot(&self) -> HashMap<Username, HashMap<MailboxId, Rights>> {
        self.by_user
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[async_trait]
impl RightsIndex for InMemoryRightsIndex {
    async fn upsert(&self, user: &str, mailbox_id: MailboxId, rights: Rights) -> Result<()> {
        self.by_user
            .entry(user.to_string())
            .or_default()
            .insert(mailbox_id, rights);
        Ok(())
    }

    async fn delete(&self, user: &str, mailbox_id: MailboxId) -> Result<()> {
        if let Entry::Occupied(mut occupied) = self.by_user.entry(user.to_string()) {
            occupied.get_mut().remove(&mailbox_id);
            if occupied.get().is_empty() {
                occupied.remove();
            }
        }
        Ok(())
    }

    async fn get(&self, user: &str, mailbox_id: MailboxId) -> Result<Option<Rights>> {
        Ok(self
            .by_user
            .get(user)
            .and_then(|mailboxes| mailboxes.get(&mailbox_id).copied()))
    }

    async fn list_rights_for_user(&self, user: &str) -> Result<Vec<(MailboxId, Rights)>> {
        let mut rights: Vec<_> = self
            .by_user
            .get(user)
            .map(|mailboxes| mailboxes.iter().map(|(id, r)| (*id, *r)).collect())
            .unwrap_or_default();
        rights.sort_by_key(|(id, _)| *id);
        Ok(rights)
    }
}
