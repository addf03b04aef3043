//! Versioned ACL record store
//!
//! Wraps a `RowStore` with the ACL blob codec and the version protocol:
//! an absent row reads as `EMPTY` at `INITIAL_VERSION`, the first write is an
//! insert-if-absent and every later write is an update on the exact version
//! that was read, bumping it by one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::traits::{AclRow, RowStore, WriteOutcome};
use crate::acl::{codec, DecodeOutcome, MailboxAcl};
use crate::config::StoreConfig;
use crate::error::{MailboxAclError, Result};
use crate::types::{MailboxId, Version};

/// Version observed when no row exists yet. Never produced by a write.
pub const INITIAL_VERSION: Version = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedAcl {
    pub acl: MailboxAcl,
    pub version: Version,
    /// Set when the stored blob could not be decoded and `acl` fell back to
    /// `EMPTY`. The version is still the stored one.
    pub corrupted: bool,
    /// Whether a row exists. Writes branch on this, not on the version value.
    pub stored: bool,
}

impl VersionedAcl {
    pub fn initial() -> Self {
        Self {
            acl: MailboxAcl::EMPTY,
            version: INITIAL_VERSION,
            corrupted: false,
            stored: false,
        }
    }

    /// No row is stored for the mailbox.
    pub fn is_initial(&self) -> bool {
        !self.stored
    }

    /// Version a successful write based on this read will carry.
    pub fn next_version(&self, mailbox_id: MailboxId) -> Result<Version> {
        if !self.stored {
            return Ok(INITIAL_VERSION + 1);
        }
        self.version
            .checked_add(1)
            .ok_or(MailboxAclError::VersionOverflow {
                mailbox_id,
                version: self.version,
            })
    }
}

#[derive(Clone)]
pub struct VersionedAclStore {
    rows: Arc<dyn RowStore>,
    operation_timeout: Duration,
}

impl VersionedAclStore {
    pub fn new(rows: Arc<dyn RowStore>, config: &StoreConfig) -> Self {
        Self {
            rows,
            operation_timeout: config.operation_timeout(),
        }
    }

    pub async fn read(&self, mailbox_id: MailboxId) -> Result<VersionedAcl> {
        let row = self
            .with_deadline("read", mailbox_id, self.rows.read_row(mailbox_id))
            .await?;

        let Some(row) = row else {
            return Ok(VersionedAcl::initial());
        };

        let outcome = codec::deserialize_tolerant(&row.acl);
        if let DecodeOutcome::Corrupted { reason } = &outcome {
            warn!(
                mailbox_id = %mailbox_id,
                version = row.version,
                "Stored ACL is unreadable, treating it as empty: {}",
                reason
            );
        }

        Ok(VersionedAcl {
            corrupted: outcome.is_corrupted(),
            acl: outcome.into_acl(),
            version: row.version,
            stored: true,
        })
    }

    /// Write `acl` if the stored row is still the one `based_on` was read from.
    pub async fn conditional_write(
        &self,
        mailbox_id: MailboxId,
        acl: &MailboxAcl,
        based_on: &VersionedAcl,
    ) -> Result<WriteOutcome> {
        let row = AclRow {
            acl: codec::serialize(acl)?,
            version: based_on.next_version(mailbox_id)?,
        };

        let outcome = if based_on.stored {
            self.with_deadline(
                "update",
                mailbox_id,
                self.rows
                    .update_if_version(mailbox_id, based_on.version, row),
            )
            .await?
        } else {
            self.with_deadline(
                "insert",
                mailbox_id,
                self.rows.insert_if_absent(mailbox_id, row),
            )
            .await?
        };

        debug!(
            mailbox_id = %mailbox_id,
            expected_version = based_on.version,
            stored = based_on.stored,
            ?outcome,
            "Conditional ACL write"
        );
        Ok(outcome)
    }

    /// Remove the row if it is still the one `based_on` was read from.
    /// Deleting an absent row is applied without touching the store.
    pub async fn conditional_delete(
        &self,
        mailbox_id: MailboxId,
        based_on: &VersionedAcl,
    ) -> Result<WriteOutcome> {
        if !based_on.stored {
            return Ok(WriteOutcome::Applied);
        }
        self.with_deadline(
            "delete",
            mailbox_id,
            self.rows.delete_if_version(mailbox_id, based_on.version),
        )
        .await
    }

    async fn with_deadline<T>(
        &self,
        operation: &str,
        mailbox_id: MailboxId,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MailboxAclError::StoreUnavailable(format!(
                "{} of ACL for mailbox {} timed out after {:?}",
                operation, mailbox_id, self.operation_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{EntryKey, Right, Rights};
    use crate::storage::memory::InMemoryRowStore;
    use async_trait::async_trait;

    fn store_with_rows() -> (VersionedAclStore, InMemoryRowStore) {
        let rows = InMemoryRowStore::new();
        let store = VersionedAclStore::new(Arc::new(rows.clone()), &StoreConfig::default());
        (store, rows)
    }

    fn bob_read() -> MailboxAcl {
        MailboxAcl::EMPTY.union(&EntryKey::for_user("bob").unwrap(), Rights::of(Right::Read))
    }

    #[tokio::test]
    async fn test_absent_row_reads_as_initial() {
        let (store, _rows) = store_with_rows();
        let read = store.read(MailboxId::new()).await.unwrap();
        assert_eq!(read, VersionedAcl::initial());
        assert!(read.is_initial());
    }

    #[tokio::test]
    async fn test_first_write_inserts_version_zero() {
        let (store, rows) = store_with_rows();
        let id = MailboxId::new();

        let outcome = store
            .conditional_write(id, &bob_read(), &VersionedAcl::initial())
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Applied);
        let read = store.read(id).await.unwrap();
        assert_eq!(read.version, 0);
        assert_eq!(read.acl, bob_read());
        assert!(read.stored);
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let (store, _rows) = store_with_rows();
        let id = MailboxId::new();
        store
            .conditional_write(id, &bob_read(), &VersionedAcl::initial())
            .await
            .unwrap();
        let stale = VersionedAcl {
            version: 7,
            stored: true,
            ..VersionedAcl::initial()
        };

        let second_insert = store
            .conditional_write(id, &MailboxAcl::EMPTY, &VersionedAcl::initial())
            .await
            .unwrap();
        let stale_update = store
            .conditional_write(id, &MailboxAcl::EMPTY, &stale)
            .await
            .unwrap();

        assert_eq!(second_insert, WriteOutcome::Conflict);
        assert_eq!(stale_update, WriteOutcome::Conflict);
        assert_eq!(store.read(id).await.unwrap().acl, bob_read());
    }

    #[tokio::test]
    async fn test_corrupted_blob_keeps_version() {
        let (store, rows) = store_with_rows();
        let id = MailboxId::new();
        rows.put_raw(id, r#"{"entries":{"bob":invalid}}"#, 1);

        let read = store.read(id).await.unwrap();

        assert!(read.corrupted);
        assert_eq!(read.acl, MailboxAcl::EMPTY);
        assert_eq!(read.version, 1);
        assert_eq!(
            store.conditional_write(id, &bob_read(), &read).await.unwrap(),
            WriteOutcome::Applied
        );
        assert_eq!(store.read(id).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_stored_row_at_initial_version_is_updated() {
        let (store, rows) = store_with_rows();
        let id = MailboxId::new();
        rows.put_raw(id, r#"{"entries":{}}"#, INITIAL_VERSION);

        let read = store.read(id).await.unwrap();
        assert!(!read.is_initial());

        assert_eq!(
            store.conditional_write(id, &bob_read(), &read).await.unwrap(),
            WriteOutcome::Applied
        );
        let after = store.read(id).await.unwrap();
        assert_eq!(after.version, 0);
        assert_eq!(after.acl, bob_read());
    }

    #[tokio::test]
    async fn test_version_overflow_is_an_error() {
        let (store, rows) = store_with_rows();
        let id = MailboxId::new();
        rows.put_raw(id, r#"{"entries":{}}"#, Version::MAX);

        let read = store.read(id).await.unwrap();
        let result = store.conditional_write(id, &bob_read(), &read).await;

        assert!(matches!(
            result,
            Err(MailboxAclError::VersionOverflow { version: i64::MAX, .. })
        ));
        assert_eq!(store.read(id).await.unwrap().acl, MailboxAcl::EMPTY);
    }

    #[tokio::test]
    async fn test_conditional_delete_checks_version() {
        let (store, _rows) = store_with_rows();
        let id = MailboxId::new();
        store
            .conditional_write(id, &bob_read(), &VersionedAcl::initial())
            .await
            .unwrap();
        let first = store.read(id).await.unwrap();
        store.conditional_write(id, &MailboxAcl::EMPTY, &first).await.unwrap();

        assert_eq!(
            store.conditional_delete(id, &first).await.unwrap(),
            WriteOutcome::Conflict
        );
        let latest = store.read(id).await.unwrap();
        assert_eq!(
            store.conditional_delete(id, &latest).await.unwrap(),
            WriteOutcome::Applied
        );
        assert!(store.read(id).await.unwrap().is_initial());
    }

    struct HangingRowStore;

    #[async_trait]
    impl RowStore for HangingRowStore {
        async fn read_row(&self, _mailbox_id: MailboxId) -> Result<Option<AclRow>> {
            futures::future::pending().await
        }

        async fn insert_if_absent(&self, _: MailboxId, _: AclRow) -> Result<WriteOutcome> {
            futures::future::pending().await
        }

        async fn update_if_version(&self, _: MailboxId, _: Version, _: AclRow) -> Result<WriteOutcome> {
            futures::future::pending().await
        }

        async fn delete_if_version(&self, _: MailboxId, _: Version) -> Result<WriteOutcome> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_deadline_surfaces_as_store_unavailable() {
        let store = VersionedAclStore::new(
            Arc::new(HangingRowStore),
            &StoreConfig {
                operation_timeout_ms: 10,
            },
        );
        let id = MailboxId::new();

        let read = store.read(id).await;
        let write = store
            .conditional_write(id, &bob_read(), &VersionedAcl::initial())
            .await;

        assert!(matches!(read, Err(MailboxAclError::StoreUnavailable(_))));
        assert!(matches!(write, Err(MailboxAclError::StoreUnavailable(_))));
    }
}
