use async_trait::async_trait;
use bytes::Bytes;

use crate::acl::Rights;
use crate::types::{MailboxId, Version};
use crate::Result;

/// One stored ACL row: the opaque blob and its version counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRow {
    pub acl: Bytes,
    pub version: Version,
}

/// Result of a conditional write. Losing a race is an expected outcome,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    Conflict,
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied)
    }
}

/// Row storage engine holding one ACL row per mailbox.
///
/// Implementations must make the conditional operations (`insert_if_absent`,
/// `update_if_version`, `delete_if_version`) linearizable per mailbox id. Transport failures are reported as
/// `MailboxAclError::StoreUnavailable`.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn read_row(&self, mailbox_id: MailboxId) -> Result<Option<AclRow>>;

    async fn insert_if_absent(&self, mailbox_id: MailboxId, row: AclRow) -> Result<WriteOutcome>;

    async fn update_if_version(
        &self,
        mailbox_id: MailboxId,
        expected_version: Version,
        row: AclRow,
    ) -> Result<WriteOutcome>;

    /// Remove the row only if its version still equals `expected_version`.
    async fn delete_if_version(
        &self,
        mailbox_id: MailboxId,
        expected_version: Version,
    ) -> Result<WriteOutcome>;
}

/// Secondary rights-by-user index. Both writes are idempotent.
#[async_trait]
pub trait RightsIndex: Send + Sync {
    async fn upsert(&self, user: &str, mailbox_id: MailboxId, rights: Rights) -> Result<()>;

    async fn delete(&self, user: &str, mailbox_id: MailboxId) -> Result<()>;

    async fn get(&self, user: &str, mailbox_id: MailboxId) -> Result<Option<Rights>>;

    async fn list_rights_for_user(&self, user: &str) -> Result<Vec<(MailboxId, Rights)>>;
}
