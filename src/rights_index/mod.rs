//! Rights-by-user index maintenance
//!
//! Projects committed ACL diffs into the secondary `RightsIndex`. Runs only
//! after the primary write has committed, retries each index write on its
//! own, and never rolls back the primary ACL.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::acl::{AclDiff, MailboxAcl, RightsIndexChange, Rights};
use crate::config::RightsIndexConfig;
use crate::error::{MailboxAclError, Result};
use crate::storage::RightsIndex;
use crate::types::MailboxId;

#[derive(Clone)]
pub struct RightsIndexMaintainer {
    index: Arc<dyn RightsIndex>,
    config: RightsIndexConfig,
}

impl RightsIndexMaintainer {
    pub fn new(index: Arc<dyn RightsIndex>, config: RightsIndexConfig) -> Self {
        Self { index, config }
    }

    /// Apply every index write implied by `diff`.
    ///
    /// All changes are attempted even when one fails; the first failure is
    /// returned. Re-applying the same diff converges to the same state.
    pub async fn apply(&self, mailbox_id: MailboxId, diff: &AclDiff) -> Result<()> {
        let mut first_failure = None;

        for change in diff.rights_index_changes() {
            if let Err(e) = self.apply_change(mailbox_id, &change).await {
                warn!(
                    mailbox_id = %mailbox_id,
                    user = change.user(),
                    "Giving up on rights index change: {}",
                    e
                );
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(MailboxAclError::RightsIndex(format!(
                "mailbox {}: {}",
                mailbox_id, e
            ))),
            None => Ok(()),
        }
    }

    /// Drop every index entry derived from `acl`, used when the ACL row itself
    /// is removed.
    pub async fn remove_all(&self, mailbox_id: MailboxId, acl: &MailboxAcl) -> Result<()> {
        self.apply(mailbox_id, &AclDiff::compute(acl, &MailboxAcl::EMPTY))
            .await
    }

    pub async fn rights_for_user(&self, user: &str) -> Result<Vec<(MailboxId, Rights)>> {
        self.index.list_rights_for_user(user).await
    }

    async fn apply_change(&self, mailbox_id: MailboxId, change: &RightsIndexChange) -> Result<()> {
        let mut attempt = 0;
        loop {
            let result = match change {
                RightsIndexChange::Upsert { user, rights } => {
                    self.index.upsert(user, mailbox_id, *rights).await
                }
                RightsIndexChange::Delete { user } => self.index.delete(user, mailbox_id).await,
            };

            match result {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.config.max_retries {
                        return Err(e);
                    }
                    let delay = self.config.retry_backoff.delay_for(attempt - 1);
                    debug!(
                        mailbox_id = %mailbox_id,
                        user = change.user(),
                        attempt,
                        ?delay,
                        "Retrying rights index change: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
