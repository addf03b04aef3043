//! ACL Mapper
//!
//! Read-modify-write controller for mailbox ACLs. Every update reads the
//! current versioned record, applies the command to it and attempts a
//! conditional write on the version it read. A lost race re-reads and
//! re-applies the same command on the fresher state, so concurrent writers
//! never drop each other's contributions.
//!
//! Only after a commit does the mapper touch derived state: the rights index
//! (best effort) and the event listener.

mod state;

pub use state::UpdateState;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, error, info, warn, Instrument};

use crate::acl::{AclCommand, AclDiff, MailboxAcl, Rights};
use crate::config::{Config, MapperConfig};
use crate::error::{MailboxAclError, Result};
use crate::events::{EventDispatcher, MailboxListener};
use crate::metrics::AclMetrics;
use crate::rights_index::RightsIndexMaintainer;
use crate::storage::{RightsIndex, RowStore, VersionedAcl, VersionedAclStore, WriteOutcome};
use crate::types::{MailboxId, MailboxPath, Username, Version};

/// A committed ACL change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclUpdate {
    pub acl: MailboxAcl,
    pub diff: AclDiff,
    pub version: Version,
}

/// Who asked for an update and on which path, carried into the emitted event
#[derive(Debug, Clone, Default)]
pub struct UpdateContext {
    pub user: Option<Username>,
    pub path: Option<MailboxPath>,
}

impl UpdateContext {
    pub fn for_user(user: impl Into<Username>) -> Self {
        Self {
            user: Some(user.into()),
            path: None,
        }
    }

    pub fn with_path(mut self, path: MailboxPath) -> Self {
        self.path = Some(path);
        self
    }
}

pub struct AclMapper {
    store: VersionedAclStore,
    rights_index: RightsIndexMaintainer,
    dispatcher: EventDispatcher,
    config: MapperConfig,
    metrics: Arc<AclMetrics>,
}

impl AclMapper {
    pub fn new(
        config: &Config,
        rows: Arc<dyn RowStore>,
        rights_index: Arc<dyn RightsIndex>,
        listener: Arc<dyn MailboxListener>,
    ) -> Self {
        Self::with_metrics(config, rows, rights_index, listener, AclMetrics::new())
    }

    pub fn with_metrics(
        config: &Config,
        rows: Arc<dyn RowStore>,
        rights_index: Arc<dyn RightsIndex>,
        listener: Arc<dyn MailboxListener>,
        metrics: Arc<AclMetrics>,
    ) -> Self {
        Self {
            store: VersionedAclStore::new(rows, &config.store),
            rights_index: RightsIndexMaintainer::new(rights_index, config.rights_index.clone()),
            dispatcher: EventDispatcher::new(listener),
            config: config.mapper.clone(),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<AclMetrics> {
        &self.metrics
    }

    /// Current ACL of a mailbox. Unreadable stored data reads as `EMPTY`.
    pub async fn get_acl(&self, mailbox_id: MailboxId) -> Result<MailboxAcl> {
        Ok(self.read(mailbox_id).await?.acl)
    }

    /// Current ACL together with its stored version.
    pub async fn get_versioned_acl(&self, mailbox_id: MailboxId) -> Result<VersionedAcl> {
        self.read(mailbox_id).await
    }

    pub async fn update_acl(&self, mailbox_id: MailboxId, command: &AclCommand) -> Result<AclUpdate> {
        self.update_acl_in_context(mailbox_id, command, &UpdateContext::default())
            .await
    }

    pub async fn update_acl_in_context(
        &self,
        mailbox_id: MailboxId,
        command: &AclCommand,
        context: &UpdateContext,
    ) -> Result<AclUpdate> {
        debug!(mailbox_id = %mailbox_id, %command, "Updating ACL");
        self.commit(mailbox_id, context, |acl| acl.apply(command))
            .await
    }

    /// Parse a textual command and apply it. Parsing failures are reported
    /// before the store is contacted.
    pub async fn update_acl_from_parts(
        &self,
        mailbox_id: MailboxId,
        key: &str,
        rights: &str,
        mode: &str,
    ) -> Result<AclUpdate> {
        let command = AclCommand::parse(key, rights, mode)?;
        self.update_acl(mailbox_id, &command).await
    }

    /// Replace the whole ACL of a mailbox.
    pub async fn set_acl(&self, mailbox_id: MailboxId, acl: &MailboxAcl) -> Result<AclUpdate> {
        self.set_acl_in_context(mailbox_id, acl, &UpdateContext::default())
            .await
    }

    pub async fn set_acl_in_context(
        &self,
        mailbox_id: MailboxId,
        acl: &MailboxAcl,
        context: &UpdateContext,
    ) -> Result<AclUpdate> {
        self.commit(mailbox_id, context, |_| acl.clone()).await
    }

    /// Remove the stored ACL of a mailbox and its rights-index projection.
    ///
    /// The delete is conditional on the version read, so an update committed
    /// in between is re-read and its index entries are cleaned up as well.
    pub async fn delete_acl(&self, mailbox_id: MailboxId) -> Result<()> {
        let mut attempt = 0;
        let removed = loop {
            let current = self.read(mailbox_id).await?;
            if current.is_initial() {
                return Ok(());
            }

            let outcome = self
                .store
                .conditional_delete(mailbox_id, &current)
                .await
                .inspect_err(|_| {
                    self.metrics.store_errors.inc();
                })?;
            if outcome.is_applied() {
                break current.acl;
            }

            self.metrics.cas_conflicts.inc();
            attempt += 1;
            if attempt >= self.config.max_retries {
                self.metrics.retries_exhausted.inc();
                return Err(MailboxAclError::ConcurrencyExhausted {
                    mailbox_id,
                    attempts: attempt,
                });
            }
            debug!(mailbox_id = %mailbox_id, attempt, "Lost ACL delete race");
            tokio::time::sleep(self.retry_delay(attempt)).await;
        };

        if let Err(e) = self.rights_index.remove_all(mailbox_id, &removed).await {
            self.metrics.rights_index_failures.inc();
            error!(
                mailbox_id = %mailbox_id,
                "ACL deleted but rights index cleanup failed: {}",
                e
            );
        }
        info!(mailbox_id = %mailbox_id, "Deleted mailbox ACL");
        Ok(())
    }

    /// Mailboxes on which `user` holds rights, according to the rights index.
    pub async fn list_user_rights(&self, user: &str) -> Result<Vec<(MailboxId, Rights)>> {
        self.rights_index.rights_for_user(user).await
    }

    async fn read(&self, mailbox_id: MailboxId) -> Result<VersionedAcl> {
        let current = self.store.read(mailbox_id).await.inspect_err(|_| {
            self.metrics.store_errors.inc();
        })?;
        if current.corrupted {
            self.metrics.corrupted_reads.inc();
        }
        Ok(current)
    }

    async fn commit<F>(
        &self,
        mailbox_id: MailboxId,
        context: &UpdateContext,
        transform: F,
    ) -> Result<AclUpdate>
    where
        F: Fn(&MailboxAcl) -> MailboxAcl,
    {
        let started = Instant::now();
        let (old, update) = self
            .run_update(mailbox_id, transform)
            .instrument(debug_span!("acl_update", mailbox_id = %mailbox_id))
            .await?;

        self.metrics.updates_committed.inc();
        self.metrics
            .update_latency
            .observe(started.elapsed().as_secs_f64());
        debug!(
            mailbox_id = %mailbox_id,
            version = update.version,
            previous_entries = old.len(),
            entries = update.acl.len(),
            "ACL committed"
        );

        if let Err(e) = self.rights_index.apply(mailbox_id, &update.diff).await {
            self.metrics.rights_index_failures.inc();
            error!(
                mailbox_id = %mailbox_id,
                version = update.version,
                "ACL committed but rights index update failed: {}",
                e
            );
        }

        self.dispatcher
            .acl_updated(
                context.user.clone(),
                context.path.clone(),
                mailbox_id,
                update.diff.clone(),
                update.version,
            )
            .await;
        self.metrics.events_dispatched.inc();

        Ok(update)
    }

    /// Drive the retry state machine until the write commits or fails.
    /// Returns the ACL the committed write was based on, and the update.
    async fn run_update<F>(
        &self,
        mailbox_id: MailboxId,
        transform: F,
    ) -> Result<(MailboxAcl, AclUpdate)>
    where
        F: Fn(&MailboxAcl) -> MailboxAcl,
    {
        let mut state = UpdateState::Reading { attempt: 0 };

        loop {
            state = match state {
                UpdateState::Reading { attempt } => match self.read(mailbox_id).await {
                    Ok(current) => match current.next_version(mailbox_id) {
                        Ok(next_version) => {
                            let updated = transform(&current.acl);
                            UpdateState::Writing {
                                attempt,
                                current,
                                updated,
                                next_version,
                            }
                        }
                        Err(e) => UpdateState::Failed(e),
                    },
                    Err(e) => UpdateState::Failed(e),
                },
                UpdateState::Writing {
                    attempt,
                    current,
                    updated,
                    next_version,
                } => {
                    match self
                        .store
                        .conditional_write(mailbox_id, &updated, &current)
                        .await
                    {
                        Ok(WriteOutcome::Applied) => UpdateState::Done {
                            old: current.acl,
                            new: updated,
                            version: next_version,
                        },
                        Ok(WriteOutcome::Conflict) => {
                            self.metrics.cas_conflicts.inc();
                            debug!(
                                mailbox_id = %mailbox_id,
                                attempt,
                                version = current.version,
                                "Lost ACL write race"
                            );
                            UpdateState::Retrying {
                                attempt: attempt + 1,
                            }
                        }
                        Err(e) => {
                            if e.is_store_unavailable() {
                                self.metrics.store_errors.inc();
                            }
                            UpdateState::Failed(e)
                        }
                    }
                }
                UpdateState::Retrying { attempt } => {
                    if attempt >= self.config.max_retries {
                        self.metrics.retries_exhausted.inc();
                        warn!(
                            mailbox_id = %mailbox_id,
                            attempts = attempt,
                            "Giving up ACL update after repeated conflicts"
                        );
                        UpdateState::Failed(MailboxAclError::ConcurrencyExhausted {
                            mailbox_id,
                            attempts: attempt,
                        })
                    } else {
                        let delay = self.retry_delay(attempt);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        UpdateState::Reading { attempt }
                    }
                }
                UpdateState::Done { old, new, version } => {
                    let diff = AclDiff::compute(&old, &new);
                    return Ok((
                        old,
                        AclUpdate {
                            acl: new,
                            diff,
                            version,
                        },
                    ));
                }
                UpdateState::Failed(e) => return Err(e),
            };
        }
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let backoff = self.config.retry_backoff.delay_for(attempt.saturating_sub(1));
        let jitter = if self.config.jitter_ms > 0 {
            Duration::from_millis(fastrand::u64(0..=self.config.jitter_ms))
        } else {
            Duration::ZERO
        };
        backoff + jitter
    }
}
