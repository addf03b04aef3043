use std::sync::Arc;
use tracing::{debug, warn};

use super::{EventMeta, MailboxEvent, MailboxListener};
use crate::acl::AclDiff;
use crate::types::{MailboxId, MailboxPath, Username, Version};

/// Builds events for mailbox operations and hands them to one listener.
#[derive(Clone)]
pub struct EventDispatcher {
    listener: Arc<dyn MailboxListener>,
}

impl EventDispatcher {
    pub fn new(listener: Arc<dyn MailboxListener>) -> Self {
        Self { listener }
    }

    pub async fn acl_updated(
        &self,
        user: Option<Username>,
        path: Option<MailboxPath>,
        mailbox_id: MailboxId,
        diff: AclDiff,
        version: Version,
    ) {
        self.event(MailboxEvent::AclUpdated {
            meta: EventMeta::now(user),
            mailbox_id,
            path,
            diff,
            version,
        })
        .await
    }

    pub async fn mailbox_added(&self, user: Option<Username>, mailbox_id: MailboxId, path: MailboxPath) {
        self.event(MailboxEvent::MailboxAdded {
            meta: EventMeta::now(user),
            mailbox_id,
            path,
        })
        .await
    }

    pub async fn mailbox_deleted(&self, user: Option<Username>, mailbox_id: MailboxId, path: MailboxPath) {
        self.event(MailboxEvent::MailboxDeleted {
            meta: EventMeta::now(user),
            mailbox_id,
            path,
        })
        .await
    }

    pub async fn mailbox_renamed(
        &self,
        user: Option<Username>,
        mailbox_id: MailboxId,
        old_path: MailboxPath,
        new_path: MailboxPath,
    ) {
        self.event(MailboxEvent::MailboxRenamed {
            meta: EventMeta::now(user),
            mailbox_id,
            old_path,
            new_path,
        })
        .await
    }

    /// Deliver an event. Listener failures are logged, never returned.
    pub async fn event(&self, event: MailboxEvent) {
        debug!(
            event = event.kind(),
            mailbox_id = %event.mailbox_id(),
            "Dispatching mailbox event"
        );
        if let Err(e) = self.listener.event(&event).await {
            warn!(
                listener = self.listener.name(),
                event = event.kind(),
                "Event delivery failed: {}",
                e
            );
        }
    }
}
