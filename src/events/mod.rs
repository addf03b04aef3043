//! Mailbox Events
//!
//! A closed set of event variants, one listener abstraction, and a dispatcher
//! that turns mailbox operations into events. Fan-out to many consumers is
//! handled by `DelegatingListener`, so callers only ever talk to one listener.

pub mod dispatcher;
pub mod listener;

pub use dispatcher::EventDispatcher;
pub use listener::{DelegatingListener, MailboxListener, RecordingListener};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::acl::AclDiff;
use crate::types::{MailboxId, MailboxPath, Username, Version};

#[derive(Debug, Clone, PartialEq)]
pub struct EventMeta {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// User whose session caused the event, when known
    pub user: Option<Username>,
}

impl EventMeta {
    pub fn now(user: Option<Username>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MailboxEvent {
    AclUpdated {
        meta: EventMeta,
        mailbox_id: MailboxId,
        path: Option<MailboxPath>,
        diff: AclDiff,
        version: Version,
    },
    MailboxAdded {
        meta: EventMeta,
        mailbox_id: MailboxId,
        path: MailboxPath,
    },
    MailboxDeleted {
        meta: EventMeta,
        mailbox_id: MailboxId,
        path: MailboxPath,
    },
    MailboxRenamed {
        meta: EventMeta,
        mailbox_id: MailboxId,
        old_path: MailboxPath,
        new_path: MailboxPath,
    },
}

impl MailboxEvent {
    pub fn meta(&self) -> &EventMeta {
        match self {
            MailboxEvent::AclUpdated { meta, .. }
            | MailboxEvent::MailboxAdded { meta, .. }
            | MailboxEvent::MailboxDeleted { meta, .. }
            | MailboxEvent::MailboxRenamed { meta, .. } => meta,
        }
    }

    pub fn mailbox_id(&self) -> MailboxId {
        match self {
            MailboxEvent::AclUpdated { mailbox_id, .. }
            | MailboxEvent::MailboxAdded { mailbox_id, .. }
            | MailboxEvent::MailboxDeleted { mailbox_id, .. }
            | MailboxEvent::MailboxRenamed { mailbox_id, .. } => *mailbox_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MailboxEvent::AclUpdated { .. } => "acl_updated",
            MailboxEvent::MailboxAdded { .. } => "mailbox_added",
            MailboxEvent::MailboxDeleted { .. } => "mailbox_deleted",
            MailboxEvent::MailboxRenamed { .. } => "mailbox_renamed",
        }
    }
}
