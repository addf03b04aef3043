use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::warn;

use super::MailboxEvent;
use crate::Result;

/// Consumer of mailbox events
#[async_trait]
pub trait MailboxListener: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn event(&self, event: &MailboxEvent) -> Result<()>;
}

/// Listener that forwards every event to all registered listeners.
///
/// Listeners run concurrently; one failing listener is logged and does not
/// affect the others.
#[derive(Default)]
pub struct DelegatingListener {
    listeners: RwLock<Vec<Arc<dyn MailboxListener>>>,
}

impl DelegatingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn MailboxListener>) {
        self.listeners.write().push(listener);
    }

    /// Remove a previously registered listener. Returns whether it was found.
    pub fn remove_listener(&self, listener: &Arc<dyn MailboxListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|registered| !Arc::ptr_eq(registered, listener));
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

#[async_trait]
impl MailboxListener for DelegatingListener {
    fn name(&self) -> &str {
        "delegating"
    }

    async fn event(&self, event: &MailboxEvent) -> Result<()> {
        let listeners = self.listeners.read().clone();

        let results = join_all(listeners.iter().map(|listener| listener.event(event))).await;

        for (listener, result) in listeners.iter().zip(results) {
            if let Err(e) = result {
                warn!(
                    listener = listener.name(),
                    event = event.kind(),
                    mailbox_id = %event.mailbox_id(),
                    "Listener failed to handle event: {}",
                    e
                );
            }
        }
        Ok(())
    }
}

/// Listener that keeps every event it receives
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<MailboxEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MailboxEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl MailboxListener for RecordingListener {
    fn name(&self) -> &str {
        "recording"
    }

    async fn event(&self, event: &MailboxEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
