//! In-memory notifier that records what it was asked to show.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::domain::notification::Notification;
use crate::ports::Notifier;

/// Collects notifications for later inspection.
///
/// Clones share the same record.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything notified so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.received.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.lock().is_empty()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}
