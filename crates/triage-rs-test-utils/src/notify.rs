use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use triage_rs_core::{Notifier, TriageError};
use triage_rs_protocol::{DeliveryStatus, Notification};

/// Marks notifications sent and keeps them for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, mut notification: Notification) -> Result<Notification, TriageError> {
        notification.status = DeliveryStatus::Sent;
        self.sent.lock().push(notification.clone());
        Ok(notification)
    }
}

/// Rejects every notification.
#[derive(Debug, Clone, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, _notification: Notification) -> Result<Notification, TriageError> {
        Err(TriageError::Notify("pager offline".to_string()))
    }
}
