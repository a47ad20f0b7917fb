//! Notification sink for clinical staff alerts.

use crate::error::TriageError;
use async_trait::async_trait;
use log::info;
use triage_rs_protocol::{DeliveryStatus, Notification};

/// Delivers notifications and reports their final status.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a pending notification, returning it with its status set.
    async fn deliver(&self, notification: Notification) -> Result<Notification, TriageError>;
}

/// Notifier that writes to the log and always reports `sent`.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, mut notification: Notification) -> Result<Notification, TriageError> {
        notification.status = DeliveryStatus::Sent;
        info!(
            "notification sent (type={:?}, patient_id={}, risk_level={}, message={})",
            notification.kind,
            notification.patient_id,
            notification.risk_level,
            notification.message
        );
        Ok(notification)
    }
}
