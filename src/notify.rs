//! Employee notifications.
//!
//! Lifecycle changes (approval, rejection, payment) notify the employee.
//! Delivery is fire-and-forget: a failing notifier is logged and never
//! undoes the operation that triggered it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::EngineResult;

/// Events the engine notifies employees about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A liquidation was approved.
    LiquidationApproved,
    /// A liquidation was rejected.
    LiquidationRejected,
    /// A liquidation was paid.
    LiquidationPaid,
}

impl NotificationEvent {
    /// Stable event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::LiquidationApproved => "liquidation_approved",
            NotificationEvent::LiquidationRejected => "liquidation_rejected",
            NotificationEvent::LiquidationPaid => "liquidation_paid",
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound notification sink (email, push, queue...).
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, employee_id: &str, event: NotificationEvent, payload: &Value)
    -> EngineResult<()>;
}

/// Notifier that only writes a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        employee_id: &str,
        event: NotificationEvent,
        payload: &Value,
    ) -> EngineResult<()> {
        info!(employee_id = %employee_id, event = %event, payload = %payload, "Notification sent");
        Ok(())
    }
}

/// Sends a notification, logging and swallowing any failure.
pub fn dispatch(notifier: &dyn Notifier, employee_id: &str, event: NotificationEvent, payload: Value) {
    if let Err(err) = notifier.notify(employee_id, event, &payload) {
        warn!(
            employee_id = %employee_id,
            event = %event,
            error = %err,
            "Notification failed; continuing"
        );
    }
}
