//! Notification boundary
//!
//! Fire-and-forget delivery to an external notification subsystem. Failures
//! never affect execution state, so the trait has no error channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderFilled,
    StrategyError,
    RiskAlert,
}

/// Delivery priority hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

/// Trait for notification collaborators
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
        priority: NotificationPriority,
    );
}

/// Notifier that writes to the log stream
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
        priority: NotificationPriority,
    ) {
        tracing::info!(
            user_id,
            title,
            message,
            kind = ?kind,
            priority = ?priority,
            "notification"
        );
    }
}
