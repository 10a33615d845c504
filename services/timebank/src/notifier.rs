//! Notification sink
//!
//! Delivery is fire-and-forget: a failed insert is logged and must never
//! abort the booking operation that triggered it.

use tracing::warn;
use uuid::Uuid;

use crate::models::NotificationKind;
use crate::repositories::NotificationRepository;

/// Notification sink backed by the notifications table
#[derive(Clone)]
pub struct Notifier {
    notifications: NotificationRepository,
}

impl Notifier {
    /// Create a new notifier
    pub fn new(notifications: NotificationRepository) -> Self {
        Self { notifications }
    }

    /// Deliver a notification, logging any failure instead of propagating it
    pub async fn notify(&self, user_id: Uuid, kind: NotificationKind, content: String) {
        if let Err(e) = self.notifications.insert(user_id, kind, &content).await {
            warn!(user_id = %user_id, error = %e, "failed to deliver notification");
        }
    }
}
