//! The single transient message slot.
//!
//! `Empty -> Visible -> Empty`. A new `show` retires the visible notification
//! and aborts its dismissal timer before installing the replacement, so at most
//! one notification and one live timer exist at any time.

use crate::model::{self, Notification};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one `show` call. Expiry messages carry it so a stale timer can
/// never clear a newer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

struct ActiveNotification {
    id: NotificationId,
    notification: Notification,
    timer: JoinHandle<()>,
}

pub struct NotificationManager {
    duration: Duration,
    expiry_tx: UnboundedSender<NotificationId>,
    next_id: u64,
    active: Option<ActiveNotification>,
}

impl NotificationManager {
    /// Timers report on `expiry_tx`; the owner feeds those ids back into `expire`.
    pub fn new(duration: Duration, expiry_tx: UnboundedSender<NotificationId>) -> Self {
        Self {
            duration,
            expiry_tx,
            next_id: 0,
            active: None,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&mut self, text: impl Into<String>) -> NotificationId {
        self.retire();

        self.next_id += 1;
        let id = NotificationId(self.next_id);
        let notification = Notification {
            text: text.into(),
            created_at: model::now(),
        };
        debug!(text = %notification.text, "showing notification");

        let tx = self.expiry_tx.clone();
        let deadline = tokio::time::Instant::now() + self.duration;
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(id);
        });

        self.active = Some(ActiveNotification {
            id,
            notification,
            timer,
        });
        id
    }

    /// Returns whether a notification was visible.
    pub fn dismiss_all(&mut self) -> bool {
        self.retire()
    }

    /// Handle a fired timer. Only the timer of the visible notification clears the slot.
    pub fn expire(&mut self, id: NotificationId) -> bool {
        match &self.active {
            Some(active) if active.id == id => {
                debug!(text = %active.notification.text, "notification expired");
                self.retire()
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&Notification> {
        self.active.as_ref().map(|a| &a.notification)
    }

    fn retire(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                active.timer.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for NotificationManager {
    fn drop(&mut self) {
        self.retire();
    }
}
