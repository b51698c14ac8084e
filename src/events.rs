use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Events emitted by the engine's write paths.
///
/// Consumers (order pipeline, audit log, notifications) subscribe to the
/// channel side; the engine only ever sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Coupon lifecycle
    CouponCreated(Uuid),
    CouponArchived(Uuid),
    CouponRedeemed {
        coupon_id: Uuid,
        order_id: Uuid,
        discount: Decimal,
    },

    // Promotion lifecycle
    PromotionCreated(Uuid),
    PromotionDeactivated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is
    /// closed. Used on paths where event delivery must not abort the
    /// operation that already committed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}
