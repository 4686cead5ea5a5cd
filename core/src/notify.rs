//! Notification port and in-process implementations.
//!
//! Services publish a notification strictly after the store transaction
//! commits. Delivery is best-effort: a failed publish is logged at `warn`
//! and never affects the business result.

use crate::types::{BidId, EventId, Money, TicketId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Notification delivery failure.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Events published by the auction engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuctionNotification {
    /// A bid was placed or raised
    BidPlaced {
        /// Ticket the bid targets
        ticket_id: TicketId,
        /// The standing bid row
        bid_id: BidId,
        /// User who placed the bid
        bidder_id: UserId,
        /// Offered amount
        amount: Money,
        /// Whether an existing bid was raised
        updated: bool,
    },
    /// The seller declined a bid
    BidRejected {
        /// Ticket the bid targeted
        ticket_id: TicketId,
        /// The rejected bid
        bid_id: BidId,
        /// User whose bid was rejected
        bidder_id: UserId,
        /// Amount that was offered
        amount: Money,
    },
    /// The seller accepted a bid and the ticket sold
    AuctionWon {
        /// Ticket that sold
        ticket_id: TicketId,
        /// Event the ticket admits to
        event_id: EventId,
        /// The winning bid
        bid_id: BidId,
        /// New owner of the ticket
        buyer_id: UserId,
        /// Final sale amount
        amount: Money,
    },
    /// An expired auction closed with a winner
    AuctionEnded {
        /// Ticket that sold
        ticket_id: TicketId,
        /// Event the ticket admits to
        event_id: EventId,
        /// The winning bid
        winning_bid_id: BidId,
        /// New owner of the ticket
        buyer_id: UserId,
        /// Final sale amount
        amount: Money,
    },
    /// An expired auction closed with no bids
    AuctionExpired {
        /// Ticket that expired
        ticket_id: TicketId,
        /// Event the ticket admits to
        event_id: EventId,
    },
}

/// Outbound notification port.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Publish a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers treat this as
    /// best-effort.
    async fn publish(&self, notification: &AuctionNotification) -> Result<(), NotifyError>;
}

/// Publish a notification, logging and discarding any delivery failure.
pub async fn publish_best_effort(
    port: &dyn NotificationPort,
    notification: &AuctionNotification,
) {
    if let Err(error) = port.publish(notification).await {
        tracing::warn!(%error, ?notification, "Failed to publish notification");
    }
}

/// Notification port that logs every event (the default in development).
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    /// Creates a new logging notifier
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn NotificationPort> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl NotificationPort for LoggingNotifier {
    async fn publish(&self, notification: &AuctionNotification) -> Result<(), NotifyError> {
        match serde_json::to_string(notification) {
            Ok(payload) => {
                tracing::info!(payload, "Auction notification");
                Ok(())
            }
            Err(error) => Err(NotifyError(format!(
                "Failed to serialize notification: {error}"
            ))),
        }
    }
}

/// Notification port that fans out over a tokio broadcast channel, for a
/// realtime delivery layer to subscribe to.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<AuctionNotification>,
}

impl BroadcastNotifier {
    /// Creates a new broadcast notifier with the given channel capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the notification stream
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuctionNotification> {
        self.sender.subscribe()
    }

    /// Creates an Arc-wrapped instance for sharing, returning the handle
    /// alongside so callers can still subscribe
    #[must_use]
    pub fn shared(capacity: usize) -> (Arc<dyn NotificationPort>, Self) {
        let notifier = Self::new(capacity);
        (Arc::new(notifier.clone()), notifier)
    }
}

#[async_trait]
impl NotificationPort for BroadcastNotifier {
    async fn publish(&self, notification: &AuctionNotification) -> Result<(), NotifyError> {
        // A send error only means no subscriber is currently listening.
        let _ = self.sender.send(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_serialize_with_type_tag() {
        let notification = AuctionNotification::AuctionWon {
            ticket_id: TicketId::new(),
            event_id: EventId::new(),
            bid_id: BidId::new(),
            buyer_id: UserId::new(),
            amount: Money::from_rupees(550),
        };

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], "auction_won");
        assert_eq!(value["amount"], 55_000);
    }

    #[tokio::test]
    async fn test_broadcast_notifier_fans_out() {
        let notifier = BroadcastNotifier::new(16);
        let mut receiver = notifier.subscribe();

        let notification = AuctionNotification::AuctionExpired {
            ticket_id: TicketId::new(),
            event_id: EventId::new(),
        };
        notifier.publish(&notification).await.unwrap();

        assert_eq!(receiver.recv().await.unwrap(), notification);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let notifier = BroadcastNotifier::new(16);
        let notification = AuctionNotification::AuctionExpired {
            ticket_id: TicketId::new(),
            event_id: EventId::new(),
        };

        assert!(notifier.publish(&notification).await.is_ok());
    }
}
