//! Offer resolution service: sellers accepting or declining bids.
//!
//! Preconditions are checked against a fresh read, then the store performs
//! the close as one atomic unit. A precondition that passes here can still
//! fail inside the store when a concurrent closer wins the race; the
//! store's conditional updates are authoritative.

use crate::error::{AuctionError, Result};
use crate::ledger::{LedgerStore, SaleOutcome};
use crate::metrics::{record_auction_sold, record_bid_rejected};
use crate::notify::{AuctionNotification, NotificationPort, publish_best_effort};
use crate::types::{Bid, BidId, BidStatus, Ticket, TicketStatus, UserId};
use std::sync::Arc;

/// Accepts and rejects bids on behalf of sellers.
pub struct OfferResolutionService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn NotificationPort>,
}

impl OfferResolutionService {
    /// Create a new offer resolution service
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn NotificationPort>) -> Self {
        Self { store, notifier }
    }

    /// Accept a bid: the ticket sells to the bidder at the bid amount.
    ///
    /// In one atomic unit the ticket moves to Sold with the buyer set, the
    /// winning bid moves to Accepted, every other pending bid is marked
    /// Rejected, and the purchase record is written. Emits an
    /// `auction_won` notification on success.
    ///
    /// # Errors
    ///
    /// `NotFound` when the bid does not exist; `Forbidden` when the actor
    /// is not the seller; `TicketUnavailable` when the ticket already
    /// closed; `AlreadyProcessed` when the bid is no longer pending;
    /// `Store` on backend failure.
    #[tracing::instrument(skip(self), fields(%bid_id, %acting_user))]
    pub async fn accept_bid(&self, bid_id: BidId, acting_user: UserId) -> Result<SaleOutcome> {
        let (bid, ticket) = self.load_for_resolution(bid_id, acting_user).await?;

        let outcome = self
            .store
            .finalize_sale(ticket.id, bid.id, bid.bidder_id, bid.amount)
            .await?;

        record_auction_sold("accept", outcome.purchase.amount.cents());
        tracing::info!(
            ticket_id = %outcome.ticket.id,
            buyer_id = %bid.bidder_id,
            amount = %bid.amount,
            rejected_bids = outcome.rejected_bids,
            "Bid accepted, ticket sold"
        );

        publish_best_effort(
            self.notifier.as_ref(),
            &AuctionNotification::AuctionWon {
                ticket_id: outcome.ticket.id,
                event_id: outcome.ticket.event_id,
                bid_id: outcome.winning_bid.id,
                buyer_id: bid.bidder_id,
                amount: bid.amount,
            },
        )
        .await;

        Ok(outcome)
    }

    /// Reject a bid: a single status flip, no ticket or purchase mutation.
    ///
    /// Emits a `bid_rejected` notification on success.
    ///
    /// # Errors
    ///
    /// `NotFound` when the bid does not exist; `Forbidden` when the actor
    /// is not the seller; `AlreadyProcessed` when the bid is no longer
    /// pending; `Store` on backend failure.
    #[tracing::instrument(skip(self), fields(%bid_id, %acting_user))]
    pub async fn reject_bid(&self, bid_id: BidId, acting_user: UserId) -> Result<Bid> {
        let (bid, _ticket) = self.load_for_resolution(bid_id, acting_user).await?;

        let rejected = self.store.reject_bid(bid.id).await?;

        record_bid_rejected();
        tracing::info!(
            ticket_id = %rejected.ticket_id,
            bidder_id = %rejected.bidder_id,
            "Bid rejected"
        );

        publish_best_effort(
            self.notifier.as_ref(),
            &AuctionNotification::BidRejected {
                ticket_id: rejected.ticket_id,
                bid_id: rejected.id,
                bidder_id: rejected.bidder_id,
                amount: rejected.amount,
            },
        )
        .await;

        Ok(rejected)
    }

    /// Shared precondition checks: the bid exists, the actor is the
    /// ticket's seller, the ticket is still open, and the bid is pending.
    async fn load_for_resolution(
        &self,
        bid_id: BidId,
        acting_user: UserId,
    ) -> Result<(Bid, Ticket)> {
        let (bid, ticket) = self
            .store
            .bid_with_ticket(bid_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or_else(|| AuctionError::NotFound {
                what: "bid",
                id: bid_id.to_string(),
            })?;

        if acting_user != ticket.seller_id {
            return Err(AuctionError::Forbidden);
        }

        if ticket.status != TicketStatus::Available {
            return Err(AuctionError::TicketUnavailable);
        }

        if bid.status != BidStatus::Pending {
            return Err(AuctionError::AlreadyProcessed);
        }

        Ok((bid, ticket))
    }
}
