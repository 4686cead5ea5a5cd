//! Bid placement service.
//!
//! Coordinates validation and the conditional write: validate against a
//! snapshot, then hand the store the highest amount that snapshot saw. If
//! another bidder moved the highest in between, the store reports a
//! conflict and the whole pass re-runs against fresh state.

use crate::clock::Clock;
use crate::error::{AuctionError, Result};
use crate::ledger::{LedgerError, LedgerStore, highest_of};
use crate::metrics::record_bid_placed;
use crate::notify::{AuctionNotification, NotificationPort, publish_best_effort};
use crate::types::{AuctionStatus, Bid, Money, TicketId, UserId};
use crate::validator::{minimum_bid, validate_bid};
use std::sync::Arc;

/// How many times a placement re-validates after losing the highest-bid
/// race before giving up.
const MAX_PLACEMENT_ATTEMPTS: u32 = 3;

/// Whether a placement created a new bid or raised an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    /// A new bid row was created
    Placed,
    /// The bidder's standing bid was raised
    Updated,
}

/// A successfully placed bid.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBid {
    /// The standing bid row after the write
    pub bid: Bid,
    /// Whether the bid was new or an update
    pub outcome: BidOutcome,
}

impl PlacedBid {
    /// Human-readable confirmation message for the bidder.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.outcome {
            BidOutcome::Placed => "Bid placed successfully",
            BidOutcome::Updated => "Bid updated successfully",
        }
    }
}

/// Places and raises bids on auction listings.
pub struct BidPlacementService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn NotificationPort>,
    clock: Arc<dyn Clock>,
}

impl BidPlacementService {
    /// Create a new bid placement service
    pub fn new(
        store: Arc<dyn LedgerStore>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Place a bid, or raise the bidder's standing bid on the same ticket.
    ///
    /// Exactly one bid row is touched and the auction is never closed by
    /// this path. Emits a `bid_placed` notification on success.
    ///
    /// # Errors
    ///
    /// Validation failures per the rejection order (`NotFound`,
    /// `NotAvailable`, `NotAuction`, `SelfBid`, `AuctionEnded`,
    /// `BelowMinimum`); `Conflict` when the highest-bid race is lost
    /// repeatedly; `Store` on backend failure.
    #[tracing::instrument(skip(self), fields(%ticket_id, %bidder_id, %amount))]
    pub async fn place_bid(
        &self,
        ticket_id: TicketId,
        bidder_id: UserId,
        amount: Money,
    ) -> Result<PlacedBid> {
        for attempt in 1..=MAX_PLACEMENT_ATTEMPTS {
            let (ticket, bids) = self
                .store
                .ticket_with_bids(ticket_id)
                .await
                .map_err(AuctionError::from)?
                .ok_or_else(|| AuctionError::NotFound {
                    what: "ticket",
                    id: ticket_id.to_string(),
                })?;

            let highest = highest_of(&bids);
            let approval = validate_bid(&ticket, highest, bidder_id, amount, self.clock.now())?;

            match self
                .store
                .upsert_pending_bid(ticket_id, bidder_id, amount, approval.highest)
                .await
            {
                Ok(placement) => {
                    record_bid_placed(placement.updated);
                    tracing::info!(
                        bid_id = %placement.bid.id,
                        updated = placement.updated,
                        "Bid placed"
                    );

                    publish_best_effort(
                        self.notifier.as_ref(),
                        &AuctionNotification::BidPlaced {
                            ticket_id,
                            bid_id: placement.bid.id,
                            bidder_id,
                            amount,
                            updated: placement.updated,
                        },
                    )
                    .await;

                    let outcome = if placement.updated {
                        BidOutcome::Updated
                    } else {
                        BidOutcome::Placed
                    };
                    return Ok(PlacedBid {
                        bid: placement.bid,
                        outcome,
                    });
                }
                Err(LedgerError::Conflict) => {
                    tracing::debug!(attempt, "Highest bid moved during placement, re-validating");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(AuctionError::Conflict)
    }

    /// Point-in-time auction summary for a ticket, computed from one
    /// joined read. The advertised next minimum uses the same policy the
    /// placement path enforces.
    ///
    /// # Errors
    ///
    /// `NotFound` when the ticket does not exist; `Store` on backend
    /// failure.
    #[tracing::instrument(skip(self), fields(%ticket_id))]
    pub async fn auction_status(&self, ticket_id: TicketId) -> Result<AuctionStatus> {
        let (ticket, bids) = self
            .store
            .ticket_with_bids(ticket_id)
            .await
            .map_err(AuctionError::from)?
            .ok_or_else(|| AuctionError::NotFound {
                what: "ticket",
                id: ticket_id.to_string(),
            })?;

        let now = self.clock.now();
        let highest = highest_of(&bids).map(|bid| bid.amount);
        let time_left_secs = ticket.end_time.and_then(|end| {
            let secs = (end - now).num_seconds();
            (secs >= 0).then_some(secs)
        });

        Ok(AuctionStatus {
            ticket_id,
            status: ticket.status,
            starting_price: ticket.price,
            current_highest_bid: highest,
            minimum_next_bid: minimum_bid(highest),
            total_bids: bids.len(),
            is_ended: ticket.has_ended(now),
            end_time: ticket.end_time,
            time_left_secs,
        })
    }
}
