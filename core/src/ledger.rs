//! The ledger store port: tickets, bids, and purchases behind one seam.
//!
//! Implementations guarantee atomicity internally. The write operations
//! below are the transaction boundaries of the engine: `upsert_pending_bid`
//! and `finalize_sale` each execute as a single all-or-nothing unit, with
//! conditional updates guarding against concurrent closers.

use crate::types::{
    Bid, BidId, Money, NewTicket, Purchase, Ticket, TicketId, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by ledger store implementations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// The highest bid moved between read and write; re-validate and retry.
    #[error("Highest bid changed concurrently")]
    Conflict,

    /// The ticket is no longer in a state that permits this write.
    #[error("Ticket is not available")]
    TicketUnavailable,

    /// The bid already reached a terminal status.
    #[error("Bid has already been processed")]
    AlreadyProcessed,

    /// The backing store failed.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result of placing or raising a bid.
#[derive(Debug, Clone, PartialEq)]
pub struct BidPlacement {
    /// The standing bid row after the write
    pub bid: Bid,
    /// `true` when an existing bid was raised, `false` when a new row was
    /// inserted
    pub updated: bool,
}

/// Result of closing a ticket with a winning bid.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleOutcome {
    /// The ticket after the sale (Sold, buyer set)
    pub ticket: Ticket,
    /// The winning bid (Accepted)
    pub winning_bid: Bid,
    /// The purchase record for the sale
    pub purchase: Purchase,
    /// How many other pending bids were marked Rejected
    pub rejected_bids: usize,
}

/// Persistence port for the auction engine.
///
/// Injected into each service as `Arc<dyn LedgerStore>`; there is no global
/// store handle.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Load a ticket by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, LedgerError>;

    /// Load a ticket together with all of its bids.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn ticket_with_bids(
        &self,
        id: TicketId,
    ) -> Result<Option<(Ticket, Vec<Bid>)>, LedgerError>;

    /// Load a bid by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn bid(&self, id: BidId) -> Result<Option<Bid>, LedgerError>;

    /// Load a bid together with the ticket it targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn bid_with_ticket(&self, id: BidId) -> Result<Option<(Bid, Ticket)>, LedgerError>;

    /// All bids on a ticket, in placement order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn bids_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<Bid>, LedgerError>;

    /// The highest bid on a ticket regardless of status, ties broken by
    /// earliest placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn highest_bid(&self, ticket_id: TicketId) -> Result<Option<Bid>, LedgerError>;

    /// The highest still-pending bid on a ticket, ties broken by earliest
    /// placement. This is the bid a closing sweep would sell to.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn highest_pending_bid(&self, ticket_id: TicketId)
    -> Result<Option<Bid>, LedgerError>;

    /// The standing pending bid a bidder holds on a ticket, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn pending_bid(
        &self,
        ticket_id: TicketId,
        bidder_id: UserId,
    ) -> Result<Option<Bid>, LedgerError>;

    /// The purchase record for a ticket, if it has sold.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn purchase_for_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<Purchase>, LedgerError>;

    /// Auction tickets still Available whose close time has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn expired_auction_candidates(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Ticket>, LedgerError>;

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Create a new ticket listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, LedgerError>;

    /// Place or raise a bid, atomically.
    ///
    /// Re-reads the highest bid under lock; if it no longer matches
    /// `expected_highest` the operation fails with [`LedgerError::Conflict`]
    /// so the caller can re-validate against fresh state. Otherwise the
    /// bidder's standing pending bid is updated in place, or a new row is
    /// inserted when none exists.
    ///
    /// # Errors
    ///
    /// `Conflict` when the highest bid moved; `TicketUnavailable` when the
    /// ticket closed; `Backend` on store failure.
    async fn upsert_pending_bid(
        &self,
        ticket_id: TicketId,
        bidder_id: UserId,
        amount: Money,
        expected_highest: Option<Money>,
    ) -> Result<BidPlacement, LedgerError>;

    /// Close a ticket with a winning bid, atomically.
    ///
    /// In one unit: the ticket moves Available → Sold with `buyer_id` set,
    /// the winning bid moves Pending → Accepted, every other pending bid on
    /// the ticket moves to Rejected, and the purchase record is created (or
    /// updated in place if one already exists for the ticket). Both the
    /// manual accept path and the expiry sweep close tickets through this
    /// operation.
    ///
    /// # Errors
    ///
    /// `TicketUnavailable` when the ticket is no longer Available;
    /// `AlreadyProcessed` when the winning bid is no longer Pending;
    /// `Backend` on store failure. Any failure rolls the whole unit back.
    async fn finalize_sale(
        &self,
        ticket_id: TicketId,
        winning_bid_id: BidId,
        buyer_id: UserId,
        amount: Money,
    ) -> Result<SaleOutcome, LedgerError>;

    /// Move a single bid Pending → Rejected.
    ///
    /// # Errors
    ///
    /// `AlreadyProcessed` when the bid is no longer Pending; `Backend` on
    /// store failure.
    async fn reject_bid(&self, bid_id: BidId) -> Result<Bid, LedgerError>;

    /// Move a ticket Available → Expired.
    ///
    /// Returns `false` when another closer got there first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn expire_ticket(&self, ticket_id: TicketId) -> Result<bool, LedgerError>;
}

/// Select the highest bid from a slice, ties broken by earliest placement.
///
/// Shared by services that already hold a loaded bid set and by store
/// implementations that resolve the winner in memory.
#[must_use]
pub fn highest_of(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().max_by(|a, b| {
        a.amount
            .cmp(&b.amount)
            .then_with(|| b.created_at.cmp(&a.created_at))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::BidStatus;
    use chrono::Duration;

    fn bid_at(amount: u64, offset_secs: i64) -> Bid {
        let base = Utc::now();
        Bid {
            id: BidId::new(),
            ticket_id: TicketId::new(),
            bidder_id: UserId::new(),
            amount: Money::from_cents(amount),
            status: BidStatus::Pending,
            created_at: base + Duration::seconds(offset_secs),
            updated_at: base + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_highest_of_prefers_amount() {
        let bids = vec![bid_at(100, 0), bid_at(300, 1), bid_at(200, 2)];
        assert_eq!(highest_of(&bids).unwrap().amount, Money::from_cents(300));
    }

    #[test]
    fn test_highest_of_breaks_ties_by_earliest() {
        let first = bid_at(300, 0);
        let second = bid_at(300, 5);
        let bids = vec![second, first.clone()];
        assert_eq!(highest_of(&bids).unwrap().id, first.id);
    }

    #[test]
    fn test_highest_of_empty_is_none() {
        assert!(highest_of(&[]).is_none());
    }
}
