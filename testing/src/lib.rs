//! # Gavel Testing
//!
//! Testing utilities and mock ports for the auction engine.
//!
//! This crate provides:
//! - `InMemoryLedgerStore`: deterministic ledger store with the same
//!   atomicity guarantees as the production store
//! - `FixedClock`: deterministic time
//! - `RecordingNotifier`: captures published notifications
//!
//! ## Example
//!
//! ```ignore
//! use gavel_testing::mocks::{InMemoryLedgerStore, RecordingNotifier, test_clock};
//! use gavel_core::placement::BidPlacementService;
//!
//! #[tokio::test]
//! async fn test_bid_flow() {
//!     let clock = Arc::new(test_clock());
//!     let store = Arc::new(InMemoryLedgerStore::new(clock.clone()));
//!     let notifier = Arc::new(RecordingNotifier::new());
//!     let service = BidPlacementService::new(store.clone(), notifier.clone(), clock);
//!
//!     let placed = service.place_bid(ticket_id, bidder, amount).await.unwrap();
//!     assert_eq!(placed.message(), "Bid placed successfully");
//! }
//! ```

use chrono::{DateTime, Utc};
use gavel_core::clock::Clock;

/// Mock implementations of the engine's ports.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use async_trait::async_trait;
    use gavel_core::ledger::{
        BidPlacement, LedgerError, LedgerStore, SaleOutcome, highest_of,
    };
    use gavel_core::notify::{AuctionNotification, NotificationPort, NotifyError};
    use gavel_core::types::{
        Bid, BidId, BidStatus, ListingType, Money, NewTicket, Purchase, PurchaseId,
        PurchaseStatus, Ticket, TicketId, TicketStatus, UserId,
    };
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    #[derive(Default)]
    struct LedgerState {
        tickets: Vec<Ticket>,
        bids: Vec<Bid>,
        purchases: Vec<Purchase>,
        fail_finalize: HashSet<TicketId>,
        stale_candidates: Vec<Ticket>,
    }

    impl LedgerState {
        fn ticket(&self, id: TicketId) -> Option<&Ticket> {
            self.tickets.iter().find(|t| t.id == id)
        }

        fn ticket_mut(&mut self, id: TicketId) -> Option<&mut Ticket> {
            self.tickets.iter_mut().find(|t| t.id == id)
        }

        fn bid(&self, id: BidId) -> Option<&Bid> {
            self.bids.iter().find(|b| b.id == id)
        }

        fn bids_for(&self, ticket_id: TicketId) -> Vec<Bid> {
            let mut bids: Vec<Bid> = self
                .bids
                .iter()
                .filter(|b| b.ticket_id == ticket_id)
                .cloned()
                .collect();
            bids.sort_by_key(|b| b.created_at);
            bids
        }
    }

    /// In-memory ledger store with the same atomicity guarantees as the
    /// production store: every operation runs inside one mutex scope, so
    /// a write either applies completely or not at all.
    pub struct InMemoryLedgerStore {
        state: Mutex<LedgerState>,
        clock: Arc<dyn Clock>,
    }

    impl InMemoryLedgerStore {
        /// Create a new empty store; timestamps come from the given clock
        #[must_use]
        pub fn new(clock: Arc<dyn Clock>) -> Self {
            Self {
                state: Mutex::new(LedgerState::default()),
                clock,
            }
        }

        /// Insert a ticket row exactly as given, bypassing the listing
        /// flow. For arranging unusual states in tests.
        pub async fn put_ticket(&self, ticket: Ticket) {
            self.state.lock().await.tickets.push(ticket);
        }

        /// Insert a bid row exactly as given.
        pub async fn put_bid(&self, bid: Bid) {
            self.state.lock().await.bids.push(bid);
        }

        /// Make `finalize_sale` fail with a backend error for one ticket.
        pub async fn fail_finalize_for(&self, ticket_id: TicketId) {
            self.state.lock().await.fail_finalize.insert(ticket_id);
        }

        /// Serve an extra candidate from the next
        /// `expired_auction_candidates` call, as if the ticket had been
        /// closed between the candidate query and the close attempt.
        pub async fn push_stale_candidate(&self, ticket: Ticket) {
            self.state.lock().await.stale_candidates.push(ticket);
        }

        /// Number of bid rows a bidder holds on a ticket, any status.
        pub async fn bid_rows(&self, ticket_id: TicketId, bidder_id: UserId) -> usize {
            self.state
                .lock()
                .await
                .bids
                .iter()
                .filter(|b| b.ticket_id == ticket_id && b.bidder_id == bidder_id)
                .count()
        }

        /// Number of purchase rows for a ticket.
        pub async fn purchase_rows(&self, ticket_id: TicketId) -> usize {
            self.state
                .lock()
                .await
                .purchases
                .iter()
                .filter(|p| p.ticket_id == ticket_id)
                .count()
        }
    }

    #[async_trait]
    impl LedgerStore for InMemoryLedgerStore {
        async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, LedgerError> {
            Ok(self.state.lock().await.ticket(id).cloned())
        }

        async fn ticket_with_bids(
            &self,
            id: TicketId,
        ) -> Result<Option<(Ticket, Vec<Bid>)>, LedgerError> {
            let state = self.state.lock().await;
            Ok(state
                .ticket(id)
                .cloned()
                .map(|ticket| {
                    let bids = state.bids_for(ticket.id);
                    (ticket, bids)
                }))
        }

        async fn bid(&self, id: BidId) -> Result<Option<Bid>, LedgerError> {
            Ok(self.state.lock().await.bid(id).cloned())
        }

        async fn bid_with_ticket(
            &self,
            id: BidId,
        ) -> Result<Option<(Bid, Ticket)>, LedgerError> {
            let state = self.state.lock().await;
            Ok(state.bid(id).cloned().and_then(|bid| {
                state.ticket(bid.ticket_id).cloned().map(|ticket| (bid, ticket))
            }))
        }

        async fn bids_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<Bid>, LedgerError> {
            Ok(self.state.lock().await.bids_for(ticket_id))
        }

        async fn highest_bid(&self, ticket_id: TicketId) -> Result<Option<Bid>, LedgerError> {
            let state = self.state.lock().await;
            let bids = state.bids_for(ticket_id);
            Ok(highest_of(&bids).cloned())
        }

        async fn highest_pending_bid(
            &self,
            ticket_id: TicketId,
        ) -> Result<Option<Bid>, LedgerError> {
            let state = self.state.lock().await;
            let pending: Vec<Bid> = state
                .bids_for(ticket_id)
                .into_iter()
                .filter(|b| b.status == BidStatus::Pending)
                .collect();
            Ok(highest_of(&pending).cloned())
        }

        async fn pending_bid(
            &self,
            ticket_id: TicketId,
            bidder_id: UserId,
        ) -> Result<Option<Bid>, LedgerError> {
            Ok(self
                .state
                .lock()
                .await
                .bids
                .iter()
                .find(|b| {
                    b.ticket_id == ticket_id
                        && b.bidder_id == bidder_id
                        && b.status == BidStatus::Pending
                })
                .cloned())
        }

        async fn purchase_for_ticket(
            &self,
            ticket_id: TicketId,
        ) -> Result<Option<Purchase>, LedgerError> {
            Ok(self
                .state
                .lock()
                .await
                .purchases
                .iter()
                .find(|p| p.ticket_id == ticket_id)
                .cloned())
        }

        async fn expired_auction_candidates(
            &self,
            now: DateTime<Utc>,
            limit: u32,
        ) -> Result<Vec<Ticket>, LedgerError> {
            let mut state = self.state.lock().await;
            let mut candidates: Vec<Ticket> = state
                .tickets
                .iter()
                .filter(|t| {
                    t.status == TicketStatus::Available
                        && t.listing_type == ListingType::Auction
                        && t.end_time.is_some_and(|end| end < now)
                })
                .cloned()
                .collect();
            candidates.sort_by_key(|t| t.end_time);
            candidates.truncate(limit as usize);
            candidates.append(&mut state.stale_candidates);
            Ok(candidates)
        }

        async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, LedgerError> {
            let now = self.clock.now();
            let created = Ticket::new(
                TicketId::new(),
                ticket.event_id,
                ticket.seller_id,
                ticket.price,
                ticket.listing_type,
                ticket.end_time,
                now,
            );
            self.state.lock().await.tickets.push(created.clone());
            Ok(created)
        }

        async fn upsert_pending_bid(
            &self,
            ticket_id: TicketId,
            bidder_id: UserId,
            amount: Money,
            expected_highest: Option<Money>,
        ) -> Result<BidPlacement, LedgerError> {
            let now = self.clock.now();
            let mut state = self.state.lock().await;

            let ticket = state
                .ticket(ticket_id)
                .ok_or_else(|| LedgerError::Backend(format!("ticket {ticket_id} missing")))?;
            if ticket.status != TicketStatus::Available {
                return Err(LedgerError::TicketUnavailable);
            }

            let bids = state.bids_for(ticket_id);
            let current_highest = highest_of(&bids).map(|b| b.amount);
            if current_highest != expected_highest {
                return Err(LedgerError::Conflict);
            }

            let standing = state.bids.iter_mut().find(|b| {
                b.ticket_id == ticket_id
                    && b.bidder_id == bidder_id
                    && b.status == BidStatus::Pending
            });

            match standing {
                Some(bid) => {
                    bid.amount = amount;
                    bid.updated_at = now;
                    Ok(BidPlacement {
                        bid: bid.clone(),
                        updated: true,
                    })
                }
                None => {
                    let bid = Bid::new(BidId::new(), ticket_id, bidder_id, amount, now);
                    state.bids.push(bid.clone());
                    Ok(BidPlacement { bid, updated: false })
                }
            }
        }

        async fn finalize_sale(
            &self,
            ticket_id: TicketId,
            winning_bid_id: BidId,
            buyer_id: UserId,
            amount: Money,
        ) -> Result<SaleOutcome, LedgerError> {
            let now = self.clock.now();
            let mut state = self.state.lock().await;

            if state.fail_finalize.contains(&ticket_id) {
                return Err(LedgerError::Backend("injected finalize failure".to_string()));
            }

            // Validate everything before the first mutation so a failure
            // leaves the state untouched, as a rolled-back transaction
            // would.
            let ticket = state
                .ticket(ticket_id)
                .ok_or_else(|| LedgerError::Backend(format!("ticket {ticket_id} missing")))?;
            if ticket.status != TicketStatus::Available {
                return Err(LedgerError::TicketUnavailable);
            }

            let winning = state
                .bid(winning_bid_id)
                .ok_or_else(|| LedgerError::Backend(format!("bid {winning_bid_id} missing")))?;
            if winning.status != BidStatus::Pending || winning.ticket_id != ticket_id {
                return Err(LedgerError::AlreadyProcessed);
            }

            let mut winning_bid = None;
            let mut rejected = 0;
            for bid in state
                .bids
                .iter_mut()
                .filter(|b| b.ticket_id == ticket_id && b.status == BidStatus::Pending)
            {
                if bid.id == winning_bid_id {
                    bid.status = BidStatus::Accepted;
                    bid.updated_at = now;
                    winning_bid = Some(bid.clone());
                } else {
                    bid.status = BidStatus::Rejected;
                    bid.updated_at = now;
                    rejected += 1;
                }
            }
            let winning_bid = winning_bid
                .ok_or_else(|| LedgerError::Backend("winning bid vanished".to_string()))?;

            let purchase = match state
                .purchases
                .iter_mut()
                .find(|p| p.ticket_id == ticket_id)
            {
                Some(existing) => {
                    existing.buyer_id = buyer_id;
                    existing.amount = amount;
                    existing.status = PurchaseStatus::Completed;
                    existing.updated_at = now;
                    existing.clone()
                }
                None => {
                    let purchase = Purchase {
                        id: PurchaseId::new(),
                        ticket_id,
                        buyer_id,
                        amount,
                        status: PurchaseStatus::Completed,
                        created_at: now,
                        updated_at: now,
                    };
                    state.purchases.push(purchase.clone());
                    purchase
                }
            };

            let ticket = state
                .ticket_mut(ticket_id)
                .ok_or_else(|| LedgerError::Backend("ticket vanished".to_string()))?;
            ticket.status = TicketStatus::Sold;
            ticket.buyer_id = Some(buyer_id);
            ticket.updated_at = now;
            let ticket = ticket.clone();

            Ok(SaleOutcome {
                ticket,
                winning_bid,
                purchase,
                rejected_bids: rejected,
            })
        }

        async fn reject_bid(&self, bid_id: BidId) -> Result<Bid, LedgerError> {
            let now = self.clock.now();
            let mut state = self.state.lock().await;

            let bid = state
                .bids
                .iter_mut()
                .find(|b| b.id == bid_id)
                .ok_or_else(|| LedgerError::Backend(format!("bid {bid_id} missing")))?;
            if bid.status != BidStatus::Pending {
                return Err(LedgerError::AlreadyProcessed);
            }

            bid.status = BidStatus::Rejected;
            bid.updated_at = now;
            Ok(bid.clone())
        }

        async fn expire_ticket(&self, ticket_id: TicketId) -> Result<bool, LedgerError> {
            let now = self.clock.now();
            let mut state = self.state.lock().await;

            let ticket = state
                .ticket_mut(ticket_id)
                .ok_or_else(|| LedgerError::Backend(format!("ticket {ticket_id} missing")))?;
            if ticket.status != TicketStatus::Available {
                return Ok(false);
            }

            ticket.status = TicketStatus::Expired;
            ticket.updated_at = now;
            Ok(true)
        }
    }

    /// Notification port that records every published notification.
    #[derive(Default)]
    pub struct RecordingNotifier {
        recorded: Mutex<Vec<AuctionNotification>>,
    }

    impl RecordingNotifier {
        /// Creates a new recording notifier
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// All notifications published so far, in order.
        pub async fn recorded(&self) -> Vec<AuctionNotification> {
            self.recorded.lock().await.clone()
        }
    }

    #[async_trait]
    impl NotificationPort for RecordingNotifier {
        async fn publish(&self, notification: &AuctionNotification) -> Result<(), NotifyError> {
            self.recorded.lock().await.push(notification.clone());
            Ok(())
        }
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, InMemoryLedgerStore, RecordingNotifier, test_clock};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gavel_core::ledger::LedgerStore;
    use gavel_core::types::{EventId, ListingType, Money, NewTicket, UserId};
    use std::sync::Arc;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[tokio::test]
    async fn test_insert_ticket_uses_clock_time() {
        let clock = Arc::new(test_clock());
        let store = InMemoryLedgerStore::new(clock.clone());

        let ticket = store
            .insert_ticket(NewTicket {
                event_id: EventId::new(),
                seller_id: UserId::new(),
                price: Money::from_rupees(500),
                listing_type: ListingType::Auction,
                end_time: None,
            })
            .await
            .unwrap();

        assert_eq!(ticket.created_at, clock.now());
        assert_eq!(store.ticket(ticket.id).await.unwrap(), Some(ticket));
    }
}
