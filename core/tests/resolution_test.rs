//! Offer resolution integration tests.
//!
//! Exercises seller accept and reject against the in-memory ledger store,
//! including the single-winner guarantee under concurrent accepts.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::Duration;
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::ledger::LedgerStore;
use gavel_core::notify::AuctionNotification;
use gavel_core::resolution::OfferResolutionService;
use gavel_core::types::{
    Bid, BidId, BidStatus, EventId, ListingType, Money, Ticket, TicketId, TicketStatus, UserId,
};
use gavel_testing::{InMemoryLedgerStore, RecordingNotifier, test_clock};
use std::sync::Arc;

fn setup() -> (
    Arc<InMemoryLedgerStore>,
    Arc<RecordingNotifier>,
    OfferResolutionService,
) {
    let clock: Arc<dyn Clock> = Arc::new(test_clock());
    let store = Arc::new(InMemoryLedgerStore::new(clock));
    let notifier = Arc::new(RecordingNotifier::new());
    let service = OfferResolutionService::new(store.clone(), notifier.clone());
    (store, notifier, service)
}

fn open_auction(seller: UserId) -> Ticket {
    let now = test_clock().now();
    Ticket::new(
        TicketId::new(),
        EventId::new(),
        seller,
        Money::from_rupees(500),
        ListingType::Auction,
        Some(now + Duration::hours(24)),
        now,
    )
}

fn pending_bid(ticket_id: TicketId, amount: Money) -> Bid {
    Bid::new(BidId::new(), ticket_id, UserId::new(), amount, test_clock().now())
}

/// Seed an open auction with two pending bids of 550 and 700 rupees.
async fn seed_two_bids(store: &InMemoryLedgerStore, seller: UserId) -> (Ticket, Bid, Bid) {
    let ticket = open_auction(seller);
    store.put_ticket(ticket.clone()).await;

    let low = pending_bid(ticket.id, Money::from_rupees(550));
    let high = pending_bid(ticket.id, Money::from_rupees(700));
    store.put_bid(low.clone()).await;
    store.put_bid(high.clone()).await;

    (ticket, low, high)
}

/// Test 1: Accepting a bid sells the ticket
///
/// The ticket moves to Sold with the buyer set, the winning bid is
/// Accepted, every other pending bid is Rejected, and exactly one
/// purchase record exists.
#[tokio::test]
async fn test_accept_sells_ticket_to_bidder() {
    let (store, notifier, service) = setup();
    let seller = UserId::new();
    let (ticket, low, high) = seed_two_bids(&store, seller).await;

    let outcome = service
        .accept_bid(high.id, seller)
        .await
        .expect("Accept should succeed");

    assert_eq!(outcome.ticket.status, TicketStatus::Sold);
    assert_eq!(outcome.ticket.buyer_id, Some(high.bidder_id));
    assert_eq!(outcome.winning_bid.status, BidStatus::Accepted);
    assert_eq!(outcome.rejected_bids, 1);
    assert_eq!(outcome.purchase.buyer_id, high.bidder_id);
    assert_eq!(outcome.purchase.amount, Money::from_rupees(700));
    assert_eq!(store.purchase_rows(ticket.id).await, 1);

    let loser = store
        .bid(low.id)
        .await
        .expect("Store should read")
        .expect("Losing bid should exist");
    assert_eq!(loser.status, BidStatus::Rejected);

    let recorded = notifier.recorded().await;
    assert!(matches!(
        recorded.as_slice(),
        [AuctionNotification::AuctionWon { .. }]
    ));
}

/// Test 2: Only the seller may resolve bids
///
/// A stranger's accept is Forbidden and leaves the ticket, bids, and
/// purchases untouched.
#[tokio::test]
async fn test_accept_requires_seller() {
    let (store, notifier, service) = setup();
    let seller = UserId::new();
    let (ticket, low, high) = seed_two_bids(&store, seller).await;

    let result = service.accept_bid(high.id, UserId::new()).await;
    assert_eq!(result, Err(AuctionError::Forbidden));

    let untouched = store
        .ticket(ticket.id)
        .await
        .expect("Store should read")
        .expect("Ticket should exist");
    assert_eq!(untouched.status, TicketStatus::Available);
    assert!(untouched.buyer_id.is_none());
    for bid_id in [low.id, high.id] {
        let bid = store
            .bid(bid_id)
            .await
            .expect("Store should read")
            .expect("Bid should exist");
        assert_eq!(bid.status, BidStatus::Pending);
    }
    assert_eq!(store.purchase_rows(ticket.id).await, 0);
    assert!(notifier.recorded().await.is_empty());
}

/// Test 3: Accepting on a closed ticket fails
#[tokio::test]
async fn test_accept_on_closed_ticket() {
    let (store, _notifier, service) = setup();
    let seller = UserId::new();
    let mut ticket = open_auction(seller);
    ticket.status = TicketStatus::Expired;
    store.put_ticket(ticket.clone()).await;

    let bid = pending_bid(ticket.id, Money::from_rupees(600));
    store.put_bid(bid.clone()).await;

    let result = service.accept_bid(bid.id, seller).await;
    assert_eq!(result, Err(AuctionError::TicketUnavailable));
}

/// Test 4: A settled bid cannot be accepted again
#[tokio::test]
async fn test_accept_settled_bid() {
    let (store, _notifier, service) = setup();
    let seller = UserId::new();
    let ticket = open_auction(seller);
    store.put_ticket(ticket.clone()).await;

    let mut bid = pending_bid(ticket.id, Money::from_rupees(600));
    bid.status = BidStatus::Rejected;
    store.put_bid(bid.clone()).await;

    let result = service.accept_bid(bid.id, seller).await;
    assert_eq!(result, Err(AuctionError::AlreadyProcessed));
}

/// Test 5: Unknown bids report NotFound
#[tokio::test]
async fn test_accept_missing_bid() {
    let (_store, _notifier, service) = setup();

    let result = service.accept_bid(BidId::new(), UserId::new()).await;
    assert!(matches!(
        result,
        Err(AuctionError::NotFound { what: "bid", .. })
    ));
}

/// Test 6: Rejecting flips only the targeted bid
///
/// The other pending bid and the ticket itself are untouched, and the
/// bidder is notified.
#[tokio::test]
async fn test_reject_flips_single_bid() {
    let (store, notifier, service) = setup();
    let seller = UserId::new();
    let (ticket, low, high) = seed_two_bids(&store, seller).await;

    let rejected = service
        .reject_bid(low.id, seller)
        .await
        .expect("Reject should succeed");
    assert_eq!(rejected.status, BidStatus::Rejected);

    let other = store
        .bid(high.id)
        .await
        .expect("Store should read")
        .expect("Bid should exist");
    assert_eq!(other.status, BidStatus::Pending);

    let untouched = store
        .ticket(ticket.id)
        .await
        .expect("Store should read")
        .expect("Ticket should exist");
    assert_eq!(untouched.status, TicketStatus::Available);
    assert_eq!(store.purchase_rows(ticket.id).await, 0);

    let recorded = notifier.recorded().await;
    assert!(matches!(
        recorded.as_slice(),
        [AuctionNotification::BidRejected { .. }]
    ));
}

/// Test 7: Rejecting twice reports AlreadyProcessed
#[tokio::test]
async fn test_reject_twice() {
    let (store, _notifier, service) = setup();
    let seller = UserId::new();
    let ticket = open_auction(seller);
    store.put_ticket(ticket.clone()).await;
    let bid = pending_bid(ticket.id, Money::from_rupees(600));
    store.put_bid(bid.clone()).await;

    service
        .reject_bid(bid.id, seller)
        .await
        .expect("First reject should succeed");

    let again = service.reject_bid(bid.id, seller).await;
    assert_eq!(again, Err(AuctionError::AlreadyProcessed));
}

/// Test 8: Concurrent accepts admit exactly one winner
///
/// Two accepts race for the same ticket; one sale stands, the other
/// reports the ticket gone, and exactly one purchase exists.
#[tokio::test]
async fn test_concurrent_accepts_single_winner() {
    let (store, _notifier, service) = setup();
    let seller = UserId::new();
    let (ticket, low, high) = seed_two_bids(&store, seller).await;

    let (left, right) = tokio::join!(
        service.accept_bid(low.id, seller),
        service.accept_bid(high.id, seller),
    );

    let successes = [left.is_ok(), right.is_ok()];
    assert_eq!(successes.iter().filter(|ok| **ok).count(), 1);

    let failure = if left.is_ok() { right } else { left };
    assert!(matches!(
        failure,
        Err(AuctionError::TicketUnavailable | AuctionError::AlreadyProcessed)
    ));

    let sold = store
        .ticket(ticket.id)
        .await
        .expect("Store should read")
        .expect("Ticket should exist");
    assert_eq!(sold.status, TicketStatus::Sold);
    assert_eq!(store.purchase_rows(ticket.id).await, 1);
}
