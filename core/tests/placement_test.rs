//! Bid placement integration tests.
//!
//! Exercises the placement service against the in-memory ledger store:
//! minimum-bid enforcement, the one-pending-bid-per-bidder rule, and the
//! full rejection order.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::Duration;
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::notify::AuctionNotification;
use gavel_core::placement::{BidOutcome, BidPlacementService};
use gavel_core::types::{
    EventId, ListingType, Money, Ticket, TicketId, TicketStatus, UserId,
};
use gavel_testing::{InMemoryLedgerStore, RecordingNotifier, test_clock};
use std::sync::Arc;

fn setup() -> (
    Arc<InMemoryLedgerStore>,
    Arc<RecordingNotifier>,
    BidPlacementService,
) {
    let clock: Arc<dyn Clock> = Arc::new(test_clock());
    let store = Arc::new(InMemoryLedgerStore::new(clock.clone()));
    let notifier = Arc::new(RecordingNotifier::new());
    let service = BidPlacementService::new(store.clone(), notifier.clone(), clock);
    (store, notifier, service)
}

/// An auction listing that closes 24 hours after the test clock's now.
fn open_auction(seller: UserId, price: Money) -> Ticket {
    let now = test_clock().now();
    Ticket::new(
        TicketId::new(),
        EventId::new(),
        seller,
        price,
        ListingType::Auction,
        Some(now + Duration::hours(24)),
        now,
    )
}

/// Test 1: First bid on an empty book
///
/// With no prior bids any positive amount is accepted, and the
/// confirmation reports a fresh placement.
#[tokio::test]
async fn test_first_bid_places_new_row() {
    let (store, notifier, service) = setup();
    let ticket = open_auction(UserId::new(), Money::from_rupees(500));
    store.put_ticket(ticket.clone()).await;

    let bidder = UserId::new();
    let placed = service
        .place_bid(ticket.id, bidder, Money::from_rupees(550))
        .await
        .expect("First bid should place");

    assert_eq!(placed.outcome, BidOutcome::Placed);
    assert_eq!(placed.bid.amount, Money::from_rupees(550));
    assert_eq!(placed.message(), "Bid placed successfully");
    assert_eq!(store.bid_rows(ticket.id, bidder).await, 1);

    let recorded = notifier.recorded().await;
    assert!(matches!(
        recorded.as_slice(),
        [AuctionNotification::BidPlaced { updated: false, .. }]
    ));
}

/// Test 2: Raising a standing bid updates in place
///
/// A second bid from the same bidder raises the existing row; the book
/// never holds two pending bids for one bidder.
#[tokio::test]
async fn test_raise_updates_standing_bid() {
    let (store, _notifier, service) = setup();
    let ticket = open_auction(UserId::new(), Money::from_rupees(500));
    store.put_ticket(ticket.clone()).await;

    let bidder = UserId::new();
    let first = service
        .place_bid(ticket.id, bidder, Money::from_rupees(550))
        .await
        .expect("First bid should place");

    let raised = service
        .place_bid(ticket.id, bidder, Money::from_rupees(700))
        .await
        .expect("Raise should place");

    assert_eq!(raised.outcome, BidOutcome::Updated);
    assert_eq!(raised.bid.id, first.bid.id);
    assert_eq!(raised.bid.amount, Money::from_rupees(700));
    assert_eq!(raised.message(), "Bid updated successfully");
    assert_eq!(store.bid_rows(ticket.id, bidder).await, 1);
}

/// Test 3: Minimum bid enforcement
///
/// With a highest bid of 100 rupees the next bid must reach 110; an offer
/// of 105 is rejected and the error names the exact minimum.
#[tokio::test]
async fn test_below_minimum_rejected_with_exact_minimum() {
    let (store, _notifier, service) = setup();
    let ticket = open_auction(UserId::new(), Money::from_rupees(50));
    store.put_ticket(ticket.clone()).await;

    service
        .place_bid(ticket.id, UserId::new(), Money::from_rupees(100))
        .await
        .expect("Opening bid should place");

    let low = service
        .place_bid(ticket.id, UserId::new(), Money::from_rupees(105))
        .await;
    assert_eq!(
        low,
        Err(AuctionError::BelowMinimum {
            minimum: Money::from_rupees(110)
        })
    );

    let exact = service
        .place_bid(ticket.id, UserId::new(), Money::from_rupees(110))
        .await;
    assert!(exact.is_ok());
}

/// Test 4: Sellers cannot bid on their own listings
#[tokio::test]
async fn test_self_bid_rejected() {
    let (store, _notifier, service) = setup();
    let seller = UserId::new();
    let ticket = open_auction(seller, Money::from_rupees(500));
    store.put_ticket(ticket.clone()).await;

    let result = service
        .place_bid(ticket.id, seller, Money::from_rupees(600))
        .await;
    assert_eq!(result, Err(AuctionError::SelfBid));
}

/// Test 5: Bids after the close time are rejected
#[tokio::test]
async fn test_ended_auction_rejects_bids() {
    let (store, _notifier, service) = setup();
    let now = test_clock().now();
    let mut ticket = open_auction(UserId::new(), Money::from_rupees(500));
    ticket.end_time = Some(now - Duration::minutes(1));
    store.put_ticket(ticket.clone()).await;

    let result = service
        .place_bid(ticket.id, UserId::new(), Money::from_rupees(600))
        .await;
    assert_eq!(result, Err(AuctionError::AuctionEnded));
}

/// Test 6: Unknown tickets report NotFound
#[tokio::test]
async fn test_missing_ticket_not_found() {
    let (_store, _notifier, service) = setup();

    let result = service
        .place_bid(TicketId::new(), UserId::new(), Money::from_rupees(600))
        .await;
    assert!(matches!(
        result,
        Err(AuctionError::NotFound { what: "ticket", .. })
    ));
}

/// Test 7: Direct sale listings do not take bids
#[tokio::test]
async fn test_direct_sale_rejects_bids() {
    let (store, _notifier, service) = setup();
    let now = test_clock().now();
    let ticket = Ticket::new(
        TicketId::new(),
        EventId::new(),
        UserId::new(),
        Money::from_rupees(500),
        ListingType::DirectSale,
        None,
        now,
    );
    store.put_ticket(ticket.clone()).await;

    let result = service
        .place_bid(ticket.id, UserId::new(), Money::from_rupees(600))
        .await;
    assert_eq!(result, Err(AuctionError::NotAuction));
}

/// Test 8: Availability outranks every other check
///
/// A sold auction whose close time has also passed reports NotAvailable,
/// not AuctionEnded.
#[tokio::test]
async fn test_sold_ticket_not_available() {
    let (store, _notifier, service) = setup();
    let now = test_clock().now();
    let mut ticket = open_auction(UserId::new(), Money::from_rupees(500));
    ticket.status = TicketStatus::Sold;
    ticket.end_time = Some(now - Duration::minutes(1));
    store.put_ticket(ticket.clone()).await;

    let result = service
        .place_bid(ticket.id, UserId::new(), Money::from_rupees(600))
        .await;
    assert_eq!(result, Err(AuctionError::NotAvailable));
}

/// Test 9: Status summary for an open auction
///
/// The advertised next minimum follows the same policy placement
/// enforces, and the countdown reflects the fixed clock.
#[tokio::test]
async fn test_status_reports_minimum_and_countdown() {
    let (store, _notifier, service) = setup();
    let ticket = open_auction(UserId::new(), Money::from_rupees(500));
    store.put_ticket(ticket.clone()).await;

    let empty = service
        .auction_status(ticket.id)
        .await
        .expect("Status should load");
    assert_eq!(empty.current_highest_bid, None);
    assert_eq!(empty.minimum_next_bid, Money::from_cents(1));
    assert_eq!(empty.total_bids, 0);
    assert!(!empty.is_ended);
    assert_eq!(empty.time_left_secs, Some(24 * 3600));

    service
        .place_bid(ticket.id, UserId::new(), Money::from_rupees(550))
        .await
        .expect("Bid should place");

    let status = service
        .auction_status(ticket.id)
        .await
        .expect("Status should load");
    assert_eq!(status.current_highest_bid, Some(Money::from_rupees(550)));
    assert_eq!(status.minimum_next_bid, Money::from_rupees(605));
    assert_eq!(status.total_bids, 1);
}

/// Test 10: Status summary after the close time
#[tokio::test]
async fn test_status_after_close_time() {
    let (store, _notifier, service) = setup();
    let now = test_clock().now();
    let mut ticket = open_auction(UserId::new(), Money::from_rupees(500));
    ticket.end_time = Some(now - Duration::minutes(5));
    store.put_ticket(ticket.clone()).await;

    let status = service
        .auction_status(ticket.id)
        .await
        .expect("Status should load");
    assert!(status.is_ended);
    assert_eq!(status.time_left_secs, None);
}

/// Test 11: Concurrent bidders never corrupt the book
///
/// Whatever order the two placements land in, each bidder holds at most
/// one row and the losing validation names the policy minimum.
#[tokio::test]
async fn test_concurrent_bids_keep_book_consistent() {
    let (store, _notifier, service) = setup();
    let ticket = open_auction(UserId::new(), Money::from_rupees(500));
    store.put_ticket(ticket.clone()).await;

    let bidder_a = UserId::new();
    let bidder_b = UserId::new();
    let (left, right) = tokio::join!(
        service.place_bid(ticket.id, bidder_a, Money::from_rupees(600)),
        service.place_bid(ticket.id, bidder_b, Money::from_rupees(700)),
    );

    assert!(left.is_ok() || right.is_ok());
    assert!(store.bid_rows(ticket.id, bidder_a).await <= 1);
    assert!(store.bid_rows(ticket.id, bidder_b).await <= 1);

    for result in [left, right] {
        if let Err(error) = result {
            assert!(matches!(error, AuctionError::BelowMinimum { .. }));
        }
    }
}
