//! Domain types for the auction engine.
//!
//! This module contains the value objects and entities of the resale
//! marketplace: tickets, bids, purchases, and the money value object used
//! for all amounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event in the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random `TicketId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a bid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidId(Uuid);

impl BidId {
    /// Creates a new random `BidId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BidId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BidId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a purchase record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseId(Uuid);

impl PurchaseId {
    /// Creates a new random `PurchaseId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PurchaseId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PurchaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user (seller or bidder)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (paise-based to avoid floating point errors)
// ============================================================================

/// Represents money in paise (hundredths of a rupee) to avoid
/// floating-point arithmetic errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from paise
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole rupees
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (rupees * 100 > `u64::MAX`).
    /// Use `checked_from_rupees` for non-panicking conversion.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_rupees(rupees: u64) -> Self {
        match rupees.checked_mul(100) {
            Some(cents) => Self(cents),
            None => panic!("Money::from_rupees overflow"),
        }
    }

    /// Creates a `Money` value from whole rupees with overflow checking
    #[must_use]
    pub const fn checked_from_rupees(rupees: u64) -> Option<Self> {
        match rupees.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in paise
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole rupees (rounded down)
    #[must_use]
    pub const fn rupees(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Applies a percentage markup with overflow checking.
    ///
    /// The markup is rounded up, so any non-zero amount with a non-zero
    /// percentage yields a result strictly greater than the original.
    #[must_use]
    pub const fn checked_apply_markup(self, percent: u32) -> Option<Self> {
        let markup = match self.0.checked_mul(percent as u64) {
            Some(product) => product.div_ceil(100),
            None => return None,
        };

        match self.0.checked_add(markup) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}.{:02}", self.rupees(), self.0 % 100)
    }
}

// ============================================================================
// Domain Entities
// ============================================================================

/// How a ticket is being sold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    /// Fixed-price listing, bought outright
    DirectSale,
    /// Auction listing, sold to a winning bid
    Auction,
}

/// Ticket lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Listed and open for purchase or bidding
    Available,
    /// Sold to a buyer (terminal)
    Sold,
    /// Held by an external flow; this engine never produces or consumes it
    Reserved,
    /// Auction ended with no bids (terminal)
    Expired,
}

/// Bid lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Standing offer, may still be updated by the bidder
    Pending,
    /// Won the auction (terminal)
    Accepted,
    /// Declined by the seller or lost the auction (terminal)
    Rejected,
}

/// Purchase record status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Sale settled
    Completed,
}

/// A ticket listing on the resale marketplace.
///
/// Ownership moves by reassigning `seller_id`/`buyer_id`; rows are never
/// duplicated. `status == Sold` holds exactly when `buyer_id` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket identifier
    pub id: TicketId,
    /// Event this ticket admits to
    pub event_id: EventId,
    /// Current seller
    pub seller_id: UserId,
    /// Buyer once sold
    pub buyer_id: Option<UserId>,
    /// Starting price (auction) or fixed price (direct sale)
    pub price: Money,
    /// How the ticket is being sold
    pub listing_type: ListingType,
    /// Current lifecycle status
    pub status: TicketStatus,
    /// Auction close time (None for direct sales)
    pub end_time: Option<DateTime<Utc>>,
    /// When the listing was created
    pub created_at: DateTime<Utc>,
    /// When the listing was last modified
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Creates a new available `Ticket`
    #[must_use]
    pub const fn new(
        id: TicketId,
        event_id: EventId,
        seller_id: UserId,
        price: Money,
        listing_type: ListingType,
        end_time: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_id,
            seller_id,
            buyer_id: None,
            price,
            listing_type,
            status: TicketStatus::Available,
            end_time,
            created_at,
            updated_at: created_at,
        }
    }

    /// Checks if this is an auction listing
    #[must_use]
    pub fn is_auction(&self) -> bool {
        self.listing_type == ListingType::Auction
    }

    /// Checks if the auction close time has passed
    #[must_use]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        match self.end_time {
            Some(end) => now > end,
            None => false,
        }
    }
}

/// Fields needed to create a new ticket listing.
///
/// The store assigns the identifier and timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    /// Event this ticket admits to
    pub event_id: EventId,
    /// Listing seller
    pub seller_id: UserId,
    /// Starting price (auction) or fixed price (direct sale)
    pub price: Money,
    /// How the ticket is being sold
    pub listing_type: ListingType,
    /// Auction close time (None for direct sales)
    pub end_time: Option<DateTime<Utc>>,
}

/// A bid on an auction listing.
///
/// Each (ticket, bidder) pair holds at most one Pending bid; a repeat bid
/// updates the standing row rather than inserting a new one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Unique bid identifier
    pub id: BidId,
    /// Ticket being bid on
    pub ticket_id: TicketId,
    /// User making the bid
    pub bidder_id: UserId,
    /// Offered amount
    pub amount: Money,
    /// Current bid status
    pub status: BidStatus,
    /// When the bid was first placed
    pub created_at: DateTime<Utc>,
    /// When the bid was last updated
    pub updated_at: DateTime<Utc>,
}

impl Bid {
    /// Creates a new pending `Bid`
    #[must_use]
    pub const fn new(
        id: BidId,
        ticket_id: TicketId,
        bidder_id: UserId,
        amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            ticket_id,
            bidder_id,
            amount,
            status: BidStatus::Pending,
            created_at,
            updated_at: created_at,
        }
    }
}

/// The purchase record created when a ticket sells.
///
/// At most one purchase exists per ticket; closing an already-purchased
/// ticket updates the existing record in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique purchase identifier
    pub id: PurchaseId,
    /// Ticket that was sold
    pub ticket_id: TicketId,
    /// Buyer of the ticket
    pub buyer_id: UserId,
    /// Final sale amount
    pub amount: Money,
    /// Purchase status
    pub status: PurchaseStatus,
    /// When the purchase was created
    pub created_at: DateTime<Utc>,
    /// When the purchase was last updated
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Auction Status View
// ============================================================================

/// Point-in-time summary of an auction, computed from one joined read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionStatus {
    /// Ticket being summarized
    pub ticket_id: TicketId,
    /// Current ticket status
    pub status: TicketStatus,
    /// Starting price of the listing
    pub starting_price: Money,
    /// Highest bid amount so far, if any
    pub current_highest_bid: Option<Money>,
    /// Minimum amount the next bid must meet
    pub minimum_next_bid: Money,
    /// Number of bids placed on this ticket
    pub total_bids: usize,
    /// Whether the auction close time has passed
    pub is_ended: bool,
    /// Auction close time, if set
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds until close (None once ended or when no close time is set)
    pub time_left_secs: Option<i64>,
}
