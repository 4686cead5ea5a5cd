//! # Gavel Core
//!
//! Auction and bid lifecycle engine for a ticket resale marketplace.
//!
//! This crate owns the complete lifecycle of an auction listing: bids are
//! placed and raised against a validated minimum, sellers accept or decline
//! offers, and a periodic sweep closes auctions whose end time has passed.
//!
//! ## Core Concepts
//!
//! - **Ledger Store**: Persistence port ([`ledger::LedgerStore`]) with
//!   named atomic operations; conditional updates make concurrent closers
//!   safe.
//! - **Validator**: Pure bid validation ([`validator::validate_bid`]) with
//!   one minimum-bid policy shared by placement and the status query.
//! - **Services**: Placement, resolution, and sweep orchestrate the
//!   validator and the store, and publish notifications after commit.
//! - **Ports**: The store, clock, and notification channel are injected as
//!   `Arc<dyn Trait>` so every service is deterministic under test.
//!
//! ## Example
//!
//! ```ignore
//! use gavel_core::clock::SystemClock;
//! use gavel_core::notify::LoggingNotifier;
//! use gavel_core::placement::BidPlacementService;
//! use gavel_core::types::Money;
//!
//! let service = BidPlacementService::new(store, LoggingNotifier::shared(), SystemClock::shared());
//! let placed = service.place_bid(ticket_id, bidder_id, Money::from_rupees(550)).await?;
//! println!("{}", placed.message());
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod notify;
pub mod placement;
pub mod resolution;
pub mod scheduler;
pub mod sweep;
pub mod telemetry;
pub mod types;
pub mod validator;

pub use clock::{Clock, SystemClock};
pub use error::{AuctionError, Result};
pub use ledger::{BidPlacement, LedgerError, LedgerStore, SaleOutcome};
pub use notify::{AuctionNotification, LoggingNotifier, NotificationPort};
pub use placement::{BidOutcome, BidPlacementService, PlacedBid};
pub use resolution::OfferResolutionService;
pub use scheduler::SweepScheduler;
pub use sweep::{ExpirySweepService, SweepReport};
pub use types::{
    AuctionStatus, Bid, BidId, BidStatus, EventId, ListingType, Money, NewTicket, Purchase,
    PurchaseId, PurchaseStatus, Ticket, TicketId, TicketStatus, UserId,
};
