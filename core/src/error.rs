//! Error types for auction operations.

use crate::ledger::LedgerError;
use crate::types::Money;
use thiserror::Error;

/// Result type alias for auction operations.
pub type Result<T> = std::result::Result<T, AuctionError>;

/// Error taxonomy for the auction engine.
///
/// Validation failures are returned values, never panics. Each variant maps
/// to a stable machine-readable code via [`AuctionError::code`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuctionError {
    // ═══════════════════════════════════════════════════════════
    // Lookup Errors
    // ═══════════════════════════════════════════════════════════

    /// The referenced entity does not exist.
    #[error("{what} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up ("ticket", "bid")
        what: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Bid Validation Errors
    // ═══════════════════════════════════════════════════════════

    /// The ticket is not open for bidding.
    #[error("Ticket is not available for bidding")]
    NotAvailable,

    /// The ticket is a direct sale, not an auction.
    #[error("This ticket is not listed as an auction")]
    NotAuction,

    /// The seller attempted to bid on their own listing.
    #[error("You cannot bid on your own ticket")]
    SelfBid,

    /// The auction close time has passed.
    #[error("This auction has ended")]
    AuctionEnded,

    /// The offered amount is below the required minimum.
    #[error("Bid must be at least {minimum} (10% higher than current highest bid)")]
    BelowMinimum {
        /// Minimum amount the bid must meet
        minimum: Money,
    },

    // ═══════════════════════════════════════════════════════════
    // Resolution Errors
    // ═══════════════════════════════════════════════════════════

    /// The acting user is not the seller of the ticket.
    #[error("Only the seller can resolve bids on this ticket")]
    Forbidden,

    /// The bid has already reached a terminal status.
    #[error("This bid has already been processed")]
    AlreadyProcessed,

    /// The ticket was closed by another operation.
    #[error("Ticket is no longer available")]
    TicketUnavailable,

    /// A concurrent writer invalidated this operation; the caller may retry.
    #[error("Concurrent update detected, please retry")]
    Conflict,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The ledger store failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl AuctionError {
    /// Returns a stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NotAvailable => "NOT_AVAILABLE",
            Self::NotAuction => "NOT_AUCTION",
            Self::SelfBid => "SELF_BID",
            Self::AuctionEnded => "AUCTION_ENDED",
            Self::BelowMinimum { .. } => "BELOW_MINIMUM",
            Self::Forbidden => "FORBIDDEN",
            Self::AlreadyProcessed => "ALREADY_PROCESSED",
            Self::TicketUnavailable => "TICKET_UNAVAILABLE",
            Self::Conflict => "CONFLICT",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns `true` if this error is due to invalid user input rather
    /// than a system fault.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Conflict)
    }
}

impl From<LedgerError> for AuctionError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Conflict => Self::Conflict,
            LedgerError::TicketUnavailable => Self::TicketUnavailable,
            LedgerError::AlreadyProcessed => Self::AlreadyProcessed,
            LedgerError::Backend(message) => Self::Store(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            AuctionError::BelowMinimum {
                minimum: Money::from_rupees(110)
            }
            .code(),
            "BELOW_MINIMUM"
        );
        assert_eq!(AuctionError::SelfBid.code(), "SELF_BID");
        assert_eq!(AuctionError::Store(String::new()).code(), "STORE_ERROR");
    }

    #[test]
    fn test_below_minimum_message_names_amount() {
        let error = AuctionError::BelowMinimum {
            minimum: Money::from_rupees(110),
        };
        assert_eq!(
            error.to_string(),
            "Bid must be at least ₹110.00 (10% higher than current highest bid)"
        );
    }

    #[test]
    fn test_store_errors_are_not_user_errors() {
        assert!(AuctionError::SelfBid.is_user_error());
        assert!(!AuctionError::Store("boom".to_string()).is_user_error());
        assert!(!AuctionError::Conflict.is_user_error());
    }
}
