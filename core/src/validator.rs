//! Pure bid validation.
//!
//! Every placement decision flows through [`validate_bid`], and the status
//! query advertises its next minimum through the same [`minimum_bid`]
//! policy, so there is exactly one source of truth for what a valid bid is.

use crate::error::AuctionError;
use crate::types::{Bid, Money, Ticket, TicketStatus, UserId};
use chrono::{DateTime, Utc};

/// Percentage a new bid must clear above the current highest.
pub const MIN_INCREMENT_PERCENT: u32 = 10;

/// Opening minimum when no bid exists yet.
pub const OPENING_MINIMUM: Money = Money::from_cents(1);

/// What an approved bid carries back to the placement service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidApproval {
    /// The minimum the bid had to meet
    pub minimum: Money,
    /// The highest bid amount the validation saw (the CAS expectation for
    /// the subsequent write)
    pub highest: Option<Money>,
}

/// The minimum amount the next bid must meet.
///
/// 10% above the current highest, rounded up, with an opening floor of one
/// paisa when no bid exists. Saturates at `u64::MAX` paise rather than
/// overflowing.
#[must_use]
pub fn minimum_bid(highest: Option<Money>) -> Money {
    match highest {
        Some(amount) => {
            let raised = amount
                .checked_apply_markup(MIN_INCREMENT_PERCENT)
                .unwrap_or(Money::from_cents(u64::MAX));
            raised.max(OPENING_MINIMUM)
        }
        None => OPENING_MINIMUM,
    }
}

/// Validate a prospective bid against a ticket and its current highest bid.
///
/// Checks run in a fixed order and the first failure wins: availability,
/// listing type, self-bid, close time, then amount. The caller resolves
/// ticket existence before calling.
///
/// # Errors
///
/// Returns the first failing check as an [`AuctionError`].
pub fn validate_bid(
    ticket: &Ticket,
    highest: Option<&Bid>,
    bidder_id: UserId,
    amount: Money,
    now: DateTime<Utc>,
) -> Result<BidApproval, AuctionError> {
    if ticket.status != TicketStatus::Available {
        return Err(AuctionError::NotAvailable);
    }

    if !ticket.is_auction() {
        return Err(AuctionError::NotAuction);
    }

    if bidder_id == ticket.seller_id {
        return Err(AuctionError::SelfBid);
    }

    if ticket.has_ended(now) {
        return Err(AuctionError::AuctionEnded);
    }

    let highest_amount = highest.map(|bid| bid.amount);
    let minimum = minimum_bid(highest_amount);
    if amount < minimum {
        return Err(AuctionError::BelowMinimum { minimum });
    }

    Ok(BidApproval {
        minimum,
        highest: highest_amount,
    })
}
