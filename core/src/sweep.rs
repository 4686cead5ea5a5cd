//! Expiry sweep: closes auctions whose end time has passed.
//!
//! Each candidate is closed independently; one failure never aborts the
//! batch. Tickets that lose the closing race to a concurrent manual accept
//! are counted as skipped, not failed.

use crate::error::{AuctionError, Result};
use crate::ledger::{LedgerError, LedgerStore};
use crate::metrics::{
    record_auction_expired, record_auction_sold, record_sweep_failure, record_sweep_run,
};
use crate::notify::{AuctionNotification, NotificationPort, publish_best_effort};
use crate::types::Ticket;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Outcome counts for one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Candidates examined
    pub processed: usize,
    /// Auctions sold to their highest pending bid
    pub sold: usize,
    /// Auctions expired with no bids
    pub expired: usize,
    /// Candidates another closer finished first
    pub skipped: usize,
    /// Candidates that failed with a store error
    pub failed: usize,
}

enum Closed {
    Sold,
    Expired,
    Skipped,
}

/// Closes expired auctions: sells to the highest pending bid, or expires
/// the listing when no bids exist.
pub struct ExpirySweepService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn NotificationPort>,
    batch_limit: u32,
}

impl ExpirySweepService {
    /// Create a new expiry sweep service
    pub fn new(
        store: Arc<dyn LedgerStore>,
        notifier: Arc<dyn NotificationPort>,
        batch_limit: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            batch_limit,
        }
    }

    /// Close every auction whose end time has passed, up to the batch
    /// limit. The service is stateless between calls and takes `now`
    /// explicitly.
    ///
    /// # Errors
    ///
    /// Returns `Store` only when the candidate query itself fails;
    /// per-ticket failures are logged, counted in the report, and do not
    /// abort the pass.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_expired_auctions(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let started = Instant::now();
        let candidates = self
            .store
            .expired_auction_candidates(now, self.batch_limit)
            .await
            .map_err(AuctionError::from)?;

        let mut report = SweepReport::default();
        for ticket in candidates {
            report.processed += 1;
            match self.close_one(&ticket).await {
                Ok(Closed::Sold) => report.sold += 1,
                Ok(Closed::Expired) => report.expired += 1,
                Ok(Closed::Skipped) => report.skipped += 1,
                Err(error) => {
                    report.failed += 1;
                    record_sweep_failure();
                    tracing::warn!(
                        ticket_id = %ticket.id,
                        %error,
                        "Failed to close expired auction"
                    );
                }
            }
        }

        record_sweep_run(started.elapsed().as_secs_f64());
        tracing::info!(
            processed = report.processed,
            sold = report.sold,
            expired = report.expired,
            skipped = report.skipped,
            failed = report.failed,
            "Expiry sweep completed"
        );

        Ok(report)
    }

    async fn close_one(&self, ticket: &Ticket) -> Result<Closed> {
        match self.store.highest_pending_bid(ticket.id).await? {
            Some(winner) => {
                match self
                    .store
                    .finalize_sale(ticket.id, winner.id, winner.bidder_id, winner.amount)
                    .await
                {
                    Ok(outcome) => {
                        record_auction_sold("sweep", outcome.purchase.amount.cents());
                        tracing::info!(
                            ticket_id = %ticket.id,
                            buyer_id = %winner.bidder_id,
                            amount = %winner.amount,
                            "Expired auction sold to highest bid"
                        );

                        publish_best_effort(
                            self.notifier.as_ref(),
                            &AuctionNotification::AuctionEnded {
                                ticket_id: ticket.id,
                                event_id: ticket.event_id,
                                winning_bid_id: outcome.winning_bid.id,
                                buyer_id: winner.bidder_id,
                                amount: winner.amount,
                            },
                        )
                        .await;

                        Ok(Closed::Sold)
                    }
                    // A racing accept already closed the ticket, or moved
                    // the winning bid out of Pending. Its sale stands.
                    Err(LedgerError::TicketUnavailable | LedgerError::AlreadyProcessed) => {
                        tracing::debug!(ticket_id = %ticket.id, "Candidate closed concurrently");
                        Ok(Closed::Skipped)
                    }
                    Err(error) => Err(error.into()),
                }
            }
            None => {
                if self.store.expire_ticket(ticket.id).await? {
                    record_auction_expired();
                    tracing::info!(ticket_id = %ticket.id, "Auction expired with no bids");

                    publish_best_effort(
                        self.notifier.as_ref(),
                        &AuctionNotification::AuctionExpired {
                            ticket_id: ticket.id,
                            event_id: ticket.event_id,
                        },
                    )
                    .await;

                    Ok(Closed::Expired)
                } else {
                    tracing::debug!(ticket_id = %ticket.id, "Candidate closed concurrently");
                    Ok(Closed::Skipped)
                }
            }
        }
    }
}
