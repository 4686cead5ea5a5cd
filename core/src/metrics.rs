//! Business metrics for the auction engine.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `gavel_bids_total{outcome}` - Bids placed, by outcome (placed, updated)
//! - `gavel_bids_rejected_total` - Bids declined by sellers
//! - `gavel_auctions_closed_total{path, outcome}` - Tickets closed, by
//!   closing path (accept, sweep) and outcome (sold, expired)
//! - `gavel_sale_revenue_cents_total` - Revenue from completed sales in paise
//! - `gavel_sweep_failures_total` - Per-ticket failures during sweeps
//! - `gavel_sweep_runs_total` - Sweep passes executed
//!
//! ## Histograms
//! - `gavel_sweep_duration_seconds` - Wall time of a sweep pass

use metrics::{describe_counter, describe_histogram};

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics
/// are recorded.
pub fn register_auction_metrics() {
    describe_counter!(
        "gavel_bids_total",
        "Total number of bids placed, by outcome (placed, updated)"
    );
    describe_counter!(
        "gavel_bids_rejected_total",
        "Total number of bids declined by sellers"
    );
    describe_counter!(
        "gavel_auctions_closed_total",
        "Total tickets closed, by closing path (accept, sweep) and outcome (sold, expired)"
    );
    describe_counter!(
        "gavel_sale_revenue_cents_total",
        "Total revenue from completed sales in paise"
    );
    describe_counter!(
        "gavel_sweep_failures_total",
        "Total per-ticket failures during expiry sweeps"
    );
    describe_counter!("gavel_sweep_runs_total", "Total sweep passes executed");
    describe_histogram!(
        "gavel_sweep_duration_seconds",
        "Wall time taken by a sweep pass"
    );

    tracing::info!("Auction metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a bid placed or raised.
pub fn record_bid_placed(updated: bool) {
    let outcome = if updated { "updated" } else { "placed" };
    metrics::counter!("gavel_bids_total", "outcome" => outcome).increment(1);
}

/// Record a bid declined by the seller.
pub fn record_bid_rejected() {
    metrics::counter!("gavel_bids_rejected_total").increment(1);
}

/// Record a ticket sold, with the closing path ("accept" or "sweep").
pub fn record_auction_sold(path: &'static str, amount_cents: u64) {
    metrics::counter!("gavel_auctions_closed_total", "path" => path, "outcome" => "sold")
        .increment(1);
    metrics::counter!("gavel_sale_revenue_cents_total").increment(amount_cents);
}

/// Record an auction that expired with no bids.
pub fn record_auction_expired() {
    metrics::counter!("gavel_auctions_closed_total", "path" => "sweep", "outcome" => "expired")
        .increment(1);
}

/// Record a per-ticket failure during a sweep pass.
pub fn record_sweep_failure() {
    metrics::counter!("gavel_sweep_failures_total").increment(1);
}

/// Record a completed sweep pass and its duration.
pub fn record_sweep_run(duration_secs: f64) {
    metrics::counter!("gavel_sweep_runs_total").increment(1);
    metrics::histogram!("gavel_sweep_duration_seconds").record(duration_secs);
}
