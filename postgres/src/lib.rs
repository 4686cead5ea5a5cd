//! `PostgreSQL` ledger store for the auction engine.
//!
//! Implements [`LedgerStore`] on top of a `PgPool`. The two multi-row
//! writes, `upsert_pending_bid` and `finalize_sale`, run inside explicit
//! transactions that first take a `FOR UPDATE` lock on the ticket row, so
//! every writer on a ticket serializes on the same lock and conditional
//! updates decide races deterministically.
//!
//! # Example
//!
//! ```ignore
//! use gavel_core::config::Config;
//! use gavel_postgres::PostgresLedgerStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load();
//!     let store = PostgresLedgerStore::connect(&config.postgres).await?;
//!     store.ensure_schema().await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gavel_core::ledger::{BidPlacement, LedgerError, LedgerStore, SaleOutcome};
use gavel_core::types::{
    Bid, BidId, BidStatus, EventId, ListingType, Money, NewTicket, Purchase, PurchaseId,
    PurchaseStatus, Ticket, TicketId, TicketStatus, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

pub use gavel_core::config::PostgresConfig;

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    event_id: Uuid,
    seller_id: Uuid,
    buyer_id: Option<Uuid>,
    price_cents: i64,
    listing_type: String,
    status: String,
    end_time: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BidRow {
    id: Uuid,
    ticket_id: Uuid,
    bidder_id: Uuid,
    amount_cents: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    ticket_id: Uuid,
    buyer_id: Uuid,
    amount_cents: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// ============================================================================
// Column Mapping
// ============================================================================

const TICKET_COLUMNS: &str =
    "id, event_id, seller_id, buyer_id, price_cents, listing_type, status, \
     end_time, created_at, updated_at";

const BID_COLUMNS: &str =
    "id, ticket_id, bidder_id, amount_cents, status, created_at, updated_at";

const PURCHASE_COLUMNS: &str =
    "id, ticket_id, buyer_id, amount_cents, status, created_at, updated_at";

fn money_from_db(cents: i64) -> Result<Money, LedgerError> {
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| LedgerError::Backend(format!("Negative amount in database: {cents}")))
}

fn money_to_db(amount: Money) -> Result<i64, LedgerError> {
    i64::try_from(amount.cents()).map_err(|_| {
        LedgerError::Backend(format!("Amount {amount} exceeds i64::MAX cents (storage limit)"))
    })
}

const fn ticket_status_str(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Available => "AVAILABLE",
        TicketStatus::Sold => "SOLD",
        TicketStatus::Reserved => "RESERVED",
        TicketStatus::Expired => "EXPIRED",
    }
}

fn ticket_status_from_str(value: &str) -> Result<TicketStatus, LedgerError> {
    match value {
        "AVAILABLE" => Ok(TicketStatus::Available),
        "SOLD" => Ok(TicketStatus::Sold),
        "RESERVED" => Ok(TicketStatus::Reserved),
        "EXPIRED" => Ok(TicketStatus::Expired),
        other => Err(LedgerError::Backend(format!(
            "Unknown ticket status in database: {other}"
        ))),
    }
}

const fn listing_type_str(listing_type: ListingType) -> &'static str {
    match listing_type {
        ListingType::DirectSale => "DIRECT_SALE",
        ListingType::Auction => "AUCTION",
    }
}

fn listing_type_from_str(value: &str) -> Result<ListingType, LedgerError> {
    match value {
        "DIRECT_SALE" => Ok(ListingType::DirectSale),
        "AUCTION" => Ok(ListingType::Auction),
        other => Err(LedgerError::Backend(format!(
            "Unknown listing type in database: {other}"
        ))),
    }
}

fn bid_status_from_str(value: &str) -> Result<BidStatus, LedgerError> {
    match value {
        "PENDING" => Ok(BidStatus::Pending),
        "ACCEPTED" => Ok(BidStatus::Accepted),
        "REJECTED" => Ok(BidStatus::Rejected),
        other => Err(LedgerError::Backend(format!(
            "Unknown bid status in database: {other}"
        ))),
    }
}

fn purchase_status_from_str(value: &str) -> Result<PurchaseStatus, LedgerError> {
    match value {
        "COMPLETED" => Ok(PurchaseStatus::Completed),
        other => Err(LedgerError::Backend(format!(
            "Unknown purchase status in database: {other}"
        ))),
    }
}

impl TryFrom<TicketRow> for Ticket {
    type Error = LedgerError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TicketId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            seller_id: UserId::from_uuid(row.seller_id),
            buyer_id: row.buyer_id.map(UserId::from_uuid),
            price: money_from_db(row.price_cents)?,
            listing_type: listing_type_from_str(&row.listing_type)?,
            status: ticket_status_from_str(&row.status)?,
            end_time: row.end_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<BidRow> for Bid {
    type Error = LedgerError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BidId::from_uuid(row.id),
            ticket_id: TicketId::from_uuid(row.ticket_id),
            bidder_id: UserId::from_uuid(row.bidder_id),
            amount: money_from_db(row.amount_cents)?,
            status: bid_status_from_str(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = LedgerError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PurchaseId::from_uuid(row.id),
            ticket_id: TicketId::from_uuid(row.ticket_id),
            buyer_id: UserId::from_uuid(row.buyer_id),
            amount: money_from_db(row.amount_cents)?,
            status: purchase_status_from_str(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn backend(context: &str, error: sqlx::Error) -> LedgerError {
    LedgerError::Backend(format!("Failed to {context}: {error}"))
}

// ============================================================================
// Store
// ============================================================================

/// `PostgreSQL`-backed implementation of [`LedgerStore`].
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] if the connection cannot be
    /// established within the configured timeout.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| backend("connect to postgres", e))?;

        Ok(Self::from_pool(pool))
    }

    /// Access the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tickets, bids, and purchases tables if they do not exist.
    ///
    /// Idempotent. The partial unique index on bids enforces at most one
    /// pending bid per bidder per ticket at the storage layer, backing the
    /// upsert semantics of `upsert_pending_bid`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] if any statement fails.
    pub async fn ensure_schema(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tickets (
                id UUID PRIMARY KEY,
                event_id UUID NOT NULL,
                seller_id UUID NOT NULL,
                buyer_id UUID,
                price_cents BIGINT NOT NULL,
                listing_type TEXT NOT NULL,
                status TEXT NOT NULL,
                end_time TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend("create tickets table", e))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS bids (
                id UUID PRIMARY KEY,
                ticket_id UUID NOT NULL REFERENCES tickets(id),
                bidder_id UUID NOT NULL,
                amount_cents BIGINT NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend("create bids table", e))?;

        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS bids_one_pending_per_bidder
            ON bids (ticket_id, bidder_id)
            WHERE status = 'PENDING'
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend("create pending bid index", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bids_ticket ON bids (ticket_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| backend("create bid ticket index", e))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_tickets_open_auctions
            ON tickets (end_time)
            WHERE status = 'AVAILABLE' AND listing_type = 'AUCTION'
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend("create open auction index", e))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS purchases (
                id UUID PRIMARY KEY,
                ticket_id UUID NOT NULL UNIQUE REFERENCES tickets(id),
                buyer_id UUID NOT NULL,
                amount_cents BIGINT NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend("create purchases table", e))?;

        Ok(())
    }

    /// Lock the ticket row for the duration of the surrounding transaction.
    ///
    /// Every multi-row write takes this lock first, so writers on the same
    /// ticket serialize in lock order and cannot deadlock against each
    /// other.
    async fn lock_ticket(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ticket_id: TicketId,
    ) -> Result<Option<Ticket>, LedgerError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1 FOR UPDATE"
        ))
        .bind(*ticket_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| backend("lock ticket", e))?;

        row.map(Ticket::try_from).transpose()
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, LedgerError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("load ticket", e))?;

        row.map(Ticket::try_from).transpose()
    }

    async fn ticket_with_bids(
        &self,
        id: TicketId,
    ) -> Result<Option<(Ticket, Vec<Bid>)>, LedgerError> {
        let Some(ticket) = self.ticket(id).await? else {
            return Ok(None);
        };
        let bids = self.bids_for_ticket(id).await?;
        Ok(Some((ticket, bids)))
    }

    async fn bid(&self, id: BidId) -> Result<Option<Bid>, LedgerError> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("load bid", e))?;

        row.map(Bid::try_from).transpose()
    }

    async fn bid_with_ticket(&self, id: BidId) -> Result<Option<(Bid, Ticket)>, LedgerError> {
        let Some(bid) = self.bid(id).await? else {
            return Ok(None);
        };
        let ticket = self.ticket(bid.ticket_id).await?.ok_or_else(|| {
            LedgerError::Backend(format!(
                "Bid {} references missing ticket {}",
                bid.id, bid.ticket_id
            ))
        })?;
        Ok(Some((bid, ticket)))
    }

    async fn bids_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<Bid>, LedgerError> {
        let rows = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE ticket_id = $1 ORDER BY created_at ASC"
        ))
        .bind(*ticket_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend("load bids", e))?;

        rows.into_iter().map(Bid::try_from).collect()
    }

    async fn highest_bid(&self, ticket_id: TicketId) -> Result<Option<Bid>, LedgerError> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE ticket_id = $1 \
             ORDER BY amount_cents DESC, created_at ASC LIMIT 1"
        ))
        .bind(*ticket_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("load highest bid", e))?;

        row.map(Bid::try_from).transpose()
    }

    async fn highest_pending_bid(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<Bid>, LedgerError> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE ticket_id = $1 AND status = 'PENDING' \
             ORDER BY amount_cents DESC, created_at ASC LIMIT 1"
        ))
        .bind(*ticket_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("load highest pending bid", e))?;

        row.map(Bid::try_from).transpose()
    }

    async fn pending_bid(
        &self,
        ticket_id: TicketId,
        bidder_id: UserId,
    ) -> Result<Option<Bid>, LedgerError> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids \
             WHERE ticket_id = $1 AND bidder_id = $2 AND status = 'PENDING'"
        ))
        .bind(*ticket_id.as_uuid())
        .bind(*bidder_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("load pending bid", e))?;

        row.map(Bid::try_from).transpose()
    }

    async fn purchase_for_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<Option<Purchase>, LedgerError> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE ticket_id = $1"
        ))
        .bind(*ticket_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("load purchase", e))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn expired_auction_candidates(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Ticket>, LedgerError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets \
             WHERE status = 'AVAILABLE' AND listing_type = 'AUCTION' \
               AND end_time IS NOT NULL AND end_time < $1 \
             ORDER BY end_time ASC LIMIT $2"
        ))
        .bind(now)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend("load expired auction candidates", e))?;

        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, LedgerError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "INSERT INTO tickets (id, event_id, seller_id, price_cents, listing_type, status, end_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(*TicketId::new().as_uuid())
        .bind(*ticket.event_id.as_uuid())
        .bind(*ticket.seller_id.as_uuid())
        .bind(money_to_db(ticket.price)?)
        .bind(listing_type_str(ticket.listing_type))
        .bind(ticket_status_str(TicketStatus::Available))
        .bind(ticket.end_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| backend("insert ticket", e))?;

        Ticket::try_from(row)
    }

    async fn upsert_pending_bid(
        &self,
        ticket_id: TicketId,
        bidder_id: UserId,
        amount: Money,
        expected_highest: Option<Money>,
    ) -> Result<BidPlacement, LedgerError> {
        let amount_cents = money_to_db(amount)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("start transaction", e))?;

        let Some(ticket) = Self::lock_ticket(&mut tx, ticket_id).await? else {
            let _ = tx.rollback().await;
            return Err(LedgerError::TicketUnavailable);
        };
        if ticket.status != TicketStatus::Available {
            let _ = tx.rollback().await;
            return Err(LedgerError::TicketUnavailable);
        }

        // Re-read the highest bid under the ticket lock. If it moved since
        // the caller validated, fail so the caller re-validates.
        let highest: Option<i64> = sqlx::query_scalar(
            "SELECT amount_cents FROM bids WHERE ticket_id = $1 \
             ORDER BY amount_cents DESC, created_at ASC LIMIT 1",
        )
        .bind(*ticket_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| backend("re-read highest bid", e))?;

        let highest = highest.map(money_from_db).transpose()?;
        if highest != expected_highest {
            let _ = tx.rollback().await;
            return Err(LedgerError::Conflict);
        }

        let standing = sqlx::query_as::<_, BidRow>(&format!(
            "UPDATE bids SET amount_cents = $3, updated_at = now() \
             WHERE ticket_id = $1 AND bidder_id = $2 AND status = 'PENDING' \
             RETURNING {BID_COLUMNS}"
        ))
        .bind(*ticket_id.as_uuid())
        .bind(*bidder_id.as_uuid())
        .bind(amount_cents)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| backend("raise bid", e))?;

        let (row, updated) = match standing {
            Some(row) => (row, true),
            None => {
                let row = sqlx::query_as::<_, BidRow>(&format!(
                    "INSERT INTO bids (id, ticket_id, bidder_id, amount_cents, status) \
                     VALUES ($1, $2, $3, $4, 'PENDING') \
                     RETURNING {BID_COLUMNS}"
                ))
                .bind(*BidId::new().as_uuid())
                .bind(*ticket_id.as_uuid())
                .bind(*bidder_id.as_uuid())
                .bind(amount_cents)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| backend("insert bid", e))?;
                (row, false)
            }
        };

        tx.commit()
            .await
            .map_err(|e| backend("commit bid placement", e))?;

        Ok(BidPlacement {
            bid: Bid::try_from(row)?,
            updated,
        })
    }

    async fn finalize_sale(
        &self,
        ticket_id: TicketId,
        winning_bid_id: BidId,
        buyer_id: UserId,
        amount: Money,
    ) -> Result<SaleOutcome, LedgerError> {
        let amount_cents = money_to_db(amount)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("start transaction", e))?;

        if Self::lock_ticket(&mut tx, ticket_id).await?.is_none() {
            let _ = tx.rollback().await;
            return Err(LedgerError::TicketUnavailable);
        }

        let sold = sqlx::query_as::<_, TicketRow>(&format!(
            "UPDATE tickets SET status = 'SOLD', buyer_id = $2, updated_at = now() \
             WHERE id = $1 AND status = 'AVAILABLE' \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(*ticket_id.as_uuid())
        .bind(*buyer_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| backend("close ticket", e))?;

        let Some(sold) = sold else {
            let _ = tx.rollback().await;
            return Err(LedgerError::TicketUnavailable);
        };

        let accepted = sqlx::query_as::<_, BidRow>(&format!(
            "UPDATE bids SET status = 'ACCEPTED', updated_at = now() \
             WHERE id = $1 AND ticket_id = $2 AND status = 'PENDING' \
             RETURNING {BID_COLUMNS}"
        ))
        .bind(*winning_bid_id.as_uuid())
        .bind(*ticket_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| backend("accept winning bid", e))?;

        let Some(accepted) = accepted else {
            let _ = tx.rollback().await;
            return Err(LedgerError::AlreadyProcessed);
        };

        let rejected = sqlx::query(
            "UPDATE bids SET status = 'REJECTED', updated_at = now() \
             WHERE ticket_id = $1 AND status = 'PENDING' AND id <> $2",
        )
        .bind(*ticket_id.as_uuid())
        .bind(*winning_bid_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| backend("reject losing bids", e))?;

        let purchase = sqlx::query_as::<_, PurchaseRow>(&format!(
            "INSERT INTO purchases (id, ticket_id, buyer_id, amount_cents, status) \
             VALUES ($1, $2, $3, $4, 'COMPLETED') \
             ON CONFLICT (ticket_id) DO UPDATE \
             SET buyer_id = EXCLUDED.buyer_id, amount_cents = EXCLUDED.amount_cents, \
                 updated_at = now() \
             RETURNING {PURCHASE_COLUMNS}"
        ))
        .bind(*PurchaseId::new().as_uuid())
        .bind(*ticket_id.as_uuid())
        .bind(*buyer_id.as_uuid())
        .bind(amount_cents)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| backend("record purchase", e))?;

        tx.commit()
            .await
            .map_err(|e| backend("commit sale", e))?;

        let rejected_bids = usize::try_from(rejected.rows_affected()).unwrap_or(usize::MAX);

        Ok(SaleOutcome {
            ticket: Ticket::try_from(sold)?,
            winning_bid: Bid::try_from(accepted)?,
            purchase: Purchase::try_from(purchase)?,
            rejected_bids,
        })
    }

    async fn reject_bid(&self, bid_id: BidId) -> Result<Bid, LedgerError> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "UPDATE bids SET status = 'REJECTED', updated_at = now() \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {BID_COLUMNS}"
        ))
        .bind(*bid_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("reject bid", e))?;

        row.map_or(Err(LedgerError::AlreadyProcessed), Bid::try_from)
    }

    async fn expire_ticket(&self, ticket_id: TicketId) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            "UPDATE tickets SET status = 'EXPIRED', updated_at = now() \
             WHERE id = $1 AND status = 'AVAILABLE'",
        )
        .bind(*ticket_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| backend("expire ticket", e))?;

        Ok(result.rows_affected() == 1)
    }
}
