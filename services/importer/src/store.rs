//! Persistence boundary for fund records
//!
//! `FundStore::insert_many` is a best-effort bulk write: every record is
//! attempted, individual rejections are tolerated, and the number actually
//! persisted is returned. `Err` means nothing from the batch could be written.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use crate::record::FundRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (connection, pool, I/O)
    #[error("Store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// The store refused the operation as a whole
    #[error("Store rejected operation: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait FundStore: Send + Sync {
    /// Attempt to persist every record, returning how many were stored
    async fn insert_many(&self, records: &[FundRecord]) -> Result<usize, StoreError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

const CREATE_FUNDS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS funds (
        id             UUID PRIMARY KEY,
        fund           TEXT NOT NULL CHECK (btrim(fund) <> ''),
        net_asset      DOUBLE PRECISION NOT NULL,
        cagr_6month    DOUBLE PRECISION NOT NULL,
        cagr_1year     DOUBLE PRECISION NOT NULL,
        cagr_3year     DOUBLE PRECISION NOT NULL,
        min_investment DOUBLE PRECISION NOT NULL,
        expense_ratio  DOUBLE PRECISION NOT NULL,
        original_index BIGINT,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

/// Values bound per row by `insert_bulk`
const BINDS_PER_RECORD: usize = 9;

/// PostgreSQL refuses statements with more than 65535 bind parameters
const MAX_ROWS_PER_STATEMENT: usize = u16::MAX as usize / BINDS_PER_RECORD;

const INSERT_FUND_COLUMNS: &str = "INSERT INTO funds (id, fund, net_asset, cagr_6month, \
     cagr_1year, cagr_3year, min_investment, expense_ratio, original_index) ";

#[derive(Debug, Clone)]
pub struct PgFundStore {
    pool: PgPool,
}

impl PgFundStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a small pool; the importer is the only writer
    pub async fn connect(db_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(db_url)
            .await
            .map_err(StoreError::Unavailable)?;
        Ok(Self::new(pool))
    }

    /// Create the `funds` table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_FUNDS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Unavailable)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// One multi-row INSERT; all or nothing
    async fn insert_bulk(&self, records: &[FundRecord]) -> Result<usize, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_FUND_COLUMNS);
        builder.push_values(records, |mut b, record| {
            b.push_bind(Uuid::new_v4())
                .push_bind(record.fund.clone())
                .push_bind(record.net_asset)
                .push_bind(record.cagr_6month)
                .push_bind(record.cagr_1year)
                .push_bind(record.cagr_3year)
                .push_bind(record.min_investment)
                .push_bind(record.expense_ratio)
                .push_bind(record.original_index);
        });

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() as usize)
    }

    /// Insert records one by one, skipping the ones the database refuses
    async fn insert_each(&self, records: &[FundRecord]) -> usize {
        salvage_each(records, |record| self.insert_bulk(std::slice::from_ref(record))).await
    }

    /// Best-effort insert of at most `MAX_ROWS_PER_STATEMENT` records
    async fn insert_chunk(&self, records: &[FundRecord]) -> Result<usize, StoreError> {
        match self.insert_bulk(records).await {
            Ok(n) => Ok(n),
            Err(e) => match classify(&e) {
                Failure::Record => {
                    // Nothing from the statement was committed; salvage what we can
                    tracing::warn!(
                        error = %e,
                        batch = records.len(),
                        "bulk insert rejected, inserting records individually"
                    );
                    Ok(self.insert_each(records).await)
                }
                Failure::Statement => Err(StoreError::Rejected(e.to_string())),
                Failure::Unavailable => Err(StoreError::Unavailable(e)),
            },
        }
    }
}

#[async_trait]
impl FundStore for PgFundStore {
    async fn insert_many(&self, records: &[FundRecord]) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for chunk in records.chunks(MAX_ROWS_PER_STATEMENT) {
            match self.insert_chunk(chunk).await {
                Ok(n) => inserted += n,
                Err(e) if inserted == 0 => return Err(e),
                Err(e) => {
                    tracing::error!(error = %e, inserted, "store failed mid-batch");
                    break;
                }
            }
        }
        Ok(inserted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// Caused by one of the rows; the others may still be accepted
    Record,
    /// Refused for the statement as a whole
    Statement,
    /// The database could not be reached
    Unavailable,
}

/// Integrity violations (class 23) and data exceptions (class 22) are caused
/// by individual rows; any other database error applies to the statement.
fn classify(e: &sqlx::Error) -> Failure {
    match e {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) if code.starts_with("23") || code.starts_with("22") => Failure::Record,
            _ => Failure::Statement,
        },
        _ => Failure::Unavailable,
    }
}

/// Run `insert_one` for each record in order. Records refused on their own
/// are logged and skipped; any other failure stops the pass.
async fn salvage_each<'a, F, Fut>(records: &'a [FundRecord], mut insert_one: F) -> usize
where
    F: FnMut(&'a FundRecord) -> Fut,
    Fut: Future<Output = Result<usize, sqlx::Error>>,
{
    let mut inserted = 0;
    for (pos, record) in records.iter().enumerate() {
        match insert_one(record).await {
            Ok(n) => inserted += n,
            Err(e) if classify(&e) == Failure::Record => {
                tracing::warn!(
                    fund = %record.fund,
                    original_index = ?record.original_index,
                    error = %e,
                    "record rejected by store"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    inserted,
                    unattempted = records.len() - pos,
                    "store failed during per-record insert"
                );
                break;
            }
        }
    }
    inserted
}

// =============================================================================
// DRY RUN
// =============================================================================

const DRY_RUN_SAMPLES: usize = 3;

/// Accepts the records the `funds` table would accept and stores nothing
#[derive(Debug, Default)]
pub struct DryRunStore {
    accepted: AtomicUsize,
    rejected: AtomicUsize,
    samples: Mutex<Vec<FundRecord>>,
}

impl DryRunStore {
    /// First few accepted records, for previewing a run
    pub fn samples(&self) -> Vec<FundRecord> {
        self.samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FundStore for DryRunStore {
    async fn insert_many(&self, records: &[FundRecord]) -> Result<usize, StoreError> {
        let mut accepted = 0;
        for record in records {
            let missing = record.missing_fields();
            if missing.is_empty() {
                accepted += 1;
                if let Ok(mut samples) = self.samples.lock() {
                    if samples.len() < DRY_RUN_SAMPLES {
                        samples.push(record.clone());
                    }
                }
            } else {
                tracing::debug!(fund = %record.fund, ?missing, "dry run: record would be rejected");
            }
        }
        self.accepted.fetch_add(accepted, Ordering::Relaxed);
        self.rejected
            .fetch_add(records.len() - accepted, Ordering::Relaxed);
        Ok(accepted)
    }
}
