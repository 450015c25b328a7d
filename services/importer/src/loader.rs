//! Batch accumulation and best-effort flushing

use crate::record::FundRecord;
use crate::store::FundStore;

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Largest batch that still fits one INSERT statement's bind parameters
pub const MAX_BATCH_SIZE: usize = 7000;

/// Running totals across all flushes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoaderStats {
    pub flushes: usize,
    pub inserted: usize,
    /// Records handed to the store but not persisted
    pub rejected: usize,
    /// Flushes where the store failed outright
    pub failed_batches: usize,
}

pub struct BatchLoader<'a, S: FundStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
    batch: Vec<FundRecord>,
    stats: LoaderStats,
}

impl<'a, S: FundStore + ?Sized> BatchLoader<'a, S> {
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        Self {
            store,
            batch_size,
            batch: Vec::with_capacity(batch_size),
            stats: LoaderStats::default(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn is_full(&self) -> bool {
        self.batch.len() >= self.batch_size
    }

    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    /// Queue a record; callers flush once `is_full` reports true
    pub fn push(&mut self, record: FundRecord) {
        debug_assert!(!self.is_full(), "push on a full batch");
        self.batch.push(record);
    }

    /// Write the pending batch and clear it.
    ///
    /// Returns the number of records persisted. A store failure is logged and
    /// counted as zero inserted; it is never returned to the caller.
    pub async fn flush(&mut self) -> usize {
        if self.batch.is_empty() {
            return 0;
        }

        let attempted = self.batch.len();
        let inserted = match self.store.insert_many(&self.batch).await {
            Ok(n) => n.min(attempted),
            Err(e) => {
                tracing::error!(error = %e, batch = attempted, "batch insert failed");
                self.stats.failed_batches += 1;
                0
            }
        };
        self.batch.clear();

        self.stats.flushes += 1;
        self.stats.inserted += inserted;
        self.stats.rejected += attempted - inserted;

        tracing::info!(
            batch = attempted,
            inserted,
            total_inserted = self.stats.inserted,
            "batch flushed"
        );

        inserted
    }
}
