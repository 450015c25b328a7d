//! Import driver: pull rows, map them, flush full batches, drain at the end.
//!
//! Each flush is awaited before the next row is pulled from the source, so
//! at most one batch is in memory and at most one write is in flight.

use std::fmt;
use std::io::Read;

use crate::loader::BatchLoader;
use crate::mapper::map_row;
use crate::source::RowSource;
use crate::store::FundStore;

/// Outcome of one import run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Data rows successfully read from the file
    pub rows_read: usize,
    /// Rows dropped for lacking a fund name
    pub skipped: usize,
    /// Records that could not be read from the file
    pub stream_errors: usize,
    pub flushes: usize,
    pub inserted: usize,
    /// Records the store did not persist
    pub rejected: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows read:     {}", self.rows_read)?;
        writeln!(f, "Rows skipped:  {}", self.skipped)?;
        writeln!(f, "Stream errors: {}", self.stream_errors)?;
        writeln!(f, "Batches:       {}", self.flushes)?;
        writeln!(f, "Rejected:      {}", self.rejected)?;
        write!(f, "Total inserted: {}", self.inserted)
    }
}

/// Run a full import from `rows` into `store`.
///
/// Row and batch level failures are logged and counted; nothing here aborts
/// the run.
pub async fn import<R, S>(rows: RowSource<R>, store: &S, batch_size: usize) -> ImportSummary
where
    R: Read,
    S: FundStore + ?Sized,
{
    let mut loader = BatchLoader::new(store, batch_size);
    let mut summary = ImportSummary::default();

    tracing::debug!(
        headers = ?rows.headers().collect::<Vec<_>>(),
        batch_size = loader.batch_size(),
        "import started"
    );

    for (idx, result) in rows.enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                summary.stream_errors += 1;
                let line = e.position().map(|p| p.line());
                tracing::warn!(
                    record = idx + 1,
                    ?line,
                    error = %e,
                    "skipping unreadable CSV record"
                );
                continue;
            }
        };
        summary.rows_read += 1;

        let Some(record) = map_row(&row) else {
            summary.skipped += 1;
            tracing::debug!(record = idx + 1, "row without fund name skipped");
            continue;
        };

        loader.push(record);
        if loader.is_full() {
            loader.flush().await;
        }
    }

    // Drain the partial batch
    tracing::debug!(pending = loader.pending(), "draining final batch");
    loader.flush().await;

    let stats = loader.stats();
    summary.flushes = stats.flushes;
    summary.inserted = stats.inserted;
    summary.rejected = stats.rejected;

    tracing::info!(
        rows_read = summary.rows_read,
        skipped = summary.skipped,
        inserted = summary.inserted,
        "import finished"
    );

    summary
}
