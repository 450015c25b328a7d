//! End-to-end import tests against in-memory stores

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use importer::{import, FundRecord, FundStore, RowSource, StoreError, DEFAULT_BATCH_SIZE};
use tempfile::NamedTempFile;

/// Keeps every batch it receives and rejects incomplete records
#[derive(Default)]
struct MemoryStore {
    batches: Mutex<Vec<usize>>,
    stored: Mutex<Vec<FundRecord>>,
}

#[async_trait]
impl FundStore for MemoryStore {
    async fn insert_many(&self, records: &[FundRecord]) -> Result<usize, StoreError> {
        self.batches.lock().unwrap().push(records.len());
        let mut stored = self.stored.lock().unwrap();
        let before = stored.len();
        stored.extend(records.iter().filter(|r| r.is_complete()).cloned());
        Ok(stored.len() - before)
    }
}

/// Fails every other batch as if the connection dropped
#[derive(Default)]
struct FlakyStore {
    calls: Mutex<usize>,
}

#[async_trait]
impl FundStore for FlakyStore {
    async fn insert_many(&self, records: &[FundRecord]) -> Result<usize, StoreError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls % 2 == 0 {
            return Err(StoreError::Rejected("connection reset by peer".to_string()));
        }
        Ok(records.len())
    }
}

const HEADER: &str = concat!(
    "Unnamed: 0,Scheme,Net_Asset_Value(Rs.),CAGR% 6 Months,CAGR% 1 Year,",
    "CAGR% 3 Year,Min. Invest(Rs.),Exp. Ratio(%)"
);

/// Writes `rows` data rows; `blank` rows get an empty scheme and `incomplete`
/// rows get an `NA` net asset value.
fn write_csv(
    rows: usize,
    blank: impl Fn(usize) -> bool,
    incomplete: impl Fn(usize) -> bool,
) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for i in 0..rows {
        let scheme = if blank(i) { String::new() } else { format!("Fund {}", i) };
        let nav = if incomplete(i) {
            "NA".to_string()
        } else {
            format!("\"₹{},{:03}.25\"", i / 1000 + 1, i % 1000)
        };
        writeln!(file, "{},{},{},3.5%,12.5%,28.1%,Rs. 500,1.25%", i, scheme, nav).unwrap();
    }
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_1200_rows_flush_in_three_batches() {
    let file = write_csv(1200, |_| false, |_| false);
    let store = MemoryStore::default();

    let rows = RowSource::from_path(file.path()).unwrap();
    let summary = import(rows, &store, DEFAULT_BATCH_SIZE).await;

    assert_eq!(*store.batches.lock().unwrap(), vec![500, 500, 200]);
    assert_eq!(summary.flushes, 3);
    assert_eq!(summary.rows_read, 1200);
    assert_eq!(summary.inserted, 1200);
    assert_eq!(store.stored.lock().unwrap().len(), 1200);
}

#[tokio::test]
async fn test_total_is_named_rows_minus_rejections() {
    // 1200 rows, every 10th blank (120), every 7th non-blank incomplete
    let blank = |i: usize| i % 10 == 0;
    let incomplete = |i: usize| i % 7 == 0 && i % 10 != 0;
    let rejected = (0..1200).filter(|i| incomplete(*i)).count();

    let file = write_csv(1200, blank, incomplete);
    let store = MemoryStore::default();

    let rows = RowSource::from_path(file.path()).unwrap();
    let summary = import(rows, &store, 500).await;

    assert_eq!(summary.skipped, 120);
    assert_eq!(summary.rejected, rejected);
    assert_eq!(summary.inserted, 1080 - rejected);
    assert_eq!(*store.batches.lock().unwrap(), vec![500, 500, 80]);
}

#[tokio::test]
async fn test_batches_never_exceed_threshold() {
    let file = write_csv(1037, |i| i % 3 == 0, |_| false);
    let store = MemoryStore::default();

    let rows = RowSource::from_path(file.path()).unwrap();
    import(rows, &store, 64).await;

    let batches = store.batches.lock().unwrap();
    assert!(batches.iter().all(|&n| n > 0 && n <= 64));
    let named = (0..1037).filter(|i| i % 3 != 0).count();
    assert_eq!(batches.iter().sum::<usize>(), named);
}

#[tokio::test]
async fn test_records_keep_source_values() {
    let file = write_csv(3, |_| false, |_| false);
    let store = MemoryStore::default();

    let rows = RowSource::from_path(file.path()).unwrap();
    import(rows, &store, DEFAULT_BATCH_SIZE).await;

    let stored = store.stored.lock().unwrap();
    assert_eq!(stored[2].fund, "Fund 2");
    assert_eq!(stored[2].original_index, Some(2));
    assert_eq!(stored[2].net_asset, Some(1002.25));
    assert_eq!(stored[2].cagr_6month, Some(3.5));
    assert_eq!(stored[2].min_investment, Some(500.0));
}

#[tokio::test]
async fn test_failed_batches_contribute_nothing() {
    let file = write_csv(1200, |_| false, |_| false);
    let store = FlakyStore::default();

    let rows = RowSource::from_path(file.path()).unwrap();
    let summary = import(rows, &store, 500).await;

    // Second batch fails; first and third land
    assert_eq!(summary.flushes, 3);
    assert_eq!(summary.inserted, 700);
    assert_eq!(summary.rejected, 500);
}

#[test]
fn test_missing_file_is_an_error() {
    let result = RowSource::from_path(std::path::Path::new("/nonexistent/Mutual_Funds.csv"));
    assert!(result.is_err());
}
