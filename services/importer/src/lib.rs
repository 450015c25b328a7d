//! Mutual fund CSV importer
//!
//! Pipeline:
//! - Pull raw rows from a CSV file (`source`)
//! - Clean locale-formatted numbers (`normalize`)
//! - Map historical column variants onto a fund record (`mapper`)
//! - Accumulate records into batches and bulk insert them (`loader`)
//! - Drive the whole run and report a summary (`driver`)
//!
//! The store is reached only through the `FundStore` trait, so the whole
//! pipeline runs against in-memory stores in tests.

pub mod config;
pub mod driver;
pub mod loader;
pub mod mapper;
pub mod normalize;
pub mod record;
pub mod source;
pub mod store;

pub use driver::{import, ImportSummary};
pub use loader::{BatchLoader, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
pub use mapper::{map_row, RawRow};
pub use normalize::{normalize_field, normalize_index};
pub use record::FundRecord;
pub use source::RowSource;
pub use store::{DryRunStore, FundStore, PgFundStore, StoreError};
