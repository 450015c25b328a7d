//! Row mapping: raw CSV row -> `FundRecord`
//!
//! The dataset has been exported with several header spellings over time.
//! Each attribute lists its known column names in priority order.

use std::collections::HashMap;

use crate::normalize::{normalize_field, normalize_index};
use crate::record::FundRecord;

/// One CSV row keyed by (trimmed) header name
pub type RawRow = HashMap<String, String>;

pub const FUND_COLUMNS: &[&str] = &["Scheme", "Fund"];
pub const NET_ASSET_COLUMNS: &[&str] = &[
    "Net_Asset_Value(Rs.)",
    "Net Asset Value(Rs.)",
    "Net Asset",
    "Net_Asset_Value",
];
pub const CAGR_6MONTH_COLUMNS: &[&str] = &["CAGR% 6 Months", "CAGR 6 Months"];
pub const CAGR_1YEAR_COLUMNS: &[&str] = &["CAGR% 1 Year", "CAGR 1 Year"];
pub const CAGR_3YEAR_COLUMNS: &[&str] = &["CAGR% 3 Year", "CAGR 3 Year"];
pub const MIN_INVESTMENT_COLUMNS: &[&str] = &["Min. Invest(Rs.)", "Min Invest(Rs.)", "Min. Invest"];
pub const EXPENSE_RATIO_COLUMNS: &[&str] = &["Exp. Ratio(%)", "Expense Ratio(%)"];
/// Unnamed leading column written by pandas `to_csv`
pub const INDEX_COLUMNS: &[&str] = &["Unnamed: 0"];

/// Value of the first alias whose column exists in the row.
///
/// A present-but-empty column still wins over later aliases.
pub fn first_present<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|alias| row.get(*alias))
        .map(String::as_str)
}

fn numeric(row: &RawRow, aliases: &[&str]) -> Option<f64> {
    normalize_field(first_present(row, aliases))
}

/// Map a raw row to a fund record.
///
/// Returns `None` when the fund name is missing or blank; such rows are
/// dropped without being treated as errors.
pub fn map_row(row: &RawRow) -> Option<FundRecord> {
    let fund = first_present(row, FUND_COLUMNS).unwrap_or("").trim();
    if fund.is_empty() {
        return None;
    }

    Some(FundRecord {
        fund: fund.to_string(),
        net_asset: numeric(row, NET_ASSET_COLUMNS),
        cagr_6month: numeric(row, CAGR_6MONTH_COLUMNS),
        cagr_1year: numeric(row, CAGR_1YEAR_COLUMNS),
        cagr_3year: numeric(row, CAGR_3YEAR_COLUMNS),
        min_investment: numeric(row, MIN_INVESTMENT_COLUMNS),
        expense_ratio: numeric(row, EXPENSE_RATIO_COLUMNS),
        original_index: normalize_index(first_present(row, INDEX_COLUMNS)),
    })
}
