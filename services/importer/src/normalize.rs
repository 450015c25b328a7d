//! Numeric field cleaning
//!
//! Source files format numbers for display: `₹1,234.50`, `Rs. 500`, `12.3%`.
//! Placeholders such as `-` or `NA` mean the value is unknown.

use once_cell::sync::Lazy;
use regex::Regex;

/// Rupee sign, thousands separators, percent signs and `Rs`/`Rs.` in any case
static DECORATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"₹|,|%|(?i:rs\.?)").expect("decoration pattern is valid"));

/// Clean a raw field value into a finite number.
///
/// Returns `None` for absent input, empty or placeholder values (`-`, `na`)
/// and anything that does not parse as a finite number.
pub fn normalize_field(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    let cleaned = DECORATIONS.replace_all(raw, "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case("na") {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Clean a raw row-index value.
///
/// Fractional indexes are truncated toward zero (`"7.5"` becomes 7) rather
/// than dropped, so a row never loses its position. Values outside the `i64`
/// range are treated as absent.
pub fn normalize_index(raw: Option<&str>) -> Option<i64> {
    normalize_field(raw)
        .map(f64::trunc)
        .filter(|v| *v >= i64::MIN as f64 && *v < i64::MAX as f64)
        .map(|v| v as i64)
}
