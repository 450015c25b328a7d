use serde::Serialize;

/// A fund row ready for insertion.
///
/// Numeric attributes are `None` when the source value was missing or not a
/// number. Whether an incomplete record is accepted is up to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundRecord {
    pub fund: String,
    pub net_asset: Option<f64>,
    #[serde(rename = "CAGR_6MONTH")]
    pub cagr_6month: Option<f64>,
    #[serde(rename = "CAGR_1YEAR")]
    pub cagr_1year: Option<f64>,
    #[serde(rename = "CAGR_3YEAR")]
    pub cagr_3year: Option<f64>,
    pub min_investment: Option<f64>,
    pub expense_ratio: Option<f64>,
    #[serde(rename = "originalIndex", skip_serializing_if = "Option::is_none")]
    pub original_index: Option<i64>,
}

impl FundRecord {
    /// Names of required attributes that are absent, in column order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.fund.trim().is_empty() {
            missing.push("fund");
        }
        let numerics = [
            ("net_asset", self.net_asset),
            ("CAGR_6MONTH", self.cagr_6month),
            ("CAGR_1YEAR", self.cagr_1year),
            ("CAGR_3YEAR", self.cagr_3year),
            ("min_investment", self.min_investment),
            ("expense_ratio", self.expense_ratio),
        ];
        for (name, value) in numerics {
            if value.is_none() {
                missing.push(name);
            }
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
