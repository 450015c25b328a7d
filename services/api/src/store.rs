//! Read access to the `funds` table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A stored fund as returned by `GET /funds`
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FundDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub fund: String,
    pub net_asset: f64,
    #[serde(rename = "CAGR_6MONTH")]
    pub cagr_6month: f64,
    #[serde(rename = "CAGR_1YEAR")]
    pub cagr_1year: f64,
    #[serde(rename = "CAGR_3YEAR")]
    pub cagr_3year: f64,
    pub min_investment: f64,
    pub expense_ratio: f64,
    #[serde(rename = "originalIndex", skip_serializing_if = "Option::is_none")]
    pub original_index: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait FundReader: Send + Sync {
    async fn list_all(&self) -> Result<Vec<FundDocument>, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgFundReader {
    pool: PgPool,
}

impl PgFundReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FundReader for PgFundReader {
    async fn list_all(&self) -> Result<Vec<FundDocument>, sqlx::Error> {
        let result = sqlx::query_as(
            r#"
            SELECT id, fund, net_asset, cagr_6month, cagr_1year, cagr_3year,
                   min_investment, expense_ratio, original_index, created_at, updated_at
            FROM funds
            ORDER BY created_at, original_index NULLS LAST
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        empty_if_missing_table(result)
    }
}

/// SQLSTATE for `undefined_table`
const UNDEFINED_TABLE: &str = "42P01";

/// Before the first import there is no `funds` table; that reads as no funds.
fn empty_if_missing_table(
    result: Result<Vec<FundDocument>, sqlx::Error>,
) -> Result<Vec<FundDocument>, sqlx::Error> {
    match result {
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNDEFINED_TABLE) => {
            tracing::debug!(error = %e, "funds table does not exist yet");
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::fmt;

    #[derive(Debug)]
    struct CodedError(Option<&'static str>);

    impl fmt::Display for CodedError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "database error {:?}", self.0)
        }
    }

    impl std::error::Error for CodedError {}

    impl sqlx::error::DatabaseError for CodedError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.0.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn db_error(code: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(CodedError(code)))
    }

    #[test]
    fn test_missing_table_reads_as_empty() {
        let funds = empty_if_missing_table(Err(db_error(Some("42P01")))).unwrap();
        assert!(funds.is_empty());
    }

    #[test]
    fn test_other_errors_pass_through() {
        assert!(empty_if_missing_table(Err(db_error(Some("42501")))).is_err());
        assert!(empty_if_missing_table(Err(db_error(None))).is_err());
        assert!(empty_if_missing_table(Err(sqlx::Error::PoolTimedOut)).is_err());
    }

    #[test]
    fn test_rows_pass_through() {
        let funds = empty_if_missing_table(Ok(Vec::new())).unwrap();
        assert!(funds.is_empty());
    }
}
