use anyhow::{Context, Result};

/// Environment configuration for the importer
#[derive(Debug, Clone)]
pub struct Config {
    db_url: Option<String>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            db_url: lookup("DB_URL")
                .or_else(|| lookup("DATABASE_URL"))
                .filter(|url| !url.trim().is_empty()),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Connection string, required for live imports
    pub fn db_url(&self) -> Result<&str> {
        self.db_url.as_deref().context("DB_URL env var missing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_db_url_required() {
        let err = config(&[]).db_url().unwrap_err();
        assert!(err.to_string().contains("DB_URL"));
    }

    #[test]
    fn test_blank_db_url_counts_as_missing() {
        assert!(config(&[("DB_URL", "  ")]).db_url().is_err());
    }

    #[test]
    fn test_database_url_fallback() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/funds")]);
        assert_eq!(cfg.db_url().unwrap(), "postgres://localhost/funds");
    }

    #[test]
    fn test_db_url_preferred_over_fallback() {
        let cfg = config(&[
            ("DB_URL", "postgres://primary/funds"),
            ("DATABASE_URL", "postgres://fallback/funds"),
        ]);
        assert_eq!(cfg.db_url().unwrap(), "postgres://primary/funds");
    }

    #[test]
    fn test_log_level_default() {
        assert_eq!(config(&[]).log_level, "info");
        assert_eq!(config(&[("RUST_LOG", "debug")]).log_level, "debug");
    }
}
