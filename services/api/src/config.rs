use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT").filter(|p| !p.trim().is_empty()) {
            Some(p) => p
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value '{}'", p))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            db_url: lookup("DB_URL")
                .or_else(|| lookup("DATABASE_URL"))
                .context("DB_URL env var missing")?,
            host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
