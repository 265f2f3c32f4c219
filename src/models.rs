//! Application configuration loaded from the environment.

use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub access_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_secret: String,
    pub refresh_token_ttl_secs: i64,
    pub revocation_retention_secs: u64,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let database_path = std::env::var("AUTH_DB_PATH")
            .unwrap_or_else(|_| "./authgate.db".to_string());

        // Token secrets have no defaults; a misconfigured secret must fail
        // startup, not silently sign tokens with a known value.
        let access_token_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .context("ACCESS_TOKEN_SECRET must be set")?;
        let refresh_token_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .context("REFRESH_TOKEN_SECRET must be set")?;

        anyhow::ensure!(
            !access_token_secret.trim().is_empty() && !refresh_token_secret.trim().is_empty(),
            "token secrets must be non-empty"
        );
        anyhow::ensure!(
            access_token_secret != refresh_token_secret,
            "access and refresh secrets must differ"
        );

        let access_token_ttl_secs = std::env::var("ACCESS_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);

        let refresh_token_ttl_secs = std::env::var("REFRESH_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse()
            .unwrap_or(604_800);

        let revocation_retention_secs = std::env::var("REVOCATION_RETENTION_SECS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse()
            .unwrap_or(604_800);

        let rate_limit_max_requests = std::env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);

        let rate_limit_window_secs = std::env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        Ok(Self {
            port,
            database_path,
            access_token_secret,
            access_token_ttl_secs,
            refresh_token_secret,
            refresh_token_ttl_secs,
            revocation_retention_secs,
            rate_limit_max_requests,
            rate_limit_window_secs,
        })
    }
}
