use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use jiff::tz::TimeZone;

/// How requests to TMDB are authenticated.
#[derive(Clone, Debug)]
pub enum TmdbCredential {
    /// v4 read access token, sent as a bearer token.
    AccessToken(String),
    /// v3 API key, sent as the `api_key` query parameter.
    ApiKey(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub tmdb_credential: TmdbCredential,
    pub tmdb_base_url: String,
    pub tmdb_language: String,
    pub tmdb_timeout: Duration,
    pub calendar_table: String,
    pub calendar_scan_limit: u64,
    pub timezone: TimeZone,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = required("DATABASE_URL")?;

        let tmdb_credential = match (optional("TMDB_ACCESS_TOKEN"), optional("TMDB_API_KEY")) {
            (Some(token), _) => TmdbCredential::AccessToken(token),
            (None, Some(key)) => TmdbCredential::ApiKey(key),
            (None, None) => anyhow::bail!("TMDB_ACCESS_TOKEN or TMDB_API_KEY must be set"),
        };

        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());

        let tmdb_language =
            std::env::var("TMDB_LANGUAGE").unwrap_or_else(|_| "en-US".to_string());

        let tmdb_timeout_secs: u64 =
            std::env::var("TMDB_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(10);

        let calendar_table =
            std::env::var("CALENDAR_TABLE").unwrap_or_else(|_| "calendar".to_string());

        let calendar_scan_limit: u64 = std::env::var("CALENDAR_SCAN_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000);

        let timezone = match optional("CALENDAR_TIMEZONE") {
            Some(name) => TimeZone::get(&name).context("CALENDAR_TIMEZONE")?,
            None => TimeZone::system(),
        };

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            tmdb_credential,
            tmdb_base_url,
            tmdb_language,
            tmdb_timeout: Duration::from_secs(tmdb_timeout_secs.max(1)),
            calendar_table,
            calendar_scan_limit,
            timezone,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).with_context(|| format!("{key} must be set"))
}
