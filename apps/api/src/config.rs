use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which backing store the service talks to.
/// Injected once at startup; nothing else in the crate decides mock vs live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Seeded in-memory tables. Used for demos and local development.
    Memory,
    /// PostgreSQL via sqlx.
    Postgres,
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mock" => Ok(DataSource::Memory),
            "postgres" | "live" => Ok(DataSource::Postgres),
            other => bail!("DATA_SOURCE must be 'memory' or 'postgres', got '{other}'"),
        }
    }
}

/// Credentials for archiving rendered PDFs. Only present when every S3 variable is set.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if a variable required by the chosen data source is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_source: DataSource,
    pub database_url: Option<String>,
    pub pdf_renderer_url: String,
    pub s3: Option<S3Settings>,
    /// Literal working location used when neither the vacancy nor past letters supply one.
    pub company_address: String,
    pub offer_validity_days: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_source: DataSource = optional_env("DATA_SOURCE")
            .unwrap_or_else(|| "memory".to_string())
            .parse()?;

        let database_url = match data_source {
            DataSource::Postgres => Some(require_env("DATABASE_URL")?),
            DataSource::Memory => optional_env("DATABASE_URL"),
        };

        let s3 = match (
            optional_env("S3_BUCKET"),
            optional_env("S3_ENDPOINT"),
            optional_env("AWS_ACCESS_KEY_ID"),
            optional_env("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(bucket), Some(endpoint), Some(access_key_id), Some(secret_access_key)) => {
                Some(S3Settings {
                    bucket,
                    endpoint,
                    access_key_id,
                    secret_access_key,
                })
            }
            _ => None,
        };

        Ok(Config {
            data_source,
            database_url,
            pdf_renderer_url: optional_env("PDF_RENDERER_URL")
                .unwrap_or_else(|| "http://localhost:3001".to_string()),
            s3,
            company_address: optional_env("COMPANY_ADDRESS")
                .unwrap_or_else(|| "Registered Office".to_string()),
            offer_validity_days: parse_validity_days(
                optional_env("OFFER_VALIDITY_DAYS").as_deref().unwrap_or("7"),
            )?,
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Upper bound for `OFFER_VALIDITY_DAYS`.
pub const MAX_OFFER_VALIDITY_DAYS: i64 = 365;

fn parse_validity_days(raw: &str) -> Result<i64> {
    let days = raw
        .trim()
        .parse::<i64>()
        .context("OFFER_VALIDITY_DAYS must be a whole number of days")?;
    if !(0..=MAX_OFFER_VALIDITY_DAYS).contains(&days) {
        bail!("OFFER_VALIDITY_DAYS must be between 0 and {MAX_OFFER_VALIDITY_DAYS}, got {days}");
    }
    Ok(days)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
