use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};

use crate::recommend::engine::RankingConfig;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    pub jwt: JwtConfig,
    pub ranking: RankingConfig,
    /// Mounts `/api/v1/dev-samples`. Off unless explicitly enabled.
    pub enable_dev_samples: bool,
}

/// Secret and lifetime used to issue and validate bearer tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = RankingConfig::default();
        let ranking = RankingConfig {
            score_min: optional_env("RECOMMEND_SCORE_MIN", defaults.score_min)?,
            score_max: optional_env("RECOMMEND_SCORE_MAX", defaults.score_max)?,
            saturation: optional_env("RECOMMEND_SATURATION", defaults.saturation)?,
            low_risk_margin: optional_env("RECOMMEND_LOW_RISK_MARGIN", defaults.low_risk_margin)?,
            high_risk_margin: optional_env(
                "RECOMMEND_HIGH_RISK_MARGIN",
                defaults.high_risk_margin,
            )?,
        };
        ranking.validate()?;

        let ttl_raw = std::env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| "7d".to_string());

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: optional_env("DB_MAX_CONNECTIONS", 10)?,
            port: optional_env("PORT", 3000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            jwt: JwtConfig {
                secret: require_env("JWT_SECRET")?,
                ttl: parse_ttl(&ttl_raw)
                    .with_context(|| format!("JWT_EXPIRES_IN '{ttl_raw}' is not a valid duration"))?,
            },
            ranking,
            enable_dev_samples: optional_env("ENABLE_DEV_SAMPLES", false)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Parses token lifetimes written as `7d`, `12h`, `30m`, `45s` or bare seconds.
pub fn parse_ttl(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c)),
        Some(_) => (raw, None),
        None => bail!("empty duration"),
    };
    let amount: i64 = digits.parse().context("duration amount must be an integer")?;
    if amount <= 0 {
        bail!("duration must be positive");
    }

    let ttl = match unit {
        None | Some('s') => Duration::try_seconds(amount),
        Some('m') => Duration::try_minutes(amount),
        Some('h') => Duration::try_hours(amount),
        Some('d') => Duration::try_days(amount),
        Some(other) => bail!("unknown duration unit '{other}'"),
    }
    .context("duration out of range")?;

    // Every issued token computes `now + ttl`; it must stay representable.
    if Utc::now().checked_add_signed(ttl).is_none() {
        bail!("duration out of range");
    }
    Ok(ttl)
}
