use anyhow::{Context, Result, bail};
use std::str::FromStr;

use super::config_model::{Analytics, BackendServer, Database, DotEnvyConfig, Supabase};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const MAX_CACHE_TTL_MINUTES: i64 = 7 * 24 * 60;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

pub fn from_lookup<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let backend_server = BackendServer {
        port: required(&lookup, "SERVER_PORT_BACKEND")?,
        body_limit: required(&lookup, "SERVER_BODY_LIMIT")?,
        timeout: required(&lookup, "SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required(&lookup, "DATABASE_URL")?,
        max_connections: optional(&lookup, "DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
    };

    let supabase = Supabase {
        jwt_secret: required(&lookup, "SUPABASE_JWT_SECRET")?,
    };

    let defaults = Analytics::default();
    let analytics = Analytics {
        cache_ttl_minutes: optional(&lookup, "ANALYTICS_CACHE_TTL_MINUTES")?
            .unwrap_or(defaults.cache_ttl_minutes),
        strict_time_range: match lookup("ANALYTICS_STRICT_TIME_RANGE") {
            Some(raw) if !raw.trim().is_empty() => parse_bool(&raw)
                .with_context(|| format!("ANALYTICS_STRICT_TIME_RANGE is invalid: {raw}"))?,
            _ => defaults.strict_time_range,
        },
    };
    if !(1..=MAX_CACHE_TTL_MINUTES).contains(&analytics.cache_ttl_minutes) {
        bail!(
            "ANALYTICS_CACHE_TTL_MINUTES must be between 1 and {MAX_CACHE_TTL_MINUTES}, got {}",
            analytics.cache_ttl_minutes
        );
    }

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        analytics,
    })
}

fn required<F, T>(lookup: &F, key: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{key} is missing"))?;
    raw.trim()
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

fn optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} is invalid")),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => bail!("not a boolean: {other}"),
    }
}
