use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration, loaded from the environment (with optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,

    pub board_base_url: String,
    pub board: String,

    /// Discovery cycle cadence.
    pub poll_interval: Duration,
    /// Delay between two outbound sends within one fan-out.
    pub send_delay: Duration,
    /// How often the filter pattern set is reloaded from the store.
    pub pattern_refresh: Duration,
    /// Connect + request timeout for board API calls.
    pub http_timeout: Duration,

    /// Capacity of the discovery -> dispatch channel. A full channel blocks
    /// the discovery enqueue pass, which is the backpressure mechanism.
    pub queue_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| Error::Config("BOT_TOKEN environment variable is required".to_string()))?;

        let database_url = postgres_url_from_env()?;

        let board_base_url = env_str("BOARD_BASE_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://2ch.hk".to_string())
            .trim_end_matches('/')
            .to_string();
        let board = env_str("BOARD")
            .and_then(non_empty)
            .unwrap_or_else(|| "b".to_string());

        let poll_interval = Duration::from_secs(env_u64("CHECK_RATE_SECONDS").unwrap_or(60));
        let send_delay = Duration::from_secs(env_u64("SEND_DELAY_SECONDS").unwrap_or(3));
        let pattern_refresh = Duration::from_secs(env_u64("PATTERN_REFRESH_SECONDS").unwrap_or(60));
        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT_SECONDS").unwrap_or(10));

        let queue_capacity = env_usize("QUEUE_CAPACITY").unwrap_or(64).max(1);

        Ok(Self {
            bot_token,
            database_url,
            board_base_url,
            board,
            poll_interval,
            send_delay,
            pattern_refresh,
            http_timeout,
            queue_capacity,
        })
    }
}

fn postgres_url_from_env() -> Result<String> {
    postgres_url(env_str)
}

/// The five discrete Postgres settings are all required; a missing or empty
/// one is a startup error naming the offending key.
fn postgres_url(get: impl Fn(&str) -> Option<String>) -> Result<String> {
    let require = |key: &str| {
        get(key)
            .and_then(non_empty)
            .ok_or_else(|| Error::Config(format!("env variable for database is empty: {key}")))
    };

    let user = require("POSTGRES_USER")?;
    let password = require("POSTGRES_PASSWORD")?;
    let host = require("POSTGRES_HOST")?;
    let port = require("POSTGRES_PORT")?;
    let db = require("POSTGRES_DB")?;
    Ok(format!(
        "postgresql://{user}:{password}@{host}:{port}/{db}?sslmode=disable"
    ))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
