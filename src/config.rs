use std::net::SocketAddr;

use anyhow::Context;

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub session_idle_minutes: i64,
    pub reset_token_minutes: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        let _ = dotenv::dotenv();

        Ok(Config {
            database_url: dotenv::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            listen_addr: var_or("LISTEN_ADDR", "0.0.0.0:8080")?,
            session_idle_minutes: var_or("SESSION_IDLE_MINUTES", "60")?,
            reset_token_minutes: var_or("RESET_TOKEN_MINUTES", "15")?,
        })
    }

    /// Settings for tests and local tinkering: in-memory database.
    pub fn in_memory() -> Config {
        Config {
            database_url: "sqlite::memory:".to_owned(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            session_idle_minutes: 60,
            reset_token_minutes: 15,
        }
    }
}

fn var_or<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = dotenv::var(key).unwrap_or_else(|_| default.to_owned());
    raw.parse().with_context(|| format!("{key}={raw:?} is not valid"))
}
