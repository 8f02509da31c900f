use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Service configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Base URL of the Product record store (a generic JSON store).
    pub store_url: String,
    /// How long a bid submission may wait for the per-product lock.
    pub lock_timeout_ms: u64,
    /// Interval of the background auction state sweep, in seconds.
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3000"),
            store_url: try_load("STORE_URL", "http://localhost:3001"),
            lock_timeout_ms: try_load("LOCK_TIMEOUT_MS", "2000"),
            sweep_interval_secs: try_load("SWEEP_INTERVAL_SECS", "1"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("{:<12} --> {key} not set, falling back to default", "Config");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{:<12} --> {key} defaulting to {default}", "Config");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("{:<12} --> invalid {key} value: {e}", "Config");
        })
        .expect("Environment misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_is_empty() {
        env::remove_var("PORT");
        env::remove_var("STORE_URL");
        env::remove_var("LOCK_TIMEOUT_MS");
        env::remove_var("SWEEP_INTERVAL_SECS");
        let config = Config::load();
        assert_eq!(config.port, 3000);
        assert_eq!(config.store_url, "http://localhost:3001");
        assert_eq!(config.lock_timeout_ms, 2000);
        assert_eq!(config.sweep_interval_secs, 1);
    }
}
