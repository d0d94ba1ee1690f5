// src/config/mod.rs
//! Service configuration, sourced from the environment (`.env` in dev).

pub mod ai;

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::pipeline::PipelineCfg;
use crate::summarize::DEFAULT_MAX_TOKENS;

pub const DEFAULT_STORE_PATH: &str = "data/posts.json";
pub const DEFAULT_RUN_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9100";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_token: String,
    pub channel_id: String,
    pub store_path: String,
    pub metrics_addr: SocketAddr,
    pub pipeline: PipelineCfg,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; `from_env` is the production lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let discord_token = required("DISCORD_BOT_TOKEN")?;
        let channel_id = required("DISCORD_CHANNEL_ID")?;
        if !channel_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                key: "DISCORD_CHANNEL_ID",
                value: channel_id,
            });
        }

        let store_path = get("POSTS_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());

        let interval_secs = parse_positive(&get, "RUN_INTERVAL_SECS", DEFAULT_RUN_INTERVAL_SECS)?;
        let lookback_secs = parse_positive(&get, "LOOKBACK_SECS", interval_secs.saturating_mul(2))?;
        let concurrency = parse_positive(&get, "SUMMARY_CONCURRENCY", 4)? as usize;

        let metrics_raw = get("METRICS_ADDR").unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string());
        let metrics_addr = metrics_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "METRICS_ADDR",
                value: metrics_raw.clone(),
            })?;

        let pipeline = PipelineCfg {
            interval: Duration::from_secs(interval_secs),
            lookback: Duration::from_secs(lookback_secs),
            concurrency,
            max_tokens: DEFAULT_MAX_TOKENS,
            fetch_timeout: Duration::from_secs(parse_positive(&get, "FETCH_TIMEOUT_SECS", 10)?),
            completion_timeout: Duration::from_secs(parse_positive(
                &get,
                "COMPLETION_TIMEOUT_SECS",
                30,
            )?),
            persist_timeout: Duration::from_secs(parse_positive(&get, "PERSIST_TIMEOUT_SECS", 10)?),
            notify_timeout: Duration::from_secs(parse_positive(&get, "NOTIFY_TIMEOUT_SECS", 10)?),
        };

        Ok(Self {
            discord_token,
            channel_id,
            store_path,
            metrics_addr,
            pipeline,
        })
    }
}

// positive integer env value (seconds or counts), or the default when unset
fn parse_positive<F>(get: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}
