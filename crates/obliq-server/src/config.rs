//! Environment-driven server configuration
//!
//! Every knob has a validated fallback; a malformed value falls back to
//! the default rather than aborting startup, with the token as the one
//! exception (there is no safe default for a shared secret).

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_TICKER_INTERVAL_SECS: u64 = 300;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// Bearer token the sweep endpoint requires; `None` fails all
    /// sweep requests closed
    pub sweep_token: Option<String>,
    /// Records per sweep invocation
    pub batch_size: usize,
    /// Whether the in-process interval ticker runs
    pub ticker_enabled: bool,
    /// Ticker period
    pub ticker_interval: Duration,
}

impl ServerConfig {
    /// Read configuration from `OBLIQ_*` environment variables
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let bind_raw = env::var("OBLIQ_HTTP_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .map_err(|err| anyhow::anyhow!("OBLIQ_HTTP_BIND {bind_raw:?} is invalid: {err}"))?;

        let sweep_token = env::var("OBLIQ_SWEEP_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        if sweep_token.is_none() {
            tracing::warn!("OBLIQ_SWEEP_TOKEN is not set; sweep requests will be rejected");
        }

        Ok(Self {
            bind,
            sweep_token,
            batch_size: parse_batch_size(env::var("OBLIQ_SWEEP_BATCH_SIZE").ok().as_deref()),
            ticker_enabled: parse_ticker_enabled(env::var("OBLIQ_TICKER_ENABLED").ok().as_deref()),
            ticker_interval: Duration::from_secs(parse_ticker_interval_secs(
                env::var("OBLIQ_TICKER_INTERVAL_SECS").ok().as_deref(),
            )),
        })
    }
}

fn parse_batch_size(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| (1..=10_000).contains(v))
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

fn parse_ticker_enabled(raw: Option<&str>) -> bool {
    match raw {
        Some(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        ),
        None => false,
    }
}

fn parse_ticker_interval_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| (10..=86_400).contains(v))
        .unwrap_or(DEFAULT_TICKER_INTERVAL_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_falls_back_on_garbage() {
        assert_eq!(parse_batch_size(None), DEFAULT_BATCH_SIZE);
        assert_eq!(parse_batch_size(Some("not a number")), DEFAULT_BATCH_SIZE);
        assert_eq!(parse_batch_size(Some("0")), DEFAULT_BATCH_SIZE);
        assert_eq!(parse_batch_size(Some("50000")), DEFAULT_BATCH_SIZE);
        assert_eq!(parse_batch_size(Some("250")), 250);
    }

    #[test]
    fn ticker_is_off_unless_explicitly_enabled() {
        assert!(!parse_ticker_enabled(None));
        assert!(!parse_ticker_enabled(Some("0")));
        assert!(!parse_ticker_enabled(Some("false")));
        assert!(parse_ticker_enabled(Some("1")));
        assert!(parse_ticker_enabled(Some("TRUE")));
        assert!(parse_ticker_enabled(Some(" on ")));
    }

    #[test]
    fn interval_clamps_to_sane_bounds() {
        assert_eq!(parse_ticker_interval_secs(None), DEFAULT_TICKER_INTERVAL_SECS);
        assert_eq!(
            parse_ticker_interval_secs(Some("1")),
            DEFAULT_TICKER_INTERVAL_SECS
        );
        assert_eq!(parse_ticker_interval_secs(Some("60")), 60);
    }
}
