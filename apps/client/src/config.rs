use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Locale;
use url::Url;

use crate::identity::HostContext;

/// Default reconciliation period (seconds).
const REFRESH_INTERVAL_SECS: u64 = 30;
/// Delay between inserting a slot panel and revealing it.
const REVEAL_DELAY_MS: u64 = 50;
/// Length of the panel hide transition.
const TEARDOWN_DELAY_MS: u64 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub refresh_interval: Duration,
    pub reveal_delay: Duration,
    pub teardown_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            reveal_delay: Duration::from_millis(REVEAL_DELAY_MS),
            teardown_delay: Duration::from_millis(TEARDOWN_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub locale: Locale,
    pub timings: Timings,
    pub prefs_path: PathBuf,
    pub host: HostContext,
}

impl Config {
    /// Read configuration from the environment (after `.env`, if any).
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:80".into());
        let api_base_url = Url::parse(&api_base_url)
            .with_context(|| format!("API_BASE_URL is not a valid URL: {api_base_url}"))?;

        let locale_name = std::env::var("LOCALE").unwrap_or_else(|_| "ru_RU".into());
        let locale = parse_locale(&locale_name)?;

        let refresh_secs = match std::env::var("REFRESH_INTERVAL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| format!("REFRESH_INTERVAL_SECS must be a positive number, got {raw:?}"))?,
            Err(_) => REFRESH_INTERVAL_SECS,
        };
        let timings = Timings {
            refresh_interval: Duration::from_secs(refresh_secs),
            ..Timings::default()
        };

        let prefs_path = std::env::var("PREFS_PATH")
            .unwrap_or_else(|_| "print-slots-prefs.json".into())
            .into();

        let host = HostContext {
            init_data: non_empty_var("TG_INIT_DATA"),
            color_scheme: non_empty_var("TG_COLOR_SCHEME"),
            launch_url: non_empty_var("LAUNCH_URL"),
        };

        Ok(Self {
            api_base_url,
            locale,
            timings,
            prefs_path,
            host,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn parse_locale(name: &str) -> anyhow::Result<Locale> {
    Locale::try_from(name.trim()).map_err(|_| anyhow::anyhow!("unknown locale: {name}"))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let t = Timings::default();
        assert_eq!(t.refresh_interval, Duration::from_secs(30));
        assert!(t.reveal_delay < t.teardown_delay);
    }

    #[test]
    fn test_parse_known_locale() {
        assert!(matches!(parse_locale("ru_RU"), Ok(Locale::ru_RU)));
        assert!(matches!(parse_locale(" en_US "), Ok(Locale::en_US)));
    }

    #[test]
    fn test_parse_unknown_locale() {
        assert!(parse_locale("xx_YY").is_err());
    }
}
