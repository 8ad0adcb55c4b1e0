use crate::core::bug_reports::BugReportConfig;
use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DISCORD_TOKEN_VAR: &str = "DISCORD_TOKEN";
const CHANNEL_ID_VAR: &str = "BUG_REPORT_CHANNEL_ID";
const BRAND_TAG_VAR: &str = "BUG_REPORT_BRAND_TAG";
const COOLDOWN_VAR: &str = "BUG_REPORT_COOLDOWN_SECS";
const BRIDGE_URL_VAR: &str = "SQUAD_BRIDGE_URL";
const BRIDGE_TOKEN_VAR: &str = "SQUAD_BRIDGE_TOKEN";
const TIMEOUT_VAR: &str = "COLLABORATOR_TIMEOUT_SECS";
const PRUNE_INTERVAL_VAR: &str = "COOLDOWN_PRUNE_INTERVAL_SECS";

const DEFAULT_BRAND_TAG: &str = "[BUG]";
const DEFAULT_COOLDOWN_SECS: u64 = 60;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 600;
/// One week. Longer windows are almost certainly a typo.
const MAX_COOLDOWN_SECS: u64 = 7 * 24 * 60 * 60;

/// Everything the relay reads at startup. Static afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub channel_id: u64,
    pub bridge_url: String,
    pub bridge_token: Option<String>,
    pub prune_interval: Duration,
    pub reports: BugReportConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key -> value lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let discord_token = non_empty(DISCORD_TOKEN_VAR).context(
            "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
        )?;

        let raw_channel = non_empty(CHANNEL_ID_VAR).context(
            "BUG_REPORT_CHANNEL_ID is missing. Set it to the Discord channel for bug reports.",
        )?;
        let channel_id: u64 = parse_var(CHANNEL_ID_VAR, &raw_channel)?;
        if channel_id == 0 {
            bail!("BUG_REPORT_CHANNEL_ID must be a non-zero Discord channel ID");
        }

        let bridge_url = non_empty(BRIDGE_URL_VAR).context(
            "SQUAD_BRIDGE_URL is missing. Point it at the game-server bridge (e.g. http://127.0.0.1:8080).",
        )?;

        let brand_tag = non_empty(BRAND_TAG_VAR).unwrap_or_else(|| DEFAULT_BRAND_TAG.to_string());

        let cooldown_secs: u64 = match non_empty(COOLDOWN_VAR) {
            Some(raw) => parse_var(COOLDOWN_VAR, &raw)?,
            None => DEFAULT_COOLDOWN_SECS,
        };
        if cooldown_secs > MAX_COOLDOWN_SECS {
            bail!("{COOLDOWN_VAR} must be at most {MAX_COOLDOWN_SECS} seconds (one week)");
        }
        let timeout_secs = match non_empty(TIMEOUT_VAR) {
            Some(raw) => parse_var(TIMEOUT_VAR, &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let prune_secs: u64 = match non_empty(PRUNE_INTERVAL_VAR) {
            Some(raw) => parse_var(PRUNE_INTERVAL_VAR, &raw)?,
            None => DEFAULT_PRUNE_INTERVAL_SECS,
        };
        if timeout_secs == 0 || prune_secs == 0 {
            bail!("{TIMEOUT_VAR} and {PRUNE_INTERVAL_VAR} must be greater than zero");
        }

        Ok(Config {
            discord_token,
            channel_id,
            bridge_url,
            bridge_token: non_empty(BRIDGE_TOKEN_VAR),
            prune_interval: Duration::from_secs(prune_secs),
            reports: BugReportConfig {
                brand_tag,
                cooldown: Duration::from_secs(cooldown_secs),
                collaborator_timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{key} `{raw}` is not a valid number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DISCORD_TOKEN", "token"),
        ("BUG_REPORT_CHANNEL_ID", "667741905228136459"),
        ("SQUAD_BRIDGE_URL", "http://127.0.0.1:8080"),
    ];

    #[test]
    fn test_defaults_apply() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.channel_id, 667741905228136459);
        assert_eq!(config.reports.brand_tag, "[BUG]");
        assert_eq!(config.reports.cooldown, Duration::from_secs(60));
        assert_eq!(config.reports.collaborator_timeout, Duration::from_secs(10));
        assert_eq!(config.prune_interval, Duration::from_secs(600));
        assert!(config.bridge_token.is_none());
    }

    #[test]
    fn test_overrides_are_read() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("BUG_REPORT_BRAND_TAG", "[REPORT]"));
        vars.push(("BUG_REPORT_COOLDOWN_SECS", "120"));
        vars.push(("SQUAD_BRIDGE_TOKEN", "s3cret"));

        let config = load(&vars).unwrap();
        assert_eq!(config.reports.brand_tag, "[REPORT]");
        assert_eq!(config.reports.cooldown, Duration::from_secs(120));
        assert_eq!(config.bridge_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_channel_id_is_required() {
        let err = load(&REQUIRED[..1]).unwrap_err();
        assert!(err.to_string().contains("BUG_REPORT_CHANNEL_ID"));
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("BUG_REPORT_COOLDOWN_SECS", "a minute"));
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("BUG_REPORT_COOLDOWN_SECS"));
    }

    #[test]
    fn test_cooldown_is_capped_at_a_week() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("BUG_REPORT_COOLDOWN_SECS", "10000000000000"));
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("at most 604800"));

        let mut vars = REQUIRED.to_vec();
        vars.push(("BUG_REPORT_COOLDOWN_SECS", "604800"));
        assert_eq!(
            load(&vars).unwrap().reports.cooldown,
            Duration::from_secs(604_800)
        );
    }
}
