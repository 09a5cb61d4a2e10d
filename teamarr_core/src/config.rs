//! Process-wide configuration, loaded once at startup.
//!
//! Each field is read from the environment with a documented default, and a
//! value that's present but unparsable produces a
//! [`TeamarrError::UpstreamMalformed`] rather than a panic — the orchestrator
//! has to be able to report "bad config" as a recoverable run failure, not
//! crash the process.

use crate::error::{Result, TeamarrError};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    /// IANA timezone name used for display formatting (e.g. `America/New_York`).
    pub epg_timezone: String,
    pub days_ahead: u32,
    /// Per-sport-slug override of the league_config default durations.
    pub default_durations: HashMap<String, Duration>,
    /// Global programme duration used when a template's `game_duration_mode`
    /// is `default` (as opposed to `sport` or `custom`).
    pub default_game_duration: Duration,
    pub output_path: String,
    pub espn_site_base_url: String,
    pub espn_core_base_url: String,
    pub tsdb_base_url: String,
    pub http_timeout_secs: u64,
    pub max_retries: u32,
    pub generation_deadline_secs: u64,
    pub team_concurrency: usize,
    pub soccer_fanout_concurrency: usize,
    pub tier_s_refresh_concurrency: usize,
    pub database_url: String,
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| TeamarrError::upstream_malformed(key, format!("invalid value '{}': {}", raw, e))),
    }
}

impl Settings {
    /// Load configuration from the process environment.
    ///
    /// Malformed (present but unparsable) values return
    /// [`TeamarrError::UpstreamMalformed`]-shaped context so callers can log
    /// specifically which key was bad; callers at the binary boundary
    /// typically wrap this with `anyhow::Context` and exit.
    pub fn from_env() -> Result<Self> {
        let days_ahead: u32 = parse_env("TEAMARR_DAYS_AHEAD", 7)?;
        let http_timeout_secs: u64 = parse_env("TEAMARR_HTTP_TIMEOUT_SECS", 10)?;
        let max_retries: u32 = parse_env("TEAMARR_MAX_RETRIES", 3)?;
        let generation_deadline_secs: u64 = parse_env("TEAMARR_GENERATION_DEADLINE_SECS", 600)?;
        let team_concurrency: usize = parse_env("TEAMARR_TEAM_CONCURRENCY", 16)?;
        let soccer_fanout_concurrency: usize = parse_env("TEAMARR_SOCCER_FANOUT_CONCURRENCY", 5)?;
        let tier_s_refresh_concurrency: usize = parse_env("TEAMARR_TIER_S_REFRESH_CONCURRENCY", 50)?;
        let default_game_duration_minutes: u64 = parse_env("TEAMARR_DEFAULT_GAME_DURATION_MINUTES", 180)?;

        Ok(Self {
            epg_timezone: env::var("TEAMARR_EPG_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            days_ahead,
            default_durations: HashMap::new(),
            default_game_duration: Duration::from_secs(default_game_duration_minutes * 60),
            output_path: env::var("TEAMARR_OUTPUT_PATH").unwrap_or_else(|_| "teamarr.xml".to_string()),
            espn_site_base_url: env::var("TEAMARR_ESPN_SITE_BASE_URL")
                .unwrap_or_else(|_| "https://site.api.espn.com/apis/site/v2/sports".to_string()),
            espn_core_base_url: env::var("TEAMARR_ESPN_CORE_BASE_URL")
                .unwrap_or_else(|_| "https://sports.core.api.espn.com/v2/sports".to_string()),
            tsdb_base_url: env::var("TEAMARR_TSDB_BASE_URL")
                .unwrap_or_else(|_| "https://www.thesportsdb.com/api/v1/json/3".to_string()),
            http_timeout_secs,
            max_retries,
            generation_deadline_secs,
            team_concurrency,
            soccer_fanout_concurrency,
            tier_s_refresh_concurrency,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://teamarr.db".to_string()),
        })
    }

    /// Convenience constructor for tests.
    pub fn for_test() -> Self {
        Self {
            epg_timezone: "UTC".to_string(),
            days_ahead: 7,
            default_durations: HashMap::new(),
            default_game_duration: Duration::from_secs(180 * 60),
            output_path: "/tmp/teamarr-test.xml".to_string(),
            espn_site_base_url: "http://127.0.0.1:0".to_string(),
            espn_core_base_url: "http://127.0.0.1:0".to_string(),
            tsdb_base_url: "http://127.0.0.1:0".to_string(),
            http_timeout_secs: 5,
            max_retries: 3,
            generation_deadline_secs: 60,
            team_concurrency: 4,
            soccer_fanout_concurrency: 2,
            tier_s_refresh_concurrency: 8,
            database_url: "sqlite::memory:".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_test()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_test_has_sane_defaults() {
        let s = Settings::for_test();
        assert_eq!(s.days_ahead, 7);
        assert_eq!(s.epg_timezone, "UTC");
    }

    #[test]
    fn test_parse_env_missing_uses_default() {
        env::remove_var("TEAMARR_DOES_NOT_EXIST");
        let v: u32 = parse_env("TEAMARR_DOES_NOT_EXIST", 42).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn test_parse_env_malformed_is_configuration_error() {
        env::set_var("TEAMARR_TEST_BAD_INT", "not-a-number");
        let result: Result<u32> = parse_env("TEAMARR_TEST_BAD_INT", 1);
        assert!(result.is_err());
        env::remove_var("TEAMARR_TEST_BAD_INT");
    }
}
