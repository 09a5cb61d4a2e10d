//! League configuration for supported sports.
//!
//! Maps a canonical league code to the primary provider's sport/league slug
//! pair, the default per-sport programme duration, and any `groups` query
//! parameter required for college sports to return the full D1/FBS field.

use std::time::Duration;

/// Configuration for a single supported league.
#[derive(Debug, Clone)]
pub struct LeagueConfig {
    /// Canonical league code as used in Team/Template records (e.g. "nfl", "eng.1").
    pub league_code: &'static str,
    /// Upstream sport slug (e.g. "football", "basketball").
    pub sport_slug: &'static str,
    /// Upstream league slug (e.g. "nfl", "eng.1").
    pub league_slug: &'static str,
    /// Default game programme duration, used when a template's `game_duration_mode`
    /// is `sport`.
    pub default_duration: Duration,
    /// `groups` query parameter required for the scoreboard to return the full
    /// college field. `None` for professional leagues.
    pub groups_param: Option<&'static str>,
    /// True for soccer leagues, which participate in the Tier-S multi-league index.
    pub is_soccer: bool,
}

/// Static configuration for all supported leagues.
pub static LEAGUE_CONFIGS: &[LeagueConfig] = &[
    LeagueConfig {
        league_code: "nfl",
        sport_slug: "football",
        league_slug: "nfl",
        default_duration: Duration::from_secs(3 * 3600 + 1800),
        groups_param: None,
        is_soccer: false,
    },
    LeagueConfig {
        league_code: "ncaaf",
        sport_slug: "football",
        league_slug: "college-football",
        default_duration: Duration::from_secs(3 * 3600 + 1800),
        groups_param: Some("80"),
        is_soccer: false,
    },
    LeagueConfig {
        league_code: "nba",
        sport_slug: "basketball",
        league_slug: "nba",
        default_duration: Duration::from_secs(2 * 3600 + 1800),
        groups_param: None,
        is_soccer: false,
    },
    LeagueConfig {
        league_code: "ncaab",
        sport_slug: "basketball",
        league_slug: "mens-college-basketball",
        default_duration: Duration::from_secs(2 * 3600 + 1800),
        groups_param: Some("50"),
        is_soccer: false,
    },
    LeagueConfig {
        league_code: "nhl",
        sport_slug: "hockey",
        league_slug: "nhl",
        default_duration: Duration::from_secs(2 * 3600 + 1800),
        groups_param: None,
        is_soccer: false,
    },
    LeagueConfig {
        league_code: "mlb",
        sport_slug: "baseball",
        league_slug: "mlb",
        default_duration: Duration::from_secs(3 * 3600 + 1800),
        groups_param: None,
        is_soccer: false,
    },
    LeagueConfig {
        league_code: "eng.1",
        sport_slug: "soccer",
        league_slug: "eng.1",
        default_duration: Duration::from_secs(2 * 3600),
        groups_param: None,
        is_soccer: true,
    },
    LeagueConfig {
        league_code: "esp.1",
        sport_slug: "soccer",
        league_slug: "esp.1",
        default_duration: Duration::from_secs(2 * 3600),
        groups_param: None,
        is_soccer: true,
    },
    LeagueConfig {
        league_code: "ger.1",
        sport_slug: "soccer",
        league_slug: "ger.1",
        default_duration: Duration::from_secs(2 * 3600),
        groups_param: None,
        is_soccer: true,
    },
    LeagueConfig {
        league_code: "ita.1",
        sport_slug: "soccer",
        league_slug: "ita.1",
        default_duration: Duration::from_secs(2 * 3600),
        groups_param: None,
        is_soccer: true,
    },
    LeagueConfig {
        league_code: "fra.1",
        sport_slug: "soccer",
        league_slug: "fra.1",
        default_duration: Duration::from_secs(2 * 3600),
        groups_param: None,
        is_soccer: true,
    },
    LeagueConfig {
        league_code: "usa.1",
        sport_slug: "soccer",
        league_slug: "usa.1",
        default_duration: Duration::from_secs(2 * 3600),
        groups_param: None,
        is_soccer: true,
    },
    LeagueConfig {
        league_code: "uefa.champions",
        sport_slug: "soccer",
        league_slug: "uefa.champions",
        default_duration: Duration::from_secs(2 * 3600),
        groups_param: None,
        is_soccer: true,
    },
];

/// Get league configuration by canonical code.
pub fn get_league_config(league: &str) -> Option<&'static LeagueConfig> {
    LEAGUE_CONFIGS
        .iter()
        .find(|c| c.league_code.eq_ignore_ascii_case(league))
}

/// Get all league configurations.
pub fn get_all_league_configs() -> &'static [LeagueConfig] {
    LEAGUE_CONFIGS
}

/// Get list of all league codes.
pub fn get_all_league_codes() -> Vec<&'static str> {
    LEAGUE_CONFIGS.iter().map(|c| c.league_code).collect()
}

/// Sport-default programme duration table (`game_duration_mode == sport`),
/// consulted when a league code isn't in [`LEAGUE_CONFIGS`] (e.g. a soccer
/// league discovered only through the Tier-S index).
pub fn default_duration_for_sport_slug(sport_slug: &str) -> Duration {
    match sport_slug {
        "football" => Duration::from_secs(3 * 3600 + 1800),
        "basketball" => Duration::from_secs(2 * 3600 + 1800),
        "hockey" => Duration::from_secs(2 * 3600 + 1800),
        "baseball" => Duration::from_secs(3 * 3600 + 1800),
        "soccer" => Duration::from_secs(2 * 3600),
        _ => Duration::from_secs(3 * 3600),
    }
}
