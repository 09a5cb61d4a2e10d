//! Tier S: the semi-permanent soccer team/league index.
//!
//! Built by crawling every soccer league the primary provider exposes.
//! Two structures: a flat vector of league metadata, and a hash map from
//! `provider_team_id` to the indices of every league that team appears in.
//! This avoids a per-team allocation graph when a team plays across several
//! competitions (e.g. domestic league + continental cup).

use rustc_hash::FxHashMap;
use std::fmt;

/// One of the tags a soccer league can carry. A league may carry several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeagueTag {
    Domestic,
    Continental,
    World,
    Club,
    National,
    League,
    Cup,
    Mens,
    Womens,
    Youth,
}

impl fmt::Display for LeagueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeagueTag::Domestic => "domestic",
            LeagueTag::Continental => "continental",
            LeagueTag::World => "world",
            LeagueTag::Club => "club",
            LeagueTag::National => "national",
            LeagueTag::League => "league",
            LeagueTag::Cup => "cup",
            LeagueTag::Mens => "mens",
            LeagueTag::Womens => "womens",
            LeagueTag::Youth => "youth",
        };
        f.write_str(s)
    }
}

/// Derive a league's tag set from its slug by pattern match. A league slug
/// like `uefa.champions` yields `{continental, club, league, mens}`; `eng.1`
/// yields `{domestic, club, league, mens}`.
pub fn tags_for_league_slug(slug: &str) -> Vec<LeagueTag> {
    let lower = slug.to_lowercase();
    let mut tags = Vec::new();

    if lower.starts_with("uefa.") || lower.starts_with("concacaf.") || lower.starts_with("conmebol.")
    {
        tags.push(LeagueTag::Continental);
    } else if lower.starts_with("fifa.") {
        tags.push(LeagueTag::World);
    } else {
        tags.push(LeagueTag::Domestic);
    }

    if lower.contains("cup") || lower.contains("copa") {
        tags.push(LeagueTag::Cup);
    } else {
        tags.push(LeagueTag::League);
    }

    if lower.contains(".w") || lower.contains("women") {
        tags.push(LeagueTag::Womens);
    } else {
        tags.push(LeagueTag::Mens);
    }

    if lower.contains("u17") || lower.contains("u20") || lower.contains("u21") || lower.contains("youth")
    {
        tags.push(LeagueTag::Youth);
    }

    if lower.starts_with("fifa.worldq") {
        tags.push(LeagueTag::National);
    } else {
        tags.push(LeagueTag::Club);
    }

    tags
}

/// Per-league metadata, one row per soccer competition known to Tier S.
#[derive(Debug, Clone)]
pub struct LeagueMeta {
    pub slug: String,
    pub name: String,
    pub abbreviation: String,
    pub logo_url: Option<String>,
    pub team_count: usize,
    pub tags: Vec<LeagueTag>,
}

/// The reverse index: which leagues a given provider team id appears in,
/// plus the league metadata vector it indexes into.
#[derive(Debug, Clone, Default)]
pub struct SoccerTeamLeagueIndex {
    leagues: Vec<LeagueMeta>,
    /// provider_team_id -> indices into `leagues`. `FxHashMap` over `std`'s
    /// default hasher: this map is on the per-team hot path of every soccer
    /// fan-out lookup, and team ids are trusted internal keys, not
    /// attacker-controlled input.
    team_to_leagues: FxHashMap<String, Vec<usize>>,
}

impl SoccerTeamLeagueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a league's metadata and the teams found playing in it this
    /// crawl. Idempotent: re-registering the same slug replaces its row and
    /// team associations rather than duplicating them.
    pub fn register_league(&mut self, meta: LeagueMeta, provider_team_ids: &[String]) {
        if let Some(existing_idx) = self.leagues.iter().position(|l| l.slug == meta.slug) {
            self.leagues[existing_idx] = meta;
            for teams in self.team_to_leagues.values_mut() {
                teams.retain(|&idx| idx != existing_idx);
            }
            for team_id in provider_team_ids {
                self.team_to_leagues
                    .entry(team_id.clone())
                    .or_default()
                    .push(existing_idx);
            }
        } else {
            let idx = self.leagues.len();
            self.leagues.push(meta);
            for team_id in provider_team_ids {
                self.team_to_leagues.entry(team_id.clone()).or_default().push(idx);
            }
        }
    }

    /// All league slugs a team appears in, for the soccer multi-league fan-out.
    pub fn leagues_for_team(&self, provider_team_id: &str) -> Vec<&str> {
        self.team_to_leagues
            .get(provider_team_id)
            .map(|idxs| idxs.iter().filter_map(|&i| self.leagues.get(i)).map(|l| l.slug.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn league_meta(&self, slug: &str) -> Option<&LeagueMeta> {
        self.leagues.iter().find(|l| l.slug == slug)
    }

    pub fn league_count(&self) -> usize {
        self.leagues.len()
    }

    pub fn team_count(&self) -> usize {
        self.team_to_leagues.len()
    }

    pub fn all_leagues(&self) -> &[LeagueMeta] {
        &self.leagues
    }
}

/// Summary row written once per full refresh (`soccer_cache_meta`).
#[derive(Debug, Clone)]
pub struct CacheRefreshSummary {
    pub leagues_processed: usize,
    pub teams_indexed: usize,
    pub duration: std::time::Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(slug: &str, name: &str) -> LeagueMeta {
        LeagueMeta {
            slug: slug.to_string(),
            name: name.to_string(),
            abbreviation: name.chars().take(3).collect(),
            logo_url: None,
            team_count: 0,
            tags: tags_for_league_slug(slug),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut idx = SoccerTeamLeagueIndex::new();
        idx.register_league(meta("eng.1", "Premier League"), &["tottenham".to_string()]);
        idx.register_league(
            meta("uefa.champions", "UEFA Champions League"),
            &["tottenham".to_string()],
        );

        let leagues = idx.leagues_for_team("tottenham");
        assert_eq!(leagues.len(), 2);
        assert!(leagues.contains(&"eng.1"));
        assert!(leagues.contains(&"uefa.champions"));
    }

    #[test]
    fn test_team_in_single_league() {
        let mut idx = SoccerTeamLeagueIndex::new();
        idx.register_league(meta("usa.1", "MLS"), &["inter-miami".to_string()]);

        assert_eq!(idx.leagues_for_team("inter-miami"), vec!["usa.1"]);
        assert_eq!(idx.leagues_for_team("nonexistent"), Vec::<&str>::new());
    }

    #[test]
    fn test_reregistering_league_is_idempotent() {
        let mut idx = SoccerTeamLeagueIndex::new();
        idx.register_league(meta("eng.1", "Premier League"), &["arsenal".to_string()]);
        idx.register_league(meta("eng.1", "Premier League"), &["arsenal".to_string(), "chelsea".to_string()]);

        assert_eq!(idx.league_count(), 1);
        assert_eq!(idx.leagues_for_team("arsenal"), vec!["eng.1"]);
        assert_eq!(idx.leagues_for_team("chelsea"), vec!["eng.1"]);
    }

    #[test]
    fn test_tags_for_domestic_league() {
        let tags = tags_for_league_slug("eng.1");
        assert!(tags.contains(&LeagueTag::Domestic));
        assert!(tags.contains(&LeagueTag::Club));
        assert!(tags.contains(&LeagueTag::League));
        assert!(tags.contains(&LeagueTag::Mens));
    }

    #[test]
    fn test_tags_for_continental_cup() {
        let tags = tags_for_league_slug("uefa.champions");
        assert!(tags.contains(&LeagueTag::Continental));
        assert!(tags.contains(&LeagueTag::Club));
    }

    #[test]
    fn test_tags_multi_valued() {
        let tags = tags_for_league_slug("uefa.europa");
        assert!(tags.len() >= 3);
    }
}
