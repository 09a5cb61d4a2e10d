//! Resolves the "current season" label fed into [`crate::template::variables::build_team_facts`]
//! and used to scope head-to-head history to the current season.
//!
//! Upstream schedule documents report their own season year when the
//! endpoint includes it; that value is authoritative. The calendar heuristic
//! below is a fallback for when it's absent, not the primary source of
//! truth — a pure `year + 1` formula breaks for any team near a season
//! boundary.

use crate::models::Event;
use chrono::{DateTime, Datelike, Utc};

/// Prefers `upstream_season_year` (from the schedule document); falls back to
/// a sport-aware calendar heuristic only when upstream omitted it.
pub fn resolve_current_season(upstream_season_year: Option<i32>, league_code: &str, now_utc: DateTime<Utc>) -> String {
    match upstream_season_year {
        Some(year) => year.to_string(),
        None => calendar_heuristic(league_code, now_utc),
    }
}

/// The season label a given date falls under, by the same calendar heuristic
/// used to resolve the run's current season. Individual schedule events carry
/// no season-year field of their own (only the schedule document as a whole
/// does), so this is the only basis for scoping a per-event comparison
/// against [`resolve_current_season`]'s result.
pub fn season_label_for_date(league_code: &str, date: DateTime<Utc>) -> String {
    calendar_heuristic(league_code, date)
}

/// Filters `schedule` down to events whose own date falls in `current_season`
/// (per [`season_label_for_date`]), so head-to-head and streak computation
/// are scoped to the current season rather than a team-schedule endpoint's
/// full multi-season history.
pub fn filter_current_season(schedule: &[Event], league_code: &str, current_season: &str) -> Vec<Event> {
    schedule
        .iter()
        .filter(|e| season_label_for_date(league_code, e.start_utc) == current_season)
        .cloned()
        .collect()
}

/// Winter-spanning sports (basketball, hockey) label a season that starts in
/// the fall by the calendar year it finishes in, once play has actually
/// crossed into the new year. All other supported sports run within a single
/// calendar year, so the current year is the season label outright.
fn calendar_heuristic(league_code: &str, now_utc: DateTime<Utc>) -> String {
    let year = now_utc.year();
    let month = now_utc.month();
    let sport_slug = crate::league_config::get_league_config(league_code).map(|c| c.sport_slug);

    match sport_slug {
        Some("basketball") | Some("hockey") => {
            if month >= 8 {
                (year + 1).to_string()
            } else {
                year.to_string()
            }
        }
        _ => year.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_upstream_value_takes_precedence() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(resolve_current_season(Some(2025), "nba", now), "2025");
    }

    #[test]
    fn test_basketball_heuristic_crosses_year_boundary() {
        let autumn = Utc.with_ymd_and_hms(2025, 10, 20, 0, 0, 0).unwrap();
        assert_eq!(resolve_current_season(None, "nba", autumn), "2026");

        let spring = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(resolve_current_season(None, "nba", spring), "2026");
    }

    #[test]
    fn test_calendar_year_sport_uses_plain_year() {
        let now = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        assert_eq!(resolve_current_season(None, "nfl", now), "2026");
    }

    fn event_on(date: DateTime<Utc>) -> Event {
        use crate::models::{Competitor, EventStatus, SeasonType};
        Event {
            id: format!("evt-{}", date.timestamp()),
            provider: "espn".to_string(),
            league_code: "nba".to_string(),
            start_utc: date,
            status: EventStatus::Final,
            home: Competitor { team_id: "1".to_string(), name: "Home".to_string(), abbrev: "HOM".to_string(), score: Some(100), record: None },
            away: Competitor { team_id: "2".to_string(), name: "Away".to_string(), abbrev: "AWY".to_string(), score: Some(90), record: None },
            venue: None,
            broadcasts: vec![],
            odds: None,
            player_leaders: Default::default(),
            season_type: SeasonType::Regular,
            source_league: None,
        }
    }

    #[test]
    fn test_season_label_for_date_matches_resolve_current_season_heuristic() {
        let autumn = Utc.with_ymd_and_hms(2025, 10, 20, 0, 0, 0).unwrap();
        assert_eq!(season_label_for_date("nba", autumn), "2026");
    }

    #[test]
    fn test_filter_current_season_drops_prior_season_games() {
        let prior_season_game = event_on(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        let current_season_game = event_on(Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap());
        let schedule = vec![prior_season_game, current_season_game.clone()];
        let filtered = filter_current_season(&schedule, "nba", "2026");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, current_season_game.id);
    }
}
