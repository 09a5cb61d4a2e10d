//! A single game, normalized from whichever upstream endpoint returned it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Live,
    Final,
    Postponed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonType {
    Preseason,
    Regular,
    Postseason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub team_id: String,
    pub name: String,
    pub abbrev: String,
    pub score: Option<i32>,
    /// `W-L` or `W-L-T`, parsed from the `records[]` entry of `type == "total"`.
    pub record: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Odds {
    pub details: Option<String>,
    pub over_under: Option<f64>,
    pub spread: Option<f64>,
}

/// Sport-dispatched player leader entries, keyed by category
/// (`points`/`assists`/`rebounds` for basketball; `passingLeader`/
/// `rushingLeader`/`receivingLeader` for football).
pub type PlayerLeaders = HashMap<String, PlayerLeaderEntry>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLeaderEntry {
    pub display_name: String,
    pub display_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Provider-scoped id; never coalesced across providers except the
    /// documented TSDB -> ESPN soccer cross-reference.
    pub id: String,
    pub provider: String,
    pub league_code: String,
    pub start_utc: DateTime<Utc>,
    pub status: EventStatus,
    pub home: Competitor,
    pub away: Competitor,
    pub venue: Option<String>,
    pub broadcasts: Vec<String>,
    pub odds: Option<Odds>,
    pub player_leaders: PlayerLeaders,
    pub season_type: SeasonType,
    /// Soccer only: the specific competition slug this event came from.
    pub source_league: Option<String>,
}

impl Event {
    pub fn is_final(&self) -> bool {
        self.status == EventStatus::Final
    }

    pub fn is_upcoming(&self) -> bool {
        matches!(self.status, EventStatus::Scheduled | EventStatus::Live)
    }

    /// Abbreviated score format used throughout H2H/streak rendering:
    /// `AWY {s} @ HOM {s}`. Kept as a standalone formatting helper rather
    /// than inlined into the H2H computation, since the format varies by
    /// sport and should be overridable independently of it.
    pub fn abbreviated_score(&self) -> Option<String> {
        let away = self.away.score?;
        let home = self.home.score?;
        Some(format!(
            "{} {} @ {} {}",
            self.away.abbrev, away, self.home.abbrev, home
        ))
    }

    pub fn end_utc(&self, duration: chrono::Duration) -> DateTime<Utc> {
        self.start_utc + duration
    }
}

/// Normalizes a score field into an optional `i32`. Upstream returns either a
/// bare scalar (int or numeric string) or `{value, displayValue}`.
pub fn normalize_score(value: &serde_json::Value) -> Option<i32> {
    if value.is_null() {
        return None;
    }
    if let Some(n) = value.as_i64() {
        return Some(n as i32);
    }
    if let Some(s) = value.as_str() {
        return s.parse::<i32>().ok();
    }
    if let Some(obj) = value.as_object() {
        if let Some(v) = obj.get("value") {
            if let Some(n) = v.as_f64() {
                return Some(n as i32);
            }
        }
        if let Some(v) = obj.get("displayValue").and_then(|v| v.as_str()) {
            return v.parse::<i32>().ok();
        }
    }
    None
}

/// Maps a raw ESPN status type name to [`EventStatus`]. Unknown values
/// normalize to `Scheduled` with a debug-level log (schema drift, not fatal).
pub fn normalize_status(raw: &str) -> EventStatus {
    match raw {
        "STATUS_SCHEDULED" => EventStatus::Scheduled,
        "STATUS_IN_PROGRESS" => EventStatus::Live,
        "STATUS_FINAL" | "STATUS_FULL_TIME" => EventStatus::Final,
        "STATUS_POSTPONED" => EventStatus::Postponed,
        "STATUS_CANCELED" => EventStatus::Cancelled,
        other => {
            tracing::debug!("unrecognized event status '{}', defaulting to scheduled", other);
            EventStatus::Scheduled
        }
    }
}

/// Scans a `records[]` array for the `type == "total"` entry and returns its
/// `displayValue` (`W-L` or `W-L-T`).
pub fn extract_total_record(records: &serde_json::Value) -> Option<String> {
    records.as_array()?.iter().find_map(|r| {
        if r.get("type").and_then(|t| t.as_str()) == Some("total") {
            r.get("displayValue")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_score_scalar_int() {
        assert_eq!(normalize_score(&json!(24)), Some(24));
    }

    #[test]
    fn test_normalize_score_scalar_string() {
        assert_eq!(normalize_score(&json!("24")), Some(24));
    }

    #[test]
    fn test_normalize_score_value_display_object() {
        assert_eq!(normalize_score(&json!({"value": 24.0, "displayValue": "24"})), Some(24));
    }

    #[test]
    fn test_normalize_score_null() {
        assert_eq!(normalize_score(&json!(null)), None);
    }

    #[test]
    fn test_normalize_status_known_values() {
        assert_eq!(normalize_status("STATUS_SCHEDULED"), EventStatus::Scheduled);
        assert_eq!(normalize_status("STATUS_IN_PROGRESS"), EventStatus::Live);
        assert_eq!(normalize_status("STATUS_FINAL"), EventStatus::Final);
        assert_eq!(normalize_status("STATUS_FULL_TIME"), EventStatus::Final);
        assert_eq!(normalize_status("STATUS_POSTPONED"), EventStatus::Postponed);
        assert_eq!(normalize_status("STATUS_CANCELED"), EventStatus::Cancelled);
    }

    #[test]
    fn test_normalize_status_unknown_defaults_scheduled() {
        assert_eq!(normalize_status("STATUS_WEIRD_NEW_THING"), EventStatus::Scheduled);
    }

    #[test]
    fn test_extract_total_record() {
        let records = json!([
            {"type": "home", "displayValue": "5-2"},
            {"type": "total", "displayValue": "10-4"},
        ]);
        assert_eq!(extract_total_record(&records), Some("10-4".to_string()));
    }

    #[test]
    fn test_abbreviated_score_format() {
        let event = Event {
            id: "1".to_string(),
            provider: "espn".to_string(),
            league_code: "nba".to_string(),
            start_utc: Utc::now(),
            status: EventStatus::Final,
            home: Competitor {
                team_id: "1".to_string(),
                name: "Boston Celtics".to_string(),
                abbrev: "BOS".to_string(),
                score: Some(118),
                record: None,
            },
            away: Competitor {
                team_id: "2".to_string(),
                name: "Brooklyn Nets".to_string(),
                abbrev: "BKN".to_string(),
                score: Some(112),
                record: None,
            },
            venue: None,
            broadcasts: vec![],
            odds: None,
            player_leaders: Default::default(),
            season_type: SeasonType::Regular,
            source_league: None,
        };
        assert_eq!(event.abbreviated_score(), Some("BKN 112 @ BOS 118".to_string()));
    }
}
