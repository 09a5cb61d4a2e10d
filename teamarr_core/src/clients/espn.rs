//! HTTP client for the primary provider (ESPN's public site + Core APIs).
//!
//! One [`CircuitBreaker`] guards the site API (scoreboard/schedule/team/event/
//! roster/group) and a second, independent one guards the Core API (season
//! leaders), so an outage on one does not gate calls to the other.

use crate::circuit_breaker::CircuitBreaker;
use crate::error::{Result, TeamarrError};
use crate::models::event::{extract_total_record, normalize_score, normalize_status};
use crate::models::{Competitor, Event, EventStatus, Odds, PlayerLeaderEntry, PlayerLeaders, SeasonType};
use crate::retry::{execute_with_retry, is_retriable_status, is_retriable_transport_error};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const DEFAULT_SITE_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports";
const DEFAULT_CORE_BASE: &str = "https://sports.core.api.espn.com/v2/sports";

#[derive(Debug, Clone)]
pub struct ScoreboardDoc {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone)]
pub struct ScheduleDoc {
    pub events: Vec<Event>,
    /// The upstream-reported season year, when present (`season.year` on the
    /// schedule document). `None` triggers the calendar-heuristic fallback in
    /// [`crate::season::resolve_current_season`].
    pub season_year: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct TeamDoc {
    pub team_id: String,
    pub name: String,
    pub abbrev: String,
    pub record: Option<String>,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct EventDoc {
    pub event: Event,
}

#[derive(Debug, Clone)]
pub struct RosterDoc {
    pub head_coach: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GroupDoc {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct LeadersDoc {
    pub leaders: PlayerLeaders,
}

#[derive(Clone)]
pub struct EspnClient {
    client: Client,
    site_base: String,
    core_base: String,
    site_breaker: Arc<CircuitBreaker>,
    core_breaker: Arc<CircuitBreaker>,
}

impl std::fmt::Debug for EspnClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EspnClient")
            .field("site_circuit_state", &self.site_breaker.state())
            .field("core_circuit_state", &self.core_breaker.state())
            .finish()
    }
}

impl EspnClient {
    pub fn new(http_timeout_secs: u64) -> Self {
        Self::with_base_urls(DEFAULT_SITE_BASE, DEFAULT_CORE_BASE, http_timeout_secs)
    }

    /// Construct with overridable base URLs, for pointing at a `wiremock` server in tests.
    pub fn with_base_urls(site_base: &str, core_base: &str, http_timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(http_timeout_secs))
                .pool_max_idle_per_host(100)
                .build()
                .unwrap_or_else(|_| Client::new()),
            site_base: site_base.trim_end_matches('/').to_string(),
            core_base: core_base.trim_end_matches('/').to_string(),
            site_breaker: Arc::new(CircuitBreaker::with_defaults("espn-site")),
            core_breaker: Arc::new(CircuitBreaker::with_defaults("espn-core")),
        }
    }

    async fn get_json(&self, breaker: &CircuitBreaker, endpoint: &str, url: &str) -> Result<Value> {
        if !breaker.is_available() {
            return Err(TeamarrError::upstream_unavailable(endpoint, "circuit open"));
        }

        let client = &self.client;
        let result: std::result::Result<Value, reqwest::Error> = execute_with_retry(
            endpoint,
            || async {
                let resp = client.get(url).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(resp.error_for_status().unwrap_err());
                }
                resp.json::<Value>().await
            },
            |err| {
                is_retriable_transport_error(err)
                    || err.status().map(is_retriable_status).unwrap_or(false)
            },
        )
        .await;

        match result {
            Ok(value) => {
                breaker.record_success();
                Ok(value)
            }
            Err(err) => {
                breaker.record_failure();
                Err(TeamarrError::upstream_unavailable(endpoint, err.to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_scoreboard(
        &self,
        sport_slug: &str,
        league_slug: &str,
        date: NaiveDate,
        groups: Option<&str>,
    ) -> Result<ScoreboardDoc> {
        let mut url = format!(
            "{}/{}/{}/scoreboard?dates={}",
            self.site_base,
            sport_slug,
            league_slug,
            date.format("%Y%m%d")
        );
        if let Some(g) = groups {
            url.push_str(&format!("&groups={}", g));
        }

        let data = self.get_json(&self.site_breaker, "scoreboard", &url).await?;
        let events = parse_events(&data, league_slug)?;
        Ok(ScoreboardDoc { events })
    }

    #[instrument(skip(self))]
    pub async fn fetch_team_schedule(
        &self,
        sport_slug: &str,
        league_slug: &str,
        team_id: &str,
    ) -> Result<ScheduleDoc> {
        let url = format!(
            "{}/{}/{}/teams/{}/schedule",
            self.site_base, sport_slug, league_slug, team_id
        );
        let data = self.get_json(&self.site_breaker, "schedule", &url).await?;
        let events = parse_events(&data, league_slug)?;
        let season_year = data
            .get("season")
            .and_then(|s| s.get("year"))
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        Ok(ScheduleDoc { events, season_year })
    }

    #[instrument(skip(self))]
    pub async fn fetch_team(&self, sport_slug: &str, league_slug: &str, team_id: &str) -> Result<TeamDoc> {
        let url = format!(
            "{}/{}/{}/teams/{}",
            self.site_base, sport_slug, league_slug, team_id
        );
        let data = self.get_json(&self.site_breaker, "team", &url).await?;
        let team = data.get("team").unwrap_or(&data);

        let record = team
            .get("record")
            .and_then(|r| r.get("items"))
            .and_then(extract_total_record);

        let rank = team
            .get("rank")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);

        Ok(TeamDoc {
            team_id: team_id.to_string(),
            name: team.get("displayName").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            abbrev: team.get("abbreviation").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            record,
            rank,
        })
    }

    #[instrument(skip(self))]
    pub async fn fetch_event(&self, sport_slug: &str, league_slug: &str, event_id: &str) -> Result<EventDoc> {
        let url = format!(
            "{}/{}/{}/summary?event={}",
            self.site_base, sport_slug, league_slug, event_id
        );
        let data = self.get_json(&self.site_breaker, "event_summary", &url).await?;
        let header = data.get("header").unwrap_or(&data);
        let events = parse_events(&serde_json::json!({ "events": [header] }), league_slug)?;
        let event = events
            .into_iter()
            .next()
            .ok_or_else(|| TeamarrError::upstream_malformed("event_summary", "no event in response"))?;
        Ok(EventDoc { event })
    }

    #[instrument(skip(self))]
    pub async fn fetch_roster(&self, sport_slug: &str, league_slug: &str, team_id: &str) -> Result<RosterDoc> {
        let url = format!(
            "{}/{}/{}/teams/{}/roster",
            self.site_base, sport_slug, league_slug, team_id
        );
        let data = self.get_json(&self.site_breaker, "roster", &url).await?;
        let head_coach = data
            .get("coach")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("firstName").zip(c.get("lastName")))
            .and_then(|(f, l)| Some(format!("{} {}", f.as_str()?, l.as_str()?)));
        Ok(RosterDoc { head_coach })
    }

    #[instrument(skip(self))]
    pub async fn fetch_group(&self, sport_slug: &str, league_slug: &str, group_id: &str) -> Result<GroupDoc> {
        let url = format!(
            "{}/{}/{}/groups/{}",
            self.site_base, sport_slug, league_slug, group_id
        );
        let data = self.get_json(&self.site_breaker, "group", &url).await?;
        Ok(GroupDoc {
            name: data.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        })
    }

    #[instrument(skip(self))]
    pub async fn fetch_leaders(
        &self,
        sport_slug: &str,
        league_slug: &str,
        season: u32,
        team_id: &str,
    ) -> Result<LeadersDoc> {
        let url = format!(
            "{}/{}/{}/seasons/{}/types/2/teams/{}/leaders",
            self.core_base, sport_slug, league_slug, season, team_id
        );
        let data = self.get_json(&self.core_breaker, "leaders", &url).await?;

        let mut leaders = PlayerLeaders::new();
        if let Some(categories) = data.get("categories").and_then(|v| v.as_array()) {
            for cat in categories {
                let name = cat.get("name").and_then(|v| v.as_str()).unwrap_or_default();
                if let Some(leader) = cat.get("leaders").and_then(|v| v.as_array()).and_then(|a| a.first()) {
                    let display_name = leader
                        .get("athlete")
                        .and_then(|a| a.get("displayName"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    let display_value = leader
                        .get("displayValue")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    leaders.insert(
                        name.to_string(),
                        PlayerLeaderEntry { display_name, display_value },
                    );
                }
            }
        }

        Ok(LeadersDoc { leaders })
    }
}

/// Shared scoreboard/schedule/summary event-array parser. Both endpoints
/// return the same `events[]` shape with a `competitions[0]` nested object.
fn parse_events(data: &Value, league_slug: &str) -> Result<Vec<Event>> {
    let mut out = Vec::new();
    let Some(events) = data.get("events").and_then(|v| v.as_array()) else {
        return Ok(out);
    };

    for raw in events {
        let id = raw.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let start_utc: DateTime<Utc> = raw
            .get("date")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let competition = raw
            .get("competitions")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .cloned()
            .unwrap_or(Value::Null);

        let status_raw = competition
            .get("status")
            .or_else(|| raw.get("status"))
            .and_then(|s| s.get("type"))
            .and_then(|t| t.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("STATUS_SCHEDULED");
        let status = normalize_status(status_raw);

        let season_type_raw = raw
            .get("season")
            .and_then(|s| s.get("type"))
            .and_then(|v| v.as_u64())
            .unwrap_or(2);
        let season_type = match season_type_raw {
            1 => SeasonType::Preseason,
            3 => SeasonType::Postseason,
            _ => SeasonType::Regular,
        };

        let competitors = competition.get("competitors").and_then(|v| v.as_array());
        let mut home = empty_competitor();
        let mut away = empty_competitor();

        if let Some(comps) = competitors {
            for comp in comps {
                let team = comp.get("team").cloned().unwrap_or(Value::Null);
                let c = Competitor {
                    team_id: team.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    name: team.get("displayName").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    abbrev: team.get("abbreviation").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    score: comp.get("score").and_then(normalize_score),
                    record: comp.get("records").and_then(extract_total_record),
                };
                if comp.get("homeAway").and_then(|v| v.as_str()) == Some("home") {
                    home = c;
                } else {
                    away = c;
                }
            }
        }

        let broadcasts = extract_broadcasts(&competition);

        let odds = competition
            .get("odds")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .map(|o| Odds {
                details: o.get("details").and_then(|v| v.as_str()).map(|s| s.to_string()),
                over_under: o.get("overUnder").and_then(|v| v.as_f64()),
                spread: o.get("spread").and_then(|v| v.as_f64()),
            });

        let player_leaders = extract_player_leaders(&competition);

        out.push(Event {
            id,
            provider: "espn".to_string(),
            league_code: league_slug.to_string(),
            start_utc,
            status,
            home,
            away,
            venue: competition
                .get("venue")
                .and_then(|v| v.get("fullName"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            broadcasts,
            odds,
            player_leaders,
            season_type,
            source_league: None,
        });
    }

    Ok(out)
}

fn empty_competitor() -> Competitor {
    Competitor {
        team_id: String::new(),
        name: String::new(),
        abbrev: String::new(),
        score: None,
        record: None,
    }
}

/// Scoreboard and schedule endpoints shape broadcasts differently; normalize
/// both to a flat list of display names.
fn extract_broadcasts(competition: &Value) -> Vec<String> {
    if let Some(arr) = competition.get("broadcasts").and_then(|v| v.as_array()) {
        let names: Vec<String> = arr
            .iter()
            .flat_map(|b| b.get("names").and_then(|n| n.as_array()).cloned().unwrap_or_default())
            .filter_map(|n| n.as_str().map(|s| s.to_string()))
            .collect();
        if !names.is_empty() {
            return names;
        }
    }
    if let Some(arr) = competition.get("geoBroadcasts").and_then(|v| v.as_array()) {
        return arr
            .iter()
            .filter_map(|b| b.get("media").and_then(|m| m.get("shortName")).and_then(|v| v.as_str()))
            .map(|s| s.to_string())
            .collect();
    }
    Vec::new()
}

fn extract_player_leaders(competition: &Value) -> PlayerLeaders {
    let mut leaders = PlayerLeaders::new();
    let Some(competitors) = competition.get("competitors").and_then(|v| v.as_array()) else {
        return leaders;
    };

    for comp in competitors {
        let Some(entries) = comp.get("leaders").and_then(|v| v.as_array()) else {
            continue;
        };
        for entry in entries {
            let category = entry.get("name").and_then(|v| v.as_str()).unwrap_or_default();
            if let Some(leader) = entry.get("leaders").and_then(|v| v.as_array()).and_then(|a| a.first()) {
                let display_value = leader.get("displayValue").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                let display_name = leader
                    .get("athlete")
                    .and_then(|a| a.get("displayName"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                leaders.insert(category.to_string(), PlayerLeaderEntry { display_name, display_value });
            }
        }
    }
    leaders
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_scoreboard_json() -> Value {
        serde_json::json!({
            "events": [{
                "id": "401547417",
                "date": "2026-03-01T00:30Z",
                "season": {"type": 2},
                "competitions": [{
                    "status": {"type": {"name": "STATUS_FINAL"}},
                    "venue": {"fullName": "TD Garden"},
                    "broadcasts": [{"names": ["ESPN"]}],
                    "competitors": [
                        {"homeAway": "home", "score": "118", "team": {"id": "2", "displayName": "Boston Celtics", "abbreviation": "BOS"}, "records": [{"type": "total", "displayValue": "10-4"}]},
                        {"homeAway": "away", "score": "112", "team": {"id": "17", "displayName": "Brooklyn Nets", "abbreviation": "BKN"}, "records": [{"type": "total", "displayValue": "6-8"}]}
                    ]
                }]
            }]
        })
    }

    #[test]
    fn test_parse_events_basic() {
        let events = parse_events(&sample_scoreboard_json(), "nba").unwrap();
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.home.name, "Boston Celtics");
        assert_eq!(e.away.score, Some(112));
        assert_eq!(e.status, EventStatus::Final);
        assert_eq!(e.broadcasts, vec!["ESPN".to_string()]);
    }

    #[test]
    fn test_parse_events_empty_when_no_events_key() {
        let events = parse_events(&serde_json::json!({}), "nba").unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_scoreboard_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/basketball/nba/scoreboard"))
            .and(query_param("dates", "20260301"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_scoreboard_json()))
            .mount(&server)
            .await;

        let client = EspnClient::with_base_urls(&server.uri(), &server.uri(), 5);
        let doc = client
            .fetch_scoreboard("basketball", "nba", NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), None)
            .await
            .unwrap();

        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events[0].home.abbrev, "BOS");
    }

    #[tokio::test]
    async fn test_fetch_scoreboard_retries_on_503_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/basketball/nba/scoreboard"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/basketball/nba/scoreboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_scoreboard_json()))
            .mount(&server)
            .await;

        let client = EspnClient::with_base_urls(&server.uri(), &server.uri(), 5);
        let doc = client
            .fetch_scoreboard("basketball", "nba", NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), None)
            .await
            .unwrap();

        assert_eq!(doc.events.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_scoreboard_exhausts_retries_returns_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/basketball/nba/scoreboard"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = EspnClient::with_base_urls(&server.uri(), &server.uri(), 5);
        let result = client
            .fetch_scoreboard("basketball", "nba", NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), None)
            .await;

        assert!(matches!(result, Err(TeamarrError::UpstreamUnavailable { .. })));
    }
}
