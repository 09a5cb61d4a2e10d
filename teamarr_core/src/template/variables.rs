//! The 112-variable table (C4) and the per-game/per-team fact computation
//! that backs it.
//!
//! Each variable belongs to exactly one [`VarStrategy`], which determines
//! which of the three suffix slots (`base`, `.next`, `.last`) it is exposed
//! under. The table itself is intentionally flat — one row per variable name
//! — so adding a variable never touches the resolver in [`super::resolver`].

use crate::models::{Event, EventStatus, SeasonType, Streaks, Team, TeamStats, H2H};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarStrategy {
    /// Identity / season-aggregate: exposes only `{name}`. Not tied to any
    /// particular game — always available once team-level enrichment ran.
    Base,
    /// Result-only: exposes only `{name.last}`. Meaningful only once a
    /// completed game exists in the look-back window.
    Last,
    /// Odds: exposes `{name}` (current game) and `{name.next}`.
    BaseNext,
    /// Game-specific: exposes `{name}`, `{name.next}` and `{name.last}`.
    All,
}

pub struct VarDef {
    pub name: &'static str,
    pub strategy: VarStrategy,
}

macro_rules! vars {
    ($strategy:expr, [$($name:expr),* $(,)?]) => {
        [$(VarDef { name: $name, strategy: $strategy }),*]
    };
}

/// Team identity / season-aggregate variables (36). Populated once from
/// `Team`, `TeamStats`, `Streaks` and run-level context; never tied to a
/// specific game.
pub const BASE_VARS: [VarDef; 36] = vars!(
    VarStrategy::Base,
    [
        "team_name",
        "team_abbrev",
        "team_logo",
        "league_code",
        "league_name",
        "conference",
        "division",
        "conference_name",
        "division_name",
        "record",
        "home_record",
        "away_record",
        "win_percentage",
        "total_wins",
        "total_losses",
        "total_ties",
        "points_per_game",
        "points_against_per_game",
        "rank",
        "playoff_seed",
        "games_back",
        "streak",
        "home_streak",
        "away_streak",
        "last_5_record",
        "last_10_record",
        "recent_form",
        "head_coach",
        "current_season",
        "current_date",
        "current_time",
        "timezone",
        "team_id",
        "provider_team_id",
        "days_ahead_window",
        "generation_timestamp",
    ]
);

/// Result-only variables (10): meaningful solely for a completed game, so
/// they only ever render under the `.last` slot.
pub const LAST_VARS: [VarDef; 10] = vars!(
    VarStrategy::Last,
    [
        "result",
        "margin",
        "final_score",
        "points_leader",
        "assists_leader",
        "rebounds_leader",
        "passing_leader",
        "rushing_leader",
        "receiving_leader",
        "game_recap",
    ]
);

/// Odds variables (7): exposed for the current game and the next scheduled
/// one, never for a past game.
pub const BASE_NEXT_VARS: [VarDef; 7] = vars!(
    VarStrategy::BaseNext,
    [
        "odds_details",
        "odds_spread",
        "odds_over_under",
        "odds_favorite",
        "odds_summary",
        "odds_spread_formatted",
        "odds_over_under_formatted",
    ]
);

/// Game-specific variables (59): exposed across all three slots.
pub const ALL_VARS: [VarDef; 59] = vars!(
    VarStrategy::All,
    [
        "game_date",
        "game_time",
        "game_day_of_week",
        "game_datetime_iso",
        "days_until",
        "days_since",
        "hours_until",
        "event_id",
        "league_code_game",
        "provider",
        "venue_name",
        "broadcast_network",
        "broadcast_list",
        "broadcast_count",
        "is_national_broadcast",
        "opponent_name",
        "opponent_abbrev",
        "opponent_record",
        "opponent_rank",
        "home_team_name",
        "away_team_name",
        "home_team_abbrev",
        "away_team_abbrev",
        "home_team_record",
        "away_team_record",
        "home_away",
        "own_rank",
        "score_home",
        "score_away",
        "score_differential",
        "winning_team",
        "losing_team",
        "game_status",
        "is_final",
        "is_live",
        "is_scheduled",
        "is_postponed_or_cancelled",
        "season_type",
        "source_league",
        "h2h_summary",
        "h2h_team_wins",
        "h2h_opp_wins",
        "last_meeting_summary",
        "last_meeting_date",
        "last_meeting_location",
        "ranked_matchup",
        "top10_matchup",
        "is_playoff_game",
        "is_preseason_game",
        "week_number",
        "game_title_short",
        "matchup_summary",
        "has_odds",
        "month_name",
        "year",
        "weekday_short",
        "game_number_in_window",
        "home_or_away_label",
        "game_label",
        "game_id_for_icon",
    ]
);

/// Every variable's name paired with its strategy, in definition order.
pub fn all_variable_defs() -> Vec<&'static VarDef> {
    let mut out = Vec::with_capacity(112);
    out.extend(BASE_VARS.iter());
    out.extend(LAST_VARS.iter());
    out.extend(BASE_NEXT_VARS.iter());
    out.extend(ALL_VARS.iter());
    out
}

/// Team-level facts, computed once per team per run; back all [`VarStrategy::Base`] variables.
#[derive(Debug, Clone, Default)]
pub struct TeamFacts {
    pub team_name: String,
    pub team_abbrev: String,
    pub team_logo: String,
    pub league_code: String,
    pub league_name: String,
    pub conference: String,
    pub division: String,
    pub record: String,
    pub home_record: String,
    pub away_record: String,
    pub points_per_game: String,
    pub points_against_per_game: String,
    pub rank: String,
    pub playoff_seed: String,
    pub games_back: String,
    pub streak: String,
    pub home_streak: String,
    pub away_streak: String,
    pub last_5_record: String,
    pub last_10_record: String,
    pub recent_form: String,
    pub head_coach: String,
    pub current_season: String,
    pub current_date: String,
    pub current_time: String,
    pub timezone: String,
    pub team_id: String,
    pub provider_team_id: String,
    pub days_ahead_window: String,
    pub generation_timestamp: String,
}

fn win_pct(record: &str) -> String {
    let parts: Vec<&str> = record.split('-').collect();
    let (Some(w), Some(l)) = (parts.first().and_then(|s| s.parse::<f64>().ok()), parts.get(1).and_then(|s| s.parse::<f64>().ok())) else {
        return String::new();
    };
    let total = w + l;
    if total == 0.0 {
        return "0.000".to_string();
    }
    format!("{:.3}", w / total)
}

fn record_part(record: &str, idx: usize) -> String {
    record.split('-').nth(idx).unwrap_or_default().to_string()
}

pub fn team_facts_value(name: &str, f: &TeamFacts) -> String {
    match name {
        "team_name" => f.team_name.clone(),
        "team_abbrev" => f.team_abbrev.clone(),
        "team_logo" => f.team_logo.clone(),
        "league_code" => f.league_code.clone(),
        "league_name" => f.league_name.clone(),
        "conference" | "conference_name" => f.conference.clone(),
        "division" | "division_name" => f.division.clone(),
        "record" => f.record.clone(),
        "home_record" => f.home_record.clone(),
        "away_record" => f.away_record.clone(),
        "win_percentage" => win_pct(&f.record),
        "total_wins" => record_part(&f.record, 0),
        "total_losses" => record_part(&f.record, 1),
        "total_ties" => record_part(&f.record, 2),
        "points_per_game" => f.points_per_game.clone(),
        "points_against_per_game" => f.points_against_per_game.clone(),
        "rank" => f.rank.clone(),
        "playoff_seed" => f.playoff_seed.clone(),
        "games_back" => f.games_back.clone(),
        "streak" => f.streak.clone(),
        "home_streak" => f.home_streak.clone(),
        "away_streak" => f.away_streak.clone(),
        "last_5_record" => f.last_5_record.clone(),
        "last_10_record" => f.last_10_record.clone(),
        "recent_form" => f.recent_form.clone(),
        "head_coach" => f.head_coach.clone(),
        "current_season" => f.current_season.clone(),
        "current_date" => f.current_date.clone(),
        "current_time" => f.current_time.clone(),
        "timezone" => f.timezone.clone(),
        "team_id" => f.team_id.clone(),
        "provider_team_id" => f.provider_team_id.clone(),
        "days_ahead_window" => f.days_ahead_window.clone(),
        "generation_timestamp" => f.generation_timestamp.clone(),
        _ => String::new(),
    }
}

/// Builds team-level facts for a single generation run. Unlike
/// [`build_game_facts`], this has no per-slot variant — it is computed once
/// per team and reused across every programme that team gets.
#[allow(clippy::too_many_arguments)]
pub fn build_team_facts(
    team: &Team,
    stats: Option<&TeamStats>,
    streaks: Option<&Streaks>,
    head_coach: Option<&str>,
    current_season: &str,
    now_utc: DateTime<Utc>,
    tz: &Tz,
    days_ahead_window: u32,
) -> TeamFacts {
    let local_now = now_utc.with_timezone(tz);
    TeamFacts {
        team_name: team.name.clone(),
        team_abbrev: team.abbrev.clone(),
        team_logo: team.logo_url.clone().unwrap_or_default(),
        league_code: team.league_code.clone(),
        league_name: team.league_code.to_uppercase(),
        conference: stats.and_then(|s| s.conference.clone()).unwrap_or_default(),
        division: stats.and_then(|s| s.division.clone()).unwrap_or_default(),
        record: stats.map(|s| s.record.clone()).unwrap_or_default(),
        home_record: stats.map(|s| s.home_record.clone()).unwrap_or_default(),
        away_record: stats.map(|s| s.away_record.clone()).unwrap_or_default(),
        points_per_game: stats.map(|s| fmt_opt_f64(s.points_per_game)).unwrap_or_default(),
        points_against_per_game: stats.map(|s| fmt_opt_f64(s.points_against_per_game)).unwrap_or_default(),
        rank: stats.and_then(|s| s.rank).map(|r| r.to_string()).unwrap_or_default(),
        playoff_seed: stats.and_then(|s| s.playoff_seed).map(|r| r.to_string()).unwrap_or_default(),
        games_back: stats.map(|s| fmt_opt_f64(s.games_back)).unwrap_or_default(),
        streak: streaks.map(|s| s.current_streak.clone()).unwrap_or_default(),
        home_streak: streaks.map(|s| s.home_streak.clone()).unwrap_or_default(),
        away_streak: streaks.map(|s| s.away_streak.clone()).unwrap_or_default(),
        last_5_record: streaks.map(|s| s.last_5_record.clone()).unwrap_or_default(),
        last_10_record: streaks.map(|s| s.last_10_record.clone()).unwrap_or_default(),
        recent_form: streaks.map(|s| s.recent_form.clone()).unwrap_or_default(),
        head_coach: head_coach.unwrap_or_default().to_string(),
        current_season: current_season.to_string(),
        current_date: local_now.format("%Y-%m-%d").to_string(),
        current_time: local_now.format("%H:%M").to_string(),
        timezone: tz.to_string(),
        team_id: team.id.to_string(),
        provider_team_id: team.provider_team_id.clone(),
        days_ahead_window: days_ahead_window.to_string(),
        generation_timestamp: now_utc.to_rfc3339(),
    }
}

/// Per-game facts, computed from an `Event` plus the rendering team's
/// perspective. Backs [`VarStrategy::All`], [`VarStrategy::Last`] and
/// [`VarStrategy::BaseNext`] variables for a single slot (current/next/last).
#[derive(Debug, Clone, Default)]
pub struct GameFacts {
    pub game_date: String,
    pub game_time: String,
    pub game_day_of_week: String,
    pub game_datetime_iso: String,
    pub days_until: String,
    pub days_since: String,
    pub hours_until: String,
    pub event_id: String,
    pub league_code: String,
    pub provider: String,
    pub venue_name: String,
    pub broadcast_network: String,
    pub broadcast_list: String,
    pub broadcast_count: String,
    pub is_national_broadcast: String,
    pub opponent_name: String,
    pub opponent_abbrev: String,
    pub opponent_record: String,
    pub opponent_rank: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_team_abbrev: String,
    pub away_team_abbrev: String,
    pub home_team_record: String,
    pub away_team_record: String,
    pub home_away: String,
    pub own_rank: String,
    pub score_home: String,
    pub score_away: String,
    pub score_differential: String,
    pub winning_team: String,
    pub losing_team: String,
    pub game_status: String,
    pub is_final: String,
    pub is_live: String,
    pub is_scheduled: String,
    pub is_postponed_or_cancelled: String,
    pub season_type: String,
    pub source_league: String,
    pub h2h_summary: String,
    pub h2h_team_wins: String,
    pub h2h_opp_wins: String,
    pub last_meeting_summary: String,
    pub last_meeting_date: String,
    pub last_meeting_location: String,
    pub ranked_matchup: String,
    pub top10_matchup: String,
    pub is_playoff_game: String,
    pub is_preseason_game: String,
    pub week_number: String,
    pub game_title_short: String,
    pub matchup_summary: String,
    pub has_odds: String,
    pub month_name: String,
    pub year: String,
    pub weekday_short: String,
    pub game_number_in_window: String,
    pub home_or_away_label: String,
    pub game_label: String,
    pub game_id_for_icon: String,

    // odds / result fields, shared across the BaseNext/Last strategies.
    pub odds_details: String,
    pub odds_spread: String,
    pub odds_over_under: String,
    pub odds_favorite: String,
    pub odds_summary: String,
    pub odds_spread_formatted: String,
    pub odds_over_under_formatted: String,

    pub result: String,
    pub margin: String,
    pub final_score: String,
    pub points_leader: String,
    pub assists_leader: String,
    pub rebounds_leader: String,
    pub passing_leader: String,
    pub rushing_leader: String,
    pub receiving_leader: String,
    pub game_recap: String,
}

pub fn game_facts_value(name: &str, f: &GameFacts) -> String {
    match name {
        "game_date" => f.game_date.clone(),
        "game_time" => f.game_time.clone(),
        "game_day_of_week" => f.game_day_of_week.clone(),
        "game_datetime_iso" => f.game_datetime_iso.clone(),
        "days_until" => f.days_until.clone(),
        "days_since" => f.days_since.clone(),
        "hours_until" => f.hours_until.clone(),
        "event_id" => f.event_id.clone(),
        "league_code_game" => f.league_code.clone(),
        "provider" => f.provider.clone(),
        "venue_name" => f.venue_name.clone(),
        "broadcast_network" => f.broadcast_network.clone(),
        "broadcast_list" => f.broadcast_list.clone(),
        "broadcast_count" => f.broadcast_count.clone(),
        "is_national_broadcast" => f.is_national_broadcast.clone(),
        "opponent_name" => f.opponent_name.clone(),
        "opponent_abbrev" => f.opponent_abbrev.clone(),
        "opponent_record" => f.opponent_record.clone(),
        "opponent_rank" => f.opponent_rank.clone(),
        "home_team_name" => f.home_team_name.clone(),
        "away_team_name" => f.away_team_name.clone(),
        "home_team_abbrev" => f.home_team_abbrev.clone(),
        "away_team_abbrev" => f.away_team_abbrev.clone(),
        "home_team_record" => f.home_team_record.clone(),
        "away_team_record" => f.away_team_record.clone(),
        "home_away" => f.home_away.clone(),
        "own_rank" => f.own_rank.clone(),
        "score_home" => f.score_home.clone(),
        "score_away" => f.score_away.clone(),
        "score_differential" => f.score_differential.clone(),
        "winning_team" => f.winning_team.clone(),
        "losing_team" => f.losing_team.clone(),
        "game_status" => f.game_status.clone(),
        "is_final" => f.is_final.clone(),
        "is_live" => f.is_live.clone(),
        "is_scheduled" => f.is_scheduled.clone(),
        "is_postponed_or_cancelled" => f.is_postponed_or_cancelled.clone(),
        "season_type" => f.season_type.clone(),
        "source_league" => f.source_league.clone(),
        "h2h_summary" => f.h2h_summary.clone(),
        "h2h_team_wins" => f.h2h_team_wins.clone(),
        "h2h_opp_wins" => f.h2h_opp_wins.clone(),
        "last_meeting_summary" => f.last_meeting_summary.clone(),
        "last_meeting_date" => f.last_meeting_date.clone(),
        "last_meeting_location" => f.last_meeting_location.clone(),
        "ranked_matchup" => f.ranked_matchup.clone(),
        "top10_matchup" => f.top10_matchup.clone(),
        "is_playoff_game" => f.is_playoff_game.clone(),
        "is_preseason_game" => f.is_preseason_game.clone(),
        "week_number" => f.week_number.clone(),
        "game_title_short" => f.game_title_short.clone(),
        "matchup_summary" => f.matchup_summary.clone(),
        "has_odds" => f.has_odds.clone(),
        "month_name" => f.month_name.clone(),
        "year" => f.year.clone(),
        "weekday_short" => f.weekday_short.clone(),
        "game_number_in_window" => f.game_number_in_window.clone(),
        "home_or_away_label" => f.home_or_away_label.clone(),
        "game_label" => f.game_label.clone(),
        "game_id_for_icon" => f.game_id_for_icon.clone(),

        "odds_details" => f.odds_details.clone(),
        "odds_spread" => f.odds_spread.clone(),
        "odds_over_under" => f.odds_over_under.clone(),
        "odds_favorite" => f.odds_favorite.clone(),
        "odds_summary" => f.odds_summary.clone(),
        "odds_spread_formatted" => f.odds_spread_formatted.clone(),
        "odds_over_under_formatted" => f.odds_over_under_formatted.clone(),

        "result" => f.result.clone(),
        "margin" => f.margin.clone(),
        "final_score" => f.final_score.clone(),
        "points_leader" => f.points_leader.clone(),
        "assists_leader" => f.assists_leader.clone(),
        "rebounds_leader" => f.rebounds_leader.clone(),
        "passing_leader" => f.passing_leader.clone(),
        "rushing_leader" => f.rushing_leader.clone(),
        "receiving_leader" => f.receiving_leader.clone(),
        "game_recap" => f.game_recap.clone(),

        _ => String::new(),
    }
}

const NATIONAL_NETWORKS: &[&str] = &[
    "ESPN", "ESPN2", "ABC", "FOX", "CBS", "NBC", "TNT", "TBS", "Peacock", "Amazon Prime Video",
    "NFL Network", "ESPN+", "Apple TV+",
];

pub fn is_national_broadcast(broadcasts: &[String]) -> bool {
    broadcasts.iter().any(|b| NATIONAL_NETWORKS.iter().any(|n| n.eq_ignore_ascii_case(b)))
}

fn leader_line(display_name: &str, display_value: &str) -> String {
    if display_name.is_empty() && display_value.is_empty() {
        String::new()
    } else {
        format!("{}: {}", display_name, display_value)
    }
}

fn fmt_opt_f64(v: Option<f64>) -> String {
    v.map(|v| format!("{:.1}", v)).unwrap_or_default()
}

/// Builds [`GameFacts`] for `event` from the perspective of `team`, given the
/// opponent's AP/poll rank (if known) and this team's head-to-head history
/// against that specific opponent.
pub fn build_game_facts(
    event: &Event,
    team: &Team,
    own_rank: Option<u32>,
    opponent_rank: Option<u32>,
    h2h: Option<&H2H>,
    now_utc: DateTime<Utc>,
    tz: &Tz,
    week_number: Option<u32>,
    game_number_in_window: Option<usize>,
) -> GameFacts {
    let is_home = event.home.team_id == team.provider_team_id;
    let (own, opp) = if is_home { (&event.home, &event.away) } else { (&event.away, &event.home) };
    let local_start = event.start_utc.with_timezone(tz);
    let diff = event.start_utc - now_utc;

    let winning_team = match (event.home.score, event.away.score) {
        (Some(h), Some(a)) if h > a => event.home.name.clone(),
        (Some(h), Some(a)) if a > h => event.away.name.clone(),
        _ => String::new(),
    };
    let losing_team = match (event.home.score, event.away.score) {
        (Some(h), Some(a)) if h > a => event.away.name.clone(),
        (Some(h), Some(a)) if a > h => event.home.name.clone(),
        _ => String::new(),
    };

    let result = match (event.home.score, event.away.score) {
        (Some(h), Some(a)) => {
            let own_score = if is_home { h } else { a };
            let opp_score = if is_home { a } else { h };
            match own_score.cmp(&opp_score) {
                std::cmp::Ordering::Greater => "win",
                std::cmp::Ordering::Less => "loss",
                std::cmp::Ordering::Equal => "tie",
            }
            .to_string()
        }
        _ => String::new(),
    };
    let margin = match (event.home.score, event.away.score) {
        (Some(h), Some(a)) => (h - a).abs().to_string(),
        _ => String::new(),
    };

    let own_rank_s = own_rank.map(|r| r.to_string()).unwrap_or_default();
    let opponent_rank_s = opponent_rank.map(|r| r.to_string()).unwrap_or_default();
    let top10_matchup = matches!((own_rank, opponent_rank), (Some(a), Some(b)) if a <= 10 && b <= 10);
    let ranked_matchup = opponent_rank.map(|r| r <= 25).unwrap_or(false);

    let points_leader = event
        .player_leaders
        .get("points")
        .map(|l| leader_line(&l.display_name, &l.display_value))
        .unwrap_or_default();
    let assists_leader = event
        .player_leaders
        .get("assists")
        .map(|l| leader_line(&l.display_name, &l.display_value))
        .unwrap_or_default();
    let rebounds_leader = event
        .player_leaders
        .get("rebounds")
        .map(|l| leader_line(&l.display_name, &l.display_value))
        .unwrap_or_default();
    let passing_leader = event
        .player_leaders
        .get("passingLeader")
        .map(|l| leader_line(&l.display_name, &l.display_value))
        .unwrap_or_default();
    let rushing_leader = event
        .player_leaders
        .get("rushingLeader")
        .map(|l| leader_line(&l.display_name, &l.display_value))
        .unwrap_or_default();
    let receiving_leader = event
        .player_leaders
        .get("receivingLeader")
        .map(|l| leader_line(&l.display_name, &l.display_value))
        .unwrap_or_default();

    let (odds_spread, odds_over_under, odds_details) = match &event.odds {
        Some(o) => (fmt_opt_f64(o.spread), fmt_opt_f64(o.over_under), o.details.clone().unwrap_or_default()),
        None => (String::new(), String::new(), String::new()),
    };
    let odds_favorite = event
        .odds
        .as_ref()
        .and_then(|o| o.spread)
        .map(|s| if s < 0.0 { own.name.clone() } else { opp.name.clone() })
        .unwrap_or_default();
    let odds_spread_formatted = event
        .odds
        .as_ref()
        .and_then(|o| o.spread)
        .map(|s| format!("{:+.1}", s))
        .unwrap_or_default();
    let odds_over_under_formatted = event
        .odds
        .as_ref()
        .and_then(|o| o.over_under)
        .map(|t| format!("O/U {:.1}", t))
        .unwrap_or_default();
    let odds_summary = if event.odds.is_some() {
        format!(
            "{} {}, {}",
            if odds_favorite.is_empty() { "Even".to_string() } else { odds_favorite.clone() },
            odds_spread_formatted,
            odds_over_under_formatted
        )
    } else {
        String::new()
    };

    let h2h_summary = h2h.map(|h| format!("{}-{}", h.team_wins, h.opp_wins)).unwrap_or_default();
    let (last_meeting_summary, last_meeting_date, last_meeting_location) = h2h
        .and_then(|h| h.previous_game.as_ref())
        .map(|pg| {
            (
                pg.abbreviated_score.clone(),
                pg.date.with_timezone(tz).format("%Y-%m-%d").to_string(),
                pg.location.clone(),
            )
        })
        .unwrap_or_default();

    GameFacts {
        game_date: local_start.format("%Y-%m-%d").to_string(),
        game_time: local_start.format("%H:%M").to_string(),
        game_day_of_week: local_start.format("%A").to_string(),
        game_datetime_iso: event.start_utc.to_rfc3339(),
        days_until: if diff.num_seconds() > 0 { diff.num_days().max(0).to_string() } else { String::new() },
        days_since: if diff.num_seconds() < 0 { (-diff).num_days().max(0).to_string() } else { String::new() },
        hours_until: if diff.num_seconds() > 0 { diff.num_hours().max(0).to_string() } else { String::new() },
        event_id: event.id.clone(),
        league_code: event.league_code.clone(),
        provider: event.provider.clone(),
        venue_name: event.venue.clone().unwrap_or_default(),
        broadcast_network: event.broadcasts.first().cloned().unwrap_or_default(),
        broadcast_list: event.broadcasts.join(", "),
        broadcast_count: event.broadcasts.len().to_string(),
        is_national_broadcast: is_national_broadcast(&event.broadcasts).to_string(),
        opponent_name: opp.name.clone(),
        opponent_abbrev: opp.abbrev.clone(),
        opponent_record: opp.record.clone().unwrap_or_default(),
        opponent_rank: opponent_rank_s.clone(),
        home_team_name: event.home.name.clone(),
        away_team_name: event.away.name.clone(),
        home_team_abbrev: event.home.abbrev.clone(),
        away_team_abbrev: event.away.abbrev.clone(),
        home_team_record: event.home.record.clone().unwrap_or_default(),
        away_team_record: event.away.record.clone().unwrap_or_default(),
        home_away: if is_home { "home".to_string() } else { "away".to_string() },
        own_rank: own_rank_s,
        score_home: event.home.score.map(|s| s.to_string()).unwrap_or_default(),
        score_away: event.away.score.map(|s| s.to_string()).unwrap_or_default(),
        score_differential: match (event.home.score, event.away.score) {
            (Some(h), Some(a)) => (h - a).abs().to_string(),
            _ => String::new(),
        },
        winning_team,
        losing_team,
        game_status: format!("{:?}", event.status).to_lowercase(),
        is_final: (event.status == EventStatus::Final).to_string(),
        is_live: (event.status == EventStatus::Live).to_string(),
        is_scheduled: (event.status == EventStatus::Scheduled).to_string(),
        is_postponed_or_cancelled: matches!(event.status, EventStatus::Postponed | EventStatus::Cancelled).to_string(),
        season_type: format!("{:?}", event.season_type).to_lowercase(),
        source_league: event.source_league.clone().unwrap_or_default(),
        h2h_summary,
        h2h_team_wins: h2h.map(|h| h.team_wins.to_string()).unwrap_or_default(),
        h2h_opp_wins: h2h.map(|h| h.opp_wins.to_string()).unwrap_or_default(),
        last_meeting_summary,
        last_meeting_date,
        last_meeting_location,
        ranked_matchup: ranked_matchup.to_string(),
        top10_matchup: top10_matchup.to_string(),
        is_playoff_game: (event.season_type == SeasonType::Postseason).to_string(),
        is_preseason_game: (event.season_type == SeasonType::Preseason).to_string(),
        week_number: week_number.map(|w| w.to_string()).unwrap_or_default(),
        game_title_short: format!("{} {}", if is_home { "vs" } else { "@" }, opp.abbrev),
        matchup_summary: format!(
            "{} ({}) vs {} ({})",
            own.name,
            own.record.clone().unwrap_or_default(),
            opp.name,
            opp.record.clone().unwrap_or_default()
        ),
        has_odds: event.odds.is_some().to_string(),
        month_name: local_start.format("%B").to_string(),
        year: local_start.format("%Y").to_string(),
        weekday_short: local_start.format("%a").to_string(),
        game_number_in_window: game_number_in_window.map(|n| n.to_string()).unwrap_or_default(),
        home_or_away_label: if is_home { "Home Game".to_string() } else { "Away Game".to_string() },
        game_label: format!("{} - {}", event.league_code.to_uppercase(), format!("{:?}", event.season_type)),
        game_id_for_icon: event.id.clone(),

        odds_details,
        odds_spread,
        odds_over_under,
        odds_favorite,
        odds_summary,
        odds_spread_formatted,
        odds_over_under_formatted,

        result,
        margin,
        final_score: event.abbreviated_score().unwrap_or_default(),
        points_leader,
        assists_leader,
        rebounds_leader,
        passing_leader,
        rushing_leader,
        receiving_leader,
        game_recap: if event.is_final() {
            format!(
                "{} {} {}",
                winning_team_or(&event.home.name, &event.away.name, event.home.score, event.away.score),
                "defeated",
                losing_team_or(&event.home.name, &event.away.name, event.home.score, event.away.score)
            )
        } else {
            String::new()
        },
    }
}

fn winning_team_or(home: &str, away: &str, hs: Option<i32>, as_: Option<i32>) -> String {
    match (hs, as_) {
        (Some(h), Some(a)) if h >= a => home.to_string(),
        (Some(_), Some(_)) => away.to_string(),
        _ => String::new(),
    }
}

fn losing_team_or(home: &str, away: &str, hs: Option<i32>, as_: Option<i32>) -> String {
    match (hs, as_) {
        (Some(h), Some(a)) if h >= a => away.to_string(),
        (Some(_), Some(_)) => home.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_table_totals() {
        assert_eq!(BASE_VARS.len(), 36);
        assert_eq!(LAST_VARS.len(), 10);
        assert_eq!(BASE_NEXT_VARS.len(), 7);
        assert_eq!(ALL_VARS.len(), 59);
        assert_eq!(all_variable_defs().len(), 112);
    }

    #[test]
    fn test_is_national_broadcast() {
        assert!(is_national_broadcast(&["ESPN".to_string()]));
        assert!(!is_national_broadcast(&["MSG Network".to_string()]));
    }

    #[test]
    fn test_win_pct_formatting() {
        assert_eq!(win_pct("10-4"), "0.714");
        assert_eq!(win_pct("0-0"), "0.000");
        assert_eq!(win_pct("bogus"), "");
    }
}
