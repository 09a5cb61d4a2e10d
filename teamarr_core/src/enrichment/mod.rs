//! Enrichment service (C3): derives streaks, head-to-head history, player
//! leaders and the soccer multi-league fan-out from raw events and team docs.
//!
//! Nothing here talks to the network directly except [`fetch_soccer_events`],
//! which fans out across the leagues a team is indexed under in Tier S.

use crate::clients::espn::EspnClient;
use crate::error::Result;
use crate::models::enrichment::{format_streak, PreviousGame, H2H};
use crate::models::{Event, EventStatus, Streaks};
use crate::team_cache::SoccerTeamLeagueIndex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A single team's outcome in a completed game: win, loss, or tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Win,
    Loss,
    Tie,
}

fn outcome_for(event: &Event, team_id: &str) -> Option<Outcome> {
    if !event.is_final() {
        return None;
    }
    let (own, opp) = if event.home.team_id == team_id {
        (event.home.score?, event.away.score?)
    } else if event.away.team_id == team_id {
        (event.away.score?, event.home.score?)
    } else {
        return None;
    };
    Some(match own.cmp(&opp) {
        std::cmp::Ordering::Greater => Outcome::Win,
        std::cmp::Ordering::Less => Outcome::Loss,
        std::cmp::Ordering::Equal => Outcome::Tie,
    })
}

fn outcome_char(o: Outcome) -> char {
    match o {
        Outcome::Win => 'W',
        Outcome::Loss => 'L',
        Outcome::Tie => 'T',
    }
}

/// Walks the completed portion of `schedule` (assumed already in chronological
/// order, and already filtered to the current season by the caller — see
/// [`crate::season::filter_current_season`]) to compute the current streak,
/// home/away splits, last-5/last-10 records and the recent-form string, all
/// relative to `team_id`.
pub fn compute_streaks(schedule: &[Event], team_id: &str) -> Streaks {
    let mut completed: Vec<(&Event, Outcome)> = schedule
        .iter()
        .filter_map(|e| outcome_for(e, team_id).map(|o| (e, o)))
        .collect();
    completed.sort_by_key(|(e, _)| e.start_utc);

    let current_streak = format_streak(terminal_streak_count(completed.iter().map(|(_, o)| *o)));

    let home_only: Vec<Outcome> = completed
        .iter()
        .filter(|(e, _)| e.home.team_id == team_id)
        .map(|(_, o)| *o)
        .collect();
    let away_only: Vec<Outcome> = completed
        .iter()
        .filter(|(e, _)| e.away.team_id == team_id)
        .map(|(_, o)| *o)
        .collect();

    let home_streak = format_streak(terminal_streak_count(home_only.into_iter()));
    let away_streak = format_streak(terminal_streak_count(away_only.into_iter()));

    let last_5_record = record_string(last_n(&completed, 5));
    let last_10_record = record_string(last_n(&completed, 10));
    let recent_form: String = last_n(&completed, 10).iter().map(|(_, o)| outcome_char(*o)).collect();

    Streaks {
        current_streak,
        home_streak,
        away_streak,
        last_5_record,
        last_10_record,
        recent_form,
    }
}

fn last_n<'a>(completed: &'a [(&Event, Outcome)], n: usize) -> &'a [(&'a Event, Outcome)] {
    let len = completed.len();
    &completed[len.saturating_sub(n)..]
}

fn record_string(games: &[(&Event, Outcome)]) -> String {
    let wins = games.iter().filter(|(_, o)| *o == Outcome::Win).count();
    let losses = games.iter().filter(|(_, o)| *o == Outcome::Loss).count();
    let ties = games.iter().filter(|(_, o)| *o == Outcome::Tie).count();
    if ties > 0 {
        format!("{}-{}-{}", wins, losses, ties)
    } else {
        format!("{}-{}", wins, losses)
    }
}

/// Signed count of the current terminal run: positive for a win streak,
/// negative for a loss streak. A trailing tie breaks the streak to zero.
fn terminal_streak_count(outcomes: impl Iterator<Item = Outcome> + DoubleEndedIterator) -> i32 {
    let mut count = 0i32;
    let mut sign: Option<Outcome> = None;
    for o in outcomes.rev() {
        match o {
            Outcome::Tie => break,
            _ if sign.is_none() => {
                sign = Some(o);
                count = 1;
            }
            _ if sign == Some(o) => count += 1,
            _ => break,
        }
    }
    match sign {
        Some(Outcome::Loss) => -count,
        _ => count,
    }
}

/// Accumulates the season series and most recent prior completed meeting
/// between `team_id` and `opponent_id` over `schedule` (already filtered to
/// the current season by the caller — see [`crate::season::filter_current_season`]).
pub fn compute_h2h(schedule: &[Event], team_id: &str, opponent_id: &str) -> H2H {
    let mut vs_opponent: Vec<&Event> = schedule
        .iter()
        .filter(|e| {
            let ids = [e.home.team_id.as_str(), e.away.team_id.as_str()];
            ids.contains(&team_id) && ids.contains(&opponent_id)
        })
        .collect();
    vs_opponent.sort_by_key(|e| e.start_utc);

    let mut team_wins = 0u32;
    let mut opp_wins = 0u32;
    let mut previous_game = None;

    for event in &vs_opponent {
        match outcome_for(event, team_id) {
            Some(Outcome::Win) => team_wins += 1,
            Some(Outcome::Loss) => opp_wins += 1,
            _ => {}
        }
    }

    for event in vs_opponent.iter().rev() {
        if event.is_final() {
            if let Some(abbrev) = event.abbreviated_score() {
                previous_game = Some(PreviousGame {
                    abbreviated_score: abbrev,
                    date: event.start_utc,
                    location: event.venue.clone().unwrap_or_default(),
                });
            }
            break;
        }
    }

    H2H {
        team_wins,
        opp_wins,
        previous_game,
    }
}

/// Merges "today's" scoreboard events into a team's schedule: scoreboard data
/// (odds, broadcasts, live status, score) overrides whatever the schedule
/// fallback already had for the same event id.
pub fn merge_scoreboard_into_schedule(schedule: &mut Vec<Event>, scoreboard_events: &[Event]) {
    for scoreboard_event in scoreboard_events {
        if let Some(existing) = schedule.iter_mut().find(|e| e.id == scoreboard_event.id) {
            *existing = scoreboard_event.clone();
        } else {
            schedule.push(scoreboard_event.clone());
        }
    }
}

/// Final-score backfill: for completed games within `lookback` of `now` whose
/// schedule entry is still missing a score (e.g. the team-schedule endpoint
/// hadn't caught up), re-fetch the single-event summary.
pub async fn backfill_recent_final_scores(
    espn: &EspnClient,
    sport_slug: &str,
    league_slug: &str,
    schedule: &mut [Event],
    now: chrono::DateTime<chrono::Utc>,
    lookback: Duration,
) {
    let lookback = chrono::Duration::from_std(lookback).unwrap_or_default();
    for event in schedule.iter_mut() {
        let within_window = now - event.start_utc <= lookback && event.start_utc <= now;
        let missing_score = event.home.score.is_none() || event.away.score.is_none();
        if !within_window || !missing_score || event.status == EventStatus::Scheduled {
            continue;
        }
        match espn.fetch_event(sport_slug, league_slug, &event.id).await {
            Ok(doc) => *event = doc.event,
            Err(e) => {
                tracing::debug!("could not backfill final score for event {}: {}", event.id, e);
            }
        }
    }
}

/// Soccer multi-league fan-out (C3): looks up every league slug `team_id` is
/// indexed under in Tier S and fetches+merges that league's schedule events,
/// tagging each with its `source_league`. Bounded concurrency (>= 5 concurrent).
pub async fn fetch_soccer_events(
    espn: &EspnClient,
    index: &SoccerTeamLeagueIndex,
    team_id: &str,
    concurrency: usize,
) -> Result<Vec<Event>> {
    let leagues: Vec<String> = index.leagues_for_team(team_id).into_iter().map(String::from).collect();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut joinset: JoinSet<(String, Result<Vec<Event>>)> = JoinSet::new();

    for league_slug in leagues {
        let permit = semaphore.clone();
        let espn = espn.clone();
        let team_id = team_id.to_string();
        joinset.spawn(async move {
            let _permit = permit.acquire_owned().await;
            let result = espn
                .fetch_team_schedule("soccer", &league_slug, &team_id)
                .await
                .map(|doc| {
                    doc.events
                        .into_iter()
                        .map(|mut e| {
                            e.source_league = Some(league_slug.clone());
                            e
                        })
                        .collect()
                });
            (league_slug, result)
        });
    }

    let mut by_id: std::collections::HashMap<String, Event> = std::collections::HashMap::new();
    while let Some(joined) = joinset.join_next().await {
        let (league_slug, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("soccer fan-out task panicked: {}", e);
                continue;
            }
        };
        match result {
            Ok(events) => {
                for event in events {
                    by_id.insert(event.id.clone(), event);
                }
            }
            Err(e) => {
                tracing::warn!("soccer fan-out failed for league '{}': {}", league_slug, e);
            }
        }
    }

    let mut merged: Vec<Event> = by_id.into_values().collect();
    merged.sort_by_key(|e| e.start_utc);
    Ok(merged)
}
