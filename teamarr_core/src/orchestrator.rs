//! C0: the orchestration layer a binary entry point drives. Wires the shared
//! HTTP clients, circuit breakers and caches into one [`RunContext`], fans the
//! configured teams out across a bounded worker pool, and funnels the
//! resulting per-team programme streams into the XMLTV writer (C6).
//!
//! Per-team failures are caught at the task boundary and folded into the run
//! result's `errors` list rather than aborting the run — only an unwritable
//! output path or an unreachable configuration store fail the whole run, per
//! the error taxonomy's locally-recoverable split.

use crate::cache::tier_e::TierECache;
use crate::cache::tier_s::TierSStore;
use crate::clients::{EspnClient, TsdbClient};
use crate::config::Settings;
use crate::enrichment;
use crate::error::Result;
use crate::league_config;
use crate::models::enrichment::parse_signed_streak;
use crate::models::{Event, Programme, Team, TeamStats};
use crate::season;
use crate::store;
use crate::synthesizer::{self, SynthesisInput};
use crate::team_cache::{CacheRefreshSummary, SoccerTeamLeagueIndex};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

/// A point-in-time read of an in-flight (or just-finished) run, backing the
/// `{in_progress, percent, message}` status probe.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub in_progress: bool,
    pub percent: u8,
    pub message: String,
}

/// Thread-safe run status, shared between the task driving `generate_epg` and
/// whatever polls it (a CLI `status` subcommand, an external control plane).
#[derive(Debug)]
pub struct GenerationStatus {
    in_progress: AtomicBool,
    percent: AtomicU8,
    message: RwLock<String>,
}

impl GenerationStatus {
    pub fn idle() -> Self {
        Self {
            in_progress: AtomicBool::new(false),
            percent: AtomicU8::new(0),
            message: RwLock::new("idle".to_string()),
        }
    }

    fn begin(&self, message: impl Into<String>) {
        self.in_progress.store(true, Ordering::SeqCst);
        self.percent.store(0, Ordering::SeqCst);
        *self.message.write() = message.into();
    }

    fn advance(&self, percent: u8, message: impl Into<String>) {
        self.percent.store(percent.min(100), Ordering::SeqCst);
        *self.message.write() = message.into();
    }

    fn finish(&self, message: impl Into<String>) {
        self.in_progress.store(false, Ordering::SeqCst);
        self.percent.store(100, Ordering::SeqCst);
        *self.message.write() = message.into();
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            in_progress: self.in_progress.load(Ordering::SeqCst),
            percent: self.percent.load(Ordering::SeqCst),
            message: self.message.read().clone(),
        }
    }
}

impl Default for GenerationStatus {
    fn default() -> Self {
        Self::idle()
    }
}

/// The shared context a generation run (or a cache refresh) is built from:
/// configuration, upstream clients, the ephemeral per-run cache and the
/// semi-permanent soccer league index. Cheap to clone — everything behind an
/// `Arc` or already `Clone` internally (the HTTP clients wrap a pooled
/// `reqwest::Client` and a shared circuit breaker handle).
#[derive(Clone)]
pub struct RunContext {
    pub settings: Settings,
    pub espn: EspnClient,
    pub tsdb: TsdbClient,
    pub tier_e: Arc<TierECache>,
    pub soccer_index: Arc<SoccerTeamLeagueIndex>,
    pub status: Arc<GenerationStatus>,
}

impl RunContext {
    /// Builds a fresh run context: constructs the upstream clients from
    /// `settings`, then loads the Tier S soccer index from `db_pool`. Tier E
    /// is always built empty — it is purged (reconstructed) at the start of
    /// every run, never reused across runs.
    pub async fn build(settings: Settings, db_pool: &SqlitePool) -> Result<Self> {
        let espn = EspnClient::with_base_urls(&settings.espn_site_base_url, &settings.espn_core_base_url, settings.http_timeout_secs);
        let tsdb = TsdbClient::with_base_url(&settings.tsdb_base_url, settings.http_timeout_secs);

        let tier_s = TierSStore::new(db_pool.clone());
        tier_s.ensure_schema().await?;
        let soccer_index = tier_s.load_index().await?;

        Ok(Self {
            settings,
            espn,
            tsdb,
            tier_e: Arc::new(TierECache::new()),
            soccer_index: Arc::new(soccer_index),
            status: Arc::new(GenerationStatus::idle()),
        })
    }
}

/// A single team's generation failure, isolated so it doesn't abort the run.
#[derive(Debug, Clone)]
pub struct TeamGenerationError {
    pub team_id: Uuid,
    pub team_name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct GenerationStats {
    pub team_count: usize,
    pub programme_count: usize,
    pub error_count: usize,
    pub elapsed_secs: f64,
    /// Set when the run's deadline elapsed before every team finished; the
    /// result still carries whatever was assembled for teams that completed
    /// in time.
    pub deadline_exceeded: bool,
}

#[derive(Debug, Clone)]
pub struct GenerateEpgResult {
    pub teams: Vec<Team>,
    pub programmes_by_team: HashMap<Uuid, Vec<Programme>>,
    pub stats: GenerationStats,
    pub errors: Vec<TeamGenerationError>,
}

/// Drives C1 through C5 for one team: schedule fetch, soccer fan-out,
/// today's-scoreboard merge, final-score backfill, streak/H2H computation
/// and template synthesis. Returns a [`TeamGenerationError`] rather than
/// propagating a [`TeamarrError`] so the caller can isolate the failure.
async fn run_one_team(
    ctx: &RunContext,
    db_pool: &SqlitePool,
    team: &Team,
    now: DateTime<Utc>,
    days_ahead: u32,
    tz: &Tz,
) -> std::result::Result<Vec<Programme>, TeamGenerationError> {
    let fail = |reason: String| TeamGenerationError {
        team_id: team.id,
        team_name: team.name.clone(),
        reason,
    };

    let template = store::load_template(db_pool, team.template_id).await.map_err(|e| fail(e.to_string()))?;
    let config = league_config::get_league_config(&team.league_code)
        .ok_or_else(|| fail(format!("unsupported league code '{}'", team.league_code)))?;

    let schedule_doc = ctx
        .tier_e
        .schedule
        .get_or_fetch((team.league_code.clone(), team.provider_team_id.clone()), || async {
            ctx.espn
                .fetch_team_schedule(config.sport_slug, config.league_slug, &team.provider_team_id)
                .await
                .ok()
        })
        .await;

    let mut schedule: Vec<Event> = schedule_doc.as_ref().map(|d| d.events.clone()).unwrap_or_default();
    let season_year = schedule_doc.as_ref().and_then(|d| d.season_year);

    if team.is_soccer() {
        match enrichment::fetch_soccer_events(&ctx.espn, &ctx.soccer_index, &team.provider_team_id, ctx.settings.soccer_fanout_concurrency).await {
            Ok(soccer_events) => enrichment::merge_scoreboard_into_schedule(&mut schedule, &soccer_events),
            Err(e) => tracing::warn!("soccer fan-out failed for team '{}': {}", team.name, e),
        }
    }

    let today = now.date_naive();
    let scoreboard = ctx
        .tier_e
        .scoreboard
        .get_or_fetch((team.league_code.clone(), team.provider_team_id.clone(), today), || async {
            ctx.espn.fetch_scoreboard(config.sport_slug, config.league_slug, today, config.groups_param).await.ok()
        })
        .await;
    if let Some(doc) = &scoreboard {
        let relevant: Vec<Event> = doc
            .events
            .iter()
            .filter(|e| e.home.team_id == team.provider_team_id || e.away.team_id == team.provider_team_id)
            .cloned()
            .collect();
        enrichment::merge_scoreboard_into_schedule(&mut schedule, &relevant);
    }

    enrichment::backfill_recent_final_scores(&ctx.espn, config.sport_slug, config.league_slug, &mut schedule, now, Duration::from_secs(7 * 86400)).await;
    schedule.sort_by_key(|e| e.start_utc);

    let current_season = season::resolve_current_season(season_year, &team.league_code, now);
    let season_schedule = season::filter_current_season(&schedule, &team.league_code, &current_season);

    let streaks = enrichment::compute_streaks(&season_schedule, &team.provider_team_id);

    let team_doc = ctx
        .tier_e
        .team
        .get_or_fetch((team.league_code.clone(), team.provider_team_id.clone()), || async {
            ctx.espn.fetch_team(config.sport_slug, config.league_slug, &team.provider_team_id).await.ok()
        })
        .await;
    let own_rank = team_doc.as_ref().and_then(|t| t.rank);

    let team_stats = TeamStats {
        record: team_doc.as_ref().and_then(|t| t.record.clone()).unwrap_or_default(),
        home_record: String::new(),
        away_record: String::new(),
        points_per_game: None,
        points_against_per_game: None,
        rank: own_rank,
        playoff_seed: None,
        games_back: None,
        streak_count: parse_signed_streak(&streaks.current_streak),
        conference: None,
        division: None,
    };

    let roster = ctx
        .tier_e
        .roster
        .get_or_fetch((team.league_code.clone(), team.provider_team_id.clone()), || async {
            ctx.espn.fetch_roster(config.sport_slug, config.league_slug, &team.provider_team_id).await.ok()
        })
        .await;
    let head_coach = roster.and_then(|r| r.head_coach);

    // Opponent ranks and head-to-head are only worth the extra upstream calls
    // for teams the schedule actually shows up in the lookahead window.
    let window_end = now + ChronoDuration::days(days_ahead as i64);
    let mut opponent_ids: Vec<String> = schedule
        .iter()
        .filter(|e| e.start_utc >= now && e.start_utc < window_end)
        .map(|e| if e.home.team_id == team.provider_team_id { e.away.team_id.clone() } else { e.home.team_id.clone() })
        .filter(|id| !id.is_empty())
        .collect();
    opponent_ids.sort();
    opponent_ids.dedup();

    let mut opponent_ranks = HashMap::new();
    let mut h2h_by_opponent = HashMap::new();
    for opp_id in &opponent_ids {
        let opp_doc = ctx
            .tier_e
            .team
            .get_or_fetch((team.league_code.clone(), opp_id.clone()), || async {
                ctx.espn.fetch_team(config.sport_slug, config.league_slug, opp_id).await.ok()
            })
            .await;
        if let Some(rank) = opp_doc.and_then(|d| d.rank) {
            opponent_ranks.insert(opp_id.clone(), rank);
        }
        h2h_by_opponent.insert(opp_id.clone(), enrichment::compute_h2h(&season_schedule, &team.provider_team_id, opp_id));
    }

    let input = SynthesisInput {
        team,
        template: &template,
        schedule: &schedule,
        team_stats: Some(&team_stats),
        streaks: Some(&streaks),
        head_coach: head_coach.as_deref(),
        current_season: &current_season,
        own_rank,
        opponent_ranks: &opponent_ranks,
        h2h_by_opponent: &h2h_by_opponent,
        now_utc: now,
        days_ahead,
        tz,
        settings: &ctx.settings,
    };

    Ok(synthesizer::synthesize(&input))
}

/// Runs a full generation: loads active teams and templates, fans them out
/// across a bounded worker pool, merges their programme streams and writes
/// the result as XMLTV. Hard-fails only when the configuration store can't be
/// read or the output path can't be written; any other failure is isolated to
/// the team that produced it.
pub async fn generate_epg(ctx: &RunContext, db_pool: &SqlitePool, days_ahead: u32, timezone: &str) -> Result<GenerateEpgResult> {
    let started = Instant::now();
    ctx.status.begin("loading configuration");

    let teams = store::load_active_teams(db_pool).await?;
    if teams.is_empty() {
        tracing::warn!("no active teams with templates configured; writing an empty guide");
        crate::xmltv::write_xmltv_atomic(&[], &[], &ctx.settings.output_path)?;
        ctx.status.finish("no active teams configured");
        return Ok(GenerateEpgResult {
            teams: Vec::new(),
            programmes_by_team: HashMap::new(),
            stats: GenerationStats {
                team_count: 0,
                programme_count: 0,
                error_count: 0,
                elapsed_secs: started.elapsed().as_secs_f64(),
                deadline_exceeded: false,
            },
            errors: Vec::new(),
        });
    }

    let tz: Tz = timezone.parse().unwrap_or_else(|_| {
        tracing::warn!("unrecognized timezone '{}', falling back to UTC", timezone);
        Tz::UTC
    });
    let now = Utc::now();

    let semaphore = Arc::new(Semaphore::new(ctx.settings.team_concurrency.max(1)));
    let mut joinset: JoinSet<(Uuid, String, std::result::Result<Vec<Programme>, TeamGenerationError>)> = JoinSet::new();

    for team in &teams {
        let permit = semaphore.clone();
        let ctx = ctx.clone();
        let db_pool = db_pool.clone();
        let team = team.clone();
        joinset.spawn(async move {
            let _permit = permit.acquire_owned().await;
            let team_id = team.id;
            let team_name = team.name.clone();
            let result = run_one_team(&ctx, &db_pool, &team, now, days_ahead, &tz).await;
            (team_id, team_name, result)
        });
    }

    ctx.status.advance(10, format!("generating {} team guides", teams.len()));

    let team_count_total = teams.len();
    let mut programmes_by_team: HashMap<Uuid, Vec<Programme>> = HashMap::new();
    let mut errors: Vec<TeamGenerationError> = Vec::new();

    let remaining = Duration::from_secs(ctx.settings.generation_deadline_secs).saturating_sub(started.elapsed());
    let collect = tokio::time::timeout(remaining, async {
        let mut done = 0usize;
        while let Some(joined) = joinset.join_next().await {
            done += 1;
            ctx.status.advance(
                10 + ((done as f64 / team_count_total as f64) * 80.0) as u8,
                format!("{}/{} teams processed", done, team_count_total),
            );
            match joined {
                Ok((team_id, _team_name, Ok(programmes))) => {
                    programmes_by_team.insert(team_id, programmes);
                }
                Ok((_team_id, team_name, Err(e))) => {
                    tracing::warn!("team '{}' failed to generate: {}", team_name, e.reason);
                    errors.push(e);
                }
                Err(join_err) => {
                    tracing::warn!("a team generation task panicked: {}", join_err);
                }
            }
        }
    })
    .await;

    let deadline_exceeded = collect.is_err();
    if deadline_exceeded {
        joinset.abort_all();
        tracing::warn!(
            "generation deadline of {}s exceeded; returning partial results for {}/{} teams",
            ctx.settings.generation_deadline_secs,
            programmes_by_team.len(),
            team_count_total
        );
    }

    let channels: Vec<crate::xmltv::XmltvChannel> = teams
        .iter()
        .filter(|t| programmes_by_team.contains_key(&t.id))
        .map(|t| crate::xmltv::XmltvChannel {
            channel_id: Programme::channel_id_for("espn", &t.provider_team_id),
            display_name: t.name.clone(),
            icon: t.logo_url.clone(),
        })
        .collect();
    let all_programmes: Vec<Programme> = programmes_by_team.values().flatten().cloned().collect();

    crate::xmltv::write_xmltv_atomic(&channels, &all_programmes, &ctx.settings.output_path)?;

    let stats = GenerationStats {
        team_count: channels.len(),
        programme_count: all_programmes.len(),
        error_count: errors.len(),
        elapsed_secs: started.elapsed().as_secs_f64(),
        deadline_exceeded,
    };
    ctx.status.finish(format!(
        "generated {} programmes across {} teams ({} errors)",
        stats.programme_count, stats.team_count, stats.error_count
    ));

    Ok(GenerateEpgResult {
        teams,
        programmes_by_team,
        stats,
        errors,
    })
}

/// Crawls every known soccer league and rebuilds the persisted Tier S index.
/// Wraps [`TierSStore::refresh`], enforcing the concurrency floor of 50.
pub async fn refresh_soccer_cache(ctx: &RunContext, db_pool: &SqlitePool) -> Result<CacheRefreshSummary> {
    let store = TierSStore::new(db_pool.clone());
    store.ensure_schema().await?;
    store.refresh(&ctx.espn, ctx.settings.tier_s_refresh_concurrency.max(50)).await
}

/// Reads the current run status without blocking on anything in flight.
pub fn status(ctx: &RunContext) -> StatusSnapshot {
    ctx.status.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_idle_by_default() {
        let status = GenerationStatus::idle();
        let snap = status.snapshot();
        assert!(!snap.in_progress);
        assert_eq!(snap.percent, 0);
    }

    #[test]
    fn test_status_begin_then_finish() {
        let status = GenerationStatus::idle();
        status.begin("starting");
        assert!(status.snapshot().in_progress);
        status.advance(50, "halfway");
        assert_eq!(status.snapshot().percent, 50);
        status.finish("done");
        let snap = status.snapshot();
        assert!(!snap.in_progress);
        assert_eq!(snap.percent, 100);
        assert_eq!(snap.message, "done");
    }

    #[tokio::test]
    async fn test_generate_epg_with_no_teams_writes_empty_guide() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::store::ensure_schema(&pool).await.unwrap();
        let mut settings = Settings::for_test();
        let dir = tempfile::tempdir().unwrap();
        settings.output_path = dir.path().join("guide.xml").to_str().unwrap().to_string();

        let ctx = RunContext::build(settings, &pool).await.unwrap();
        let result = generate_epg(&ctx, &pool, 7, "UTC").await.unwrap();

        assert_eq!(result.teams.len(), 0);
        assert_eq!(result.stats.team_count, 0);
        assert!(!result.stats.deadline_exceeded);
        assert!(std::path::Path::new(&ctx.settings.output_path).exists());
    }
}
