//! Tier S: the semi-permanent, scheduled-refresh soccer league index.
//!
//! Persisted in `soccer_team_leagues` / `soccer_leagues` / `soccer_cache_meta`.
//! Refreshed weekly (or on explicit trigger) by crawling every known soccer
//! league concurrently through a bounded worker pool, then loaded once into
//! an in-memory [`SoccerTeamLeagueIndex`] for the duration of a generation run
//! — Tier S is read many times per run but written only by the refresh path.

use crate::clients::espn::EspnClient;
use crate::error::{Result, TeamarrError};
use crate::team_cache::{tags_for_league_slug, CacheRefreshSummary, LeagueMeta, SoccerTeamLeagueIndex};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// All soccer league slugs the refresh crawls. A production deployment would
/// discover this list from the provider's leagues index; a static table is
/// sufficient here since the set changes rarely.
pub const KNOWN_SOCCER_LEAGUE_SLUGS: &[&str] = &[
    "eng.1", "esp.1", "ger.1", "ita.1", "fra.1", "usa.1", "uefa.champions", "uefa.europa",
];

pub struct TierSStore {
    pool: SqlitePool,
}

impl TierSStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS soccer_leagues (
                slug TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                abbreviation TEXT NOT NULL,
                logo_url TEXT,
                team_count INTEGER NOT NULL,
                tags TEXT NOT NULL,
                last_refreshed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| TeamarrError::upstream_unavailable("tier_s_schema", e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS soccer_team_leagues (
                provider_team_id TEXT NOT NULL,
                league_slug TEXT NOT NULL,
                PRIMARY KEY (provider_team_id, league_slug)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| TeamarrError::upstream_unavailable("tier_s_schema", e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS soccer_cache_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_refreshed_at TEXT NOT NULL,
                leagues_processed INTEGER NOT NULL,
                teams_indexed INTEGER NOT NULL,
                duration_ms INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| TeamarrError::upstream_unavailable("tier_s_schema", e.to_string()))?;

        Ok(())
    }

    /// Whether the last full refresh is older than `staleness_threshold` (7 days
    /// by default), or has never run.
    pub async fn is_stale(&self, staleness_threshold: Duration) -> Result<bool> {
        let row: Option<(String,)> = sqlx::query_as("SELECT last_refreshed_at FROM soccer_cache_meta WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_s_meta", e.to_string()))?;

        let Some((raw,)) = row else {
            return Ok(true);
        };
        let last: DateTime<Utc> = raw
            .parse()
            .map_err(|_| TeamarrError::upstream_malformed("tier_s_meta", "unparsable last_refreshed_at"))?;

        Ok(Utc::now() - last > chrono::Duration::from_std(staleness_threshold).unwrap_or_default())
    }

    /// Crawl every known soccer league concurrently (bounded by `concurrency`,
    /// floor 50) and persist the resulting team/league index.
    pub async fn refresh(&self, espn: &EspnClient, concurrency: usize) -> Result<CacheRefreshSummary> {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut joinset: JoinSet<(String, Result<Vec<(LeagueMeta, Vec<String>)>>)> = JoinSet::new();

        for &slug in KNOWN_SOCCER_LEAGUE_SLUGS {
            let permit = semaphore.clone();
            let espn = espn.clone();
            let slug = slug.to_string();
            joinset.spawn(async move {
                let _permit = permit.acquire_owned().await;
                let result = crawl_one_league(&espn, &slug).await;
                (slug, result.map(|r| vec![r]))
            });
        }

        let mut index = SoccerTeamLeagueIndex::new();
        let mut leagues_processed = 0usize;

        while let Some(joined) = joinset.join_next().await {
            let (slug, result) = joined.map_err(|e| TeamarrError::upstream_unavailable("tier_s_refresh", e.to_string()))?;
            match result {
                Ok(rows) => {
                    for (meta, team_ids) in rows {
                        index.register_league(meta, &team_ids);
                    }
                    leagues_processed += 1;
                }
                Err(e) => {
                    tracing::warn!("soccer league crawl failed for '{}': {}", slug, e);
                }
            }
        }

        self.persist(&index, started.elapsed()).await?;

        Ok(CacheRefreshSummary {
            leagues_processed,
            teams_indexed: index.team_count(),
            duration: started.elapsed(),
        })
    }

    async fn persist(&self, index: &SoccerTeamLeagueIndex, duration: Duration) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_s_persist", e.to_string()))?;

        sqlx::query("DELETE FROM soccer_leagues")
            .execute(&mut *tx)
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_s_persist", e.to_string()))?;
        sqlx::query("DELETE FROM soccer_team_leagues")
            .execute(&mut *tx)
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_s_persist", e.to_string()))?;

        for league in index.all_leagues() {
            let tags = league.tags.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(",");
            sqlx::query(
                "INSERT INTO soccer_leagues (slug, name, abbreviation, logo_url, team_count, tags, last_refreshed_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&league.slug)
            .bind(&league.name)
            .bind(&league.abbreviation)
            .bind(&league.logo_url)
            .bind(league.team_count as i64)
            .bind(tags)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_s_persist", e.to_string()))?;
        }

        sqlx::query(
            "INSERT INTO soccer_cache_meta (id, last_refreshed_at, leagues_processed, teams_indexed, duration_ms) VALUES (1, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET last_refreshed_at = excluded.last_refreshed_at, leagues_processed = excluded.leagues_processed, teams_indexed = excluded.teams_indexed, duration_ms = excluded.duration_ms",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(index.league_count() as i64)
        .bind(index.team_count() as i64)
        .bind(duration.as_millis() as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| TeamarrError::upstream_unavailable("tier_s_persist", e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_s_persist", e.to_string()))
    }

    /// Load the full index into memory for consultation during a generation run.
    pub async fn load_index(&self) -> Result<SoccerTeamLeagueIndex> {
        let league_rows: Vec<(String, String, String, Option<String>, i64, String)> = sqlx::query_as(
            "SELECT slug, name, abbreviation, logo_url, team_count, tags FROM soccer_leagues",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TeamarrError::upstream_unavailable("tier_s_load", e.to_string()))?;

        let team_rows: Vec<(String, String)> =
            sqlx::query_as("SELECT provider_team_id, league_slug FROM soccer_team_leagues")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| TeamarrError::upstream_unavailable("tier_s_load", e.to_string()))?;

        let mut index = SoccerTeamLeagueIndex::new();
        for (slug, name, abbreviation, logo_url, team_count, _tags) in league_rows {
            let teams: Vec<String> = team_rows
                .iter()
                .filter(|(_, s)| *s == slug)
                .map(|(t, _)| t.clone())
                .collect();
            index.register_league(
                LeagueMeta {
                    slug: slug.clone(),
                    name,
                    abbreviation,
                    logo_url,
                    team_count: team_count as usize,
                    tags: tags_for_league_slug(&slug),
                },
                &teams,
            );
        }

        Ok(index)
    }
}

/// Fetches today's scoreboard for one league and reduces it to the set of
/// participating provider team ids plus minimal league metadata.
async fn crawl_one_league(espn: &EspnClient, league_slug: &str) -> Result<(LeagueMeta, Vec<String>)> {
    let today = Utc::now().date_naive();
    let doc = espn.fetch_scoreboard("soccer", league_slug, today, None).await?;

    let mut team_ids: Vec<String> = doc
        .events
        .iter()
        .flat_map(|e| [e.home.team_id.clone(), e.away.team_id.clone()])
        .filter(|id| !id.is_empty())
        .collect();
    team_ids.sort();
    team_ids.dedup();

    Ok((
        LeagueMeta {
            slug: league_slug.to_string(),
            name: league_slug.to_string(),
            abbreviation: league_slug.to_uppercase(),
            logo_url: None,
            team_count: team_ids.len(),
            tags: tags_for_league_slug(league_slug),
        },
        team_ids,
    ))
}
