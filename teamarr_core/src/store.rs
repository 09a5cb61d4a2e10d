//! Reads the persisted Team/Template/Settings records the orchestrator needs
//! to drive a generation run.
//!
//! The schema here is deliberately minimal: teams and templates are owned by
//! an external control plane (out of scope per the core's boundary), but the
//! core still needs *some* concrete store to read from when run as a binary.
//! JSON-valued template fields (description options, categories, flags) are
//! stored as TEXT blobs and parsed once at load time into the typed
//! representations the template engine expects.

use crate::error::{Result, TeamarrError};
use crate::models::{Team, Template};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            provider_team_id TEXT NOT NULL,
            league_code TEXT NOT NULL,
            name TEXT NOT NULL,
            abbrev TEXT NOT NULL,
            logo_url TEXT,
            template_id TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| TeamarrError::upstream_unavailable("store_schema", e.to_string()))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS templates (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            template_type TEXT NOT NULL,
            title_format TEXT NOT NULL,
            subtitle_format TEXT,
            description_options TEXT NOT NULL,
            pregame_enabled INTEGER NOT NULL,
            pregame_minutes INTEGER NOT NULL,
            pregame_template TEXT,
            postgame_enabled INTEGER NOT NULL,
            postgame_minutes INTEGER NOT NULL,
            postgame_template TEXT,
            idle_enabled INTEGER NOT NULL,
            idle_template TEXT,
            max_program_hours REAL NOT NULL,
            game_duration_mode TEXT NOT NULL,
            custom_duration_minutes INTEGER,
            midnight_crossover_mode TEXT NOT NULL,
            categories TEXT NOT NULL,
            flags TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| TeamarrError::upstream_unavailable("store_schema", e.to_string()))?;

    Ok(())
}

/// All teams with `active = true`, read into an immutable snapshot at run
/// start: configuration is read once at run start, and store mutations
/// during a run don't affect the in-progress run.
pub async fn load_active_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let rows = sqlx::query("SELECT id, provider_team_id, league_code, name, abbrev, logo_url, template_id, active FROM teams WHERE active = 1")
        .fetch_all(pool)
        .await
        .map_err(|e| TeamarrError::upstream_unavailable("store_load_teams", e.to_string()))?;

    rows.into_iter()
        .map(|row| {
            let id: String = row.try_get("id").map_err(row_err)?;
            let template_id: String = row.try_get("template_id").map_err(row_err)?;
            Ok(Team {
                id: Uuid::parse_str(&id).map_err(|e| TeamarrError::upstream_malformed("store_load_teams", e.to_string()))?,
                provider_team_id: row.try_get("provider_team_id").map_err(row_err)?,
                league_code: row.try_get("league_code").map_err(row_err)?,
                name: row.try_get("name").map_err(row_err)?,
                abbrev: row.try_get("abbrev").map_err(row_err)?,
                logo_url: row.try_get("logo_url").map_err(row_err)?,
                template_id: Uuid::parse_str(&template_id).map_err(|e| TeamarrError::upstream_malformed("store_load_teams", e.to_string()))?,
                active: row.try_get::<i64, _>("active").map_err(row_err)? != 0,
            })
        })
        .collect()
}

pub async fn load_template(pool: &SqlitePool, template_id: Uuid) -> Result<Template> {
    let row = sqlx::query(
        "SELECT id, name, template_type, title_format, subtitle_format, description_options, \
         pregame_enabled, pregame_minutes, pregame_template, postgame_enabled, postgame_minutes, postgame_template, \
         idle_enabled, idle_template, max_program_hours, game_duration_mode, custom_duration_minutes, \
         midnight_crossover_mode, categories, flags FROM templates WHERE id = ?",
    )
    .bind(template_id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| TeamarrError::upstream_unavailable("store_load_template", e.to_string()))?
    .ok_or_else(|| TeamarrError::upstream_malformed("store_load_template", format!("no template with id {}", template_id)))?;

    let description_options_raw: String = row.try_get("description_options").map_err(row_err)?;
    let description_options = serde_json::from_str(&description_options_raw)
        .map_err(|e| TeamarrError::upstream_malformed("store_load_template", format!("bad description_options json: {}", e)))?;

    let categories_raw: String = row.try_get("categories").map_err(row_err)?;
    let categories: Vec<String> = serde_json::from_str(&categories_raw)
        .map_err(|e| TeamarrError::upstream_malformed("store_load_template", format!("bad categories json: {}", e)))?;

    let flags_raw: String = row.try_get("flags").map_err(row_err)?;
    let flags: HashSet<String> = serde_json::from_str(&flags_raw)
        .map_err(|e| TeamarrError::upstream_malformed("store_load_template", format!("bad flags json: {}", e)))?;

    let template_type_raw: String = row.try_get("template_type").map_err(row_err)?;
    let game_duration_mode_raw: String = row.try_get("game_duration_mode").map_err(row_err)?;
    let midnight_crossover_mode_raw: String = row.try_get("midnight_crossover_mode").map_err(row_err)?;

    Ok(Template {
        id: template_id,
        name: row.try_get("name").map_err(row_err)?,
        template_type: serde_json::from_value(serde_json::Value::String(template_type_raw))
            .map_err(|e| TeamarrError::upstream_malformed("store_load_template", e.to_string()))?,
        title_format: row.try_get("title_format").map_err(row_err)?,
        subtitle_format: row.try_get("subtitle_format").map_err(row_err)?,
        description_options,
        pregame_enabled: row.try_get::<i64, _>("pregame_enabled").map_err(row_err)? != 0,
        pregame_minutes: row.try_get::<i64, _>("pregame_minutes").map_err(row_err)? as u32,
        pregame_template: row.try_get("pregame_template").map_err(row_err)?,
        postgame_enabled: row.try_get::<i64, _>("postgame_enabled").map_err(row_err)? != 0,
        postgame_minutes: row.try_get::<i64, _>("postgame_minutes").map_err(row_err)? as u32,
        postgame_template: row.try_get("postgame_template").map_err(row_err)?,
        idle_enabled: row.try_get::<i64, _>("idle_enabled").map_err(row_err)? != 0,
        idle_template: row.try_get("idle_template").map_err(row_err)?,
        max_program_hours: row.try_get("max_program_hours").map_err(row_err)?,
        game_duration_mode: serde_json::from_value(serde_json::Value::String(game_duration_mode_raw))
            .map_err(|e| TeamarrError::upstream_malformed("store_load_template", e.to_string()))?,
        custom_duration_minutes: row.try_get::<Option<i64>, _>("custom_duration_minutes").map_err(row_err)?.map(|v| v as u32),
        midnight_crossover_mode: serde_json::from_value(serde_json::Value::String(midnight_crossover_mode_raw))
            .map_err(|e| TeamarrError::upstream_malformed("store_load_template", e.to_string()))?,
        categories,
        flags,
    })
}

fn row_err(e: sqlx::Error) -> TeamarrError {
    TeamarrError::upstream_unavailable("store_row", e.to_string())
}
