//! Command-line entry point: loads configuration, builds the shared
//! [`RunContext`], and dispatches to a generation subcommand.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use teamarr_core::config::Settings;
use teamarr_core::db::health::{PoolHealthConfig, PoolHealthMonitor};
use teamarr_core::db::{create_default_pool, create_high_concurrency_pool};
use teamarr_core::orchestrator::{self, RunContext};

#[derive(Parser)]
#[command(name = "teamarr", about = "Generates XMLTV EPG feeds for sports team channels", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full generation and write the configured XMLTV output.
    Generate {
        /// How many days ahead of now to synthesize programmes for.
        #[arg(long)]
        days_ahead: Option<u32>,
        /// IANA timezone used for local-day boundary calculations.
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Crawl every known soccer league and rebuild the Tier S cache.
    RefreshSoccerCache,
    /// Print the status of the most recent (or in-flight) generation run.
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pool = match create_default_pool().await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("failed to open database pool: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Detached: a generation run can take up to the configured deadline
    // (minutes) of sustained concurrent upstream + DB activity, so it's
    // worth watching the pool for the duration of the process. Dropping the
    // returned `JoinHandle` doesn't stop the task — it keeps running until
    // the process exits.
    let _ = PoolHealthMonitor::new(pool.clone(), PoolHealthConfig::from_env()).start_background();

    if let Err(e) = teamarr_core::store::ensure_schema(&pool).await {
        tracing::error!("failed to initialize team/template schema: {}", e);
        return ExitCode::FAILURE;
    }

    let days_ahead_default = settings.days_ahead;
    let timezone_default = settings.epg_timezone.clone();

    let ctx = match RunContext::build(settings, &pool).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("failed to build run context: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Generate { days_ahead, timezone } => {
            let days_ahead = days_ahead.unwrap_or(days_ahead_default);
            let timezone = timezone.unwrap_or(timezone_default);

            match orchestrator::generate_epg(&ctx, &pool, days_ahead, &timezone).await {
                Ok(result) => {
                    tracing::info!(
                        "wrote {} programmes across {} teams ({} errors, {:.1}s)",
                        result.stats.programme_count,
                        result.stats.team_count,
                        result.stats.error_count,
                        result.stats.elapsed_secs,
                    );
                    for error in &result.errors {
                        tracing::warn!("team '{}' ({}): {}", error.team_name, error.team_id, error.reason);
                    }
                    if result.stats.deadline_exceeded {
                        tracing::warn!("generation deadline exceeded; result is partial");
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("generation failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::RefreshSoccerCache => {
            // The crawl fans out across ~244 leagues at >=50 concurrent
            // connections, so it gets its own pool sized for that instead of
            // the default, request-sized one.
            let refresh_pool = match create_high_concurrency_pool().await {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!("failed to open high-concurrency database pool: {:#}", e);
                    return ExitCode::FAILURE;
                }
            };
            match orchestrator::refresh_soccer_cache(&ctx, &refresh_pool).await {
                Ok(summary) => {
                    tracing::info!(
                        "refreshed {} leagues, indexed {} teams in {:.1}s",
                        summary.leagues_processed,
                        summary.teams_indexed,
                        summary.duration.as_secs_f64(),
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("soccer cache refresh failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Status => {
            let snapshot = orchestrator::status(&ctx);
            println!(
                "in_progress={} percent={} message={:?}",
                snapshot.in_progress, snapshot.percent, snapshot.message
            );
            ExitCode::SUCCESS
        }
    }
}
