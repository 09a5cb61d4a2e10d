//! Database connection health monitoring.
//!
//! Provides health checks and monitoring for the SQLite pool backing Tier S
//! and Tier P.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{error, info};

/// Check if database pool is healthy
pub async fn check_pool_health(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("database health check failed")?;
    Ok(())
}

/// Configuration for pool health monitoring
#[derive(Clone, Debug)]
pub struct PoolHealthConfig {
    /// Interval between health checks
    pub check_interval: Duration,
    /// Number of consecutive failures before alerting
    pub alert_threshold: u32,
    /// Whether to enable health monitoring
    pub enabled: bool,
}

impl Default for PoolHealthConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PoolHealthConfig {
    pub fn from_env() -> Self {
        Self {
            check_interval: Duration::from_secs(
                std::env::var("DB_HEALTH_CHECK_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            alert_threshold: std::env::var("DB_HEALTH_ALERT_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            enabled: std::env::var("DB_HEALTH_CHECK_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

/// Monitor that continuously checks database pool health while a generation
/// run's background refresh workers are active.
pub struct PoolHealthMonitor {
    pool: SqlitePool,
    config: PoolHealthConfig,
}

impl PoolHealthMonitor {
    pub fn new(pool: SqlitePool, config: PoolHealthConfig) -> Self {
        Self { pool, config }
    }

    /// Start monitoring loop (runs forever — spawn this, don't await it inline).
    pub async fn start_monitoring(self) {
        if !self.config.enabled {
            info!("database health monitoring is disabled");
            return;
        }

        info!(
            "starting database health monitoring (interval: {:?}, alert threshold: {})",
            self.config.check_interval, self.config.alert_threshold
        );

        let mut consecutive_failures = 0u32;

        loop {
            match check_pool_health(&self.pool).await {
                Ok(_) => {
                    if consecutive_failures > 0 {
                        info!(
                            "database connection recovered after {} failures",
                            consecutive_failures
                        );
                        consecutive_failures = 0;
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    error!(
                        "database health check failed (attempt {}/{}): {}",
                        consecutive_failures, self.config.alert_threshold, e
                    );
                }
            }

            tokio::time::sleep(self.config.check_interval).await;
        }
    }

    pub fn start_background(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.start_monitoring().await;
        })
    }
}

/// Get database pool statistics
pub async fn get_pool_stats(pool: &SqlitePool) -> PoolStats {
    PoolStats {
        size: pool.size(),
        idle: pool.num_idle(),
    }
}

/// Database pool statistics
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

impl PoolStats {
    pub fn active(&self) -> u32 {
        self.size.saturating_sub(self.idle as u32)
    }
}
