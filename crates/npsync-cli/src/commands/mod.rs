//! Command handlers for the `npsync` binary.
//!
//! Shared bootstrap (config layers, database URLs, pools) lives here.

pub mod album;
pub mod db;
pub mod report;
pub mod subscenarios;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{info, warn};

use npsync_config::secrets::{resolve_database_urls, ResolvedDatabaseUrls};
use npsync_config::{
    load_with_defaults, report_unused_keys, LoadedConfig, RewardSettings, RunSettings,
    UnusedKeyPolicy,
};
use npsync_core::RewardBundle;

/// Built-in defaults plus every `--config` layer.
pub fn load_config(config_paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    load_with_defaults(&path_refs)
}

/// Everything a reconciliation command needs before touching the database.
pub struct RunContext {
    pub settings: RunSettings,
    pub urls: ResolvedDatabaseUrls,
}

pub fn load_run_context(config_paths: &[String]) -> Result<RunContext> {
    let loaded = load_config(config_paths)?;

    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &unused.unused_leaf_pointers {
        warn!(pointer = %ptr, "unused config key");
    }

    let settings = RunSettings::from_config_json(&loaded.config_json)?;
    let urls = resolve_database_urls(&loaded.config_json)?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    Ok(RunContext {
        settings,
        urls,
    })
}

/// User state pool and catalog pool. They share one pool unless a separate
/// catalog database is configured.
pub struct Pools {
    pub main: PgPool,
    pub catalog: PgPool,
}

pub async fn connect_pools(urls: &ResolvedDatabaseUrls) -> Result<Pools> {
    let main = npsync_db::connect(&urls.main)
        .await
        .context("main database")?;
    let catalog = match &urls.catalog {
        Some(url) => npsync_db::connect(url)
            .await
            .context("catalog database")?,
        None => main.clone(),
    };
    Ok(Pools { main, catalog })
}

pub fn reward_bundle(r: &RewardSettings) -> RewardBundle {
    RewardBundle::currency_pair(r.premium_token_amount, r.soft_currency_amount, r.comment.clone())
}
