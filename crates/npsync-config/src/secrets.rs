//! Database URL resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"NPSYNC_DATABASE_URL"`).
//! - Callers invoke [`resolve_database_urls`] once at startup and pass the
//!   result to the connection layer.
//! - `Debug` redacts URLs; errors name the variable, never the value.

use anyhow::{bail, Result};
use serde_json::Value;

pub const DEFAULT_DATABASE_URL_ENV: &str = "NPSYNC_DATABASE_URL";
pub const DEFAULT_CATALOG_DATABASE_URL_ENV: &str = "NPSYNC_CATALOG_DATABASE_URL";

/// Connection URLs resolved from the environment.
#[derive(Clone)]
pub struct ResolvedDatabaseUrls {
    /// User state database. Always required.
    pub main: String,
    /// Game catalog database. `None` means the catalog lives in `main`.
    pub catalog: Option<String>,
}

impl ResolvedDatabaseUrls {
    pub fn catalog_or_main(&self) -> &str {
        self.catalog.as_deref().unwrap_or(&self.main)
    }
}

impl std::fmt::Debug for ResolvedDatabaseUrls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedDatabaseUrls")
            .field("main", &"<REDACTED>")
            .field("catalog", &self.catalog.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Read a non-empty string value at `pointer`.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Unset or blank variables resolve to `None`.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Env var names configured for the main and catalog databases.
pub fn database_env_names(config_json: &Value) -> (String, String) {
    (
        read_str_at(config_json, "/database/url_env")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL_ENV.to_string()),
        read_str_at(config_json, "/database/catalog_url_env")
            .unwrap_or_else(|| DEFAULT_CATALOG_DATABASE_URL_ENV.to_string()),
    )
}

/// # Errors
/// `SECRETS_MISSING` naming the main URL variable when it is unset or blank.
pub fn resolve_database_urls(config_json: &Value) -> Result<ResolvedDatabaseUrls> {
    let (main_var, catalog_var) = database_env_names(config_json);

    let Some(main) = resolve_env(&main_var) else {
        bail!(
            "SECRETS_MISSING: required env var '{}' (database url) is not set or empty",
            main_var
        );
    };

    Ok(ResolvedDatabaseUrls {
        main,
        catalog: resolve_env(&catalog_var),
    })
}
