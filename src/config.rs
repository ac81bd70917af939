//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `ROSTER_API_BASE_URL`, `ROSTER_STORAGE_DIR` and
//! `ROSTER_LOG_LEVEL` env overrides. A missing file falls back to built-in
//! defaults; base-URL resolution itself never fails.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;

/// Base URL used when neither the environment nor the config file provide one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost/api";

const DEFAULT_STORAGE_DIR: &str = "~/.roster";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Fully-resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL prefixed to all API requests. Resolved once at startup,
    /// immutable afterwards.
    pub api_base_url: String,
    /// Directory holding persistent client state — the `token` file lives
    /// here. Already expanded, no `~`.
    pub storage_dir: PathBuf,
    pub log_level: String,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    api: RawApi,
    #[serde(default)]
    client: RawClient,
}

#[derive(Deserialize, Default)]
struct RawApi {
    base_url: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawClient {
    storage_dir: Option<String>,
    log_level: Option<String>,
}

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let base_url_override = env::var("ROSTER_API_BASE_URL").ok();
    let storage_dir_override = env::var("ROSTER_STORAGE_DIR").ok();
    let log_level_override = env::var("ROSTER_LOG_LEVEL").ok();
    load_from(
        Path::new("config/default.toml"),
        base_url_override.as_deref(),
        storage_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    base_url_override: Option<&str>,
    storage_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = if path.exists() {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str::<RawConfig>(&text)
            .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?
    } else {
        debug!(path = %path.display(), "config file not found, using defaults");
        RawConfig::default()
    };

    let api_base_url = resolve_base_url(base_url_override, raw.api.base_url.as_deref());

    let storage_dir_str = storage_dir_override
        .map(str::to_string)
        .or(raw.client.storage_dir)
        .unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string());
    let storage_dir = expand_home(&storage_dir_str);

    let log_level = log_level_override
        .map(str::to_string)
        .or(raw.client.log_level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    Ok(Config {
        api_base_url,
        storage_dir,
        log_level,
    })
}

/// Resolve the API base URL from the layered sources.
///
/// Priority: env value (set and non-empty, `.env` files included since the
/// binary loads them into the process environment first) → config file value
/// (set and non-empty) → [`DEFAULT_API_BASE_URL`]. Always returns a
/// non-empty string.
pub fn resolve_base_url(env_value: Option<&str>, file_value: Option<&str>) -> String {
    if let Some(url) = env_value.filter(|v| !v.is_empty()) {
        debug!(%url, "api base url from environment");
        return url.to_string();
    }
    if let Some(url) = file_value.filter(|v| !v.is_empty()) {
        debug!(%url, "api base url from config file");
        return url.to_string();
    }
    debug!(url = DEFAULT_API_BASE_URL, "api base url fallback");
    DEFAULT_API_BASE_URL.to_string()
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
