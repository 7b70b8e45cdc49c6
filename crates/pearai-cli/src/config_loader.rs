//! Options file discovery and loading.
//!
//! The discovery order is:
//! 1. The `--config` flag.
//! 2. `PEARAI_CONFIG` environment variable.
//! 3. `~/.pearai/config.json`
//! 4. If none found, default options.
//!
//! Keys may be written in snake_case or in the camelCase used by the
//! editor's settings file; [`ApiHandlerOptions`] accepts both. Missing API
//! keys are then filled from the environment.

use std::path::{Path, PathBuf};

use anyhow::Context;
use pearai_llm::ApiHandlerOptions;

/// Environment variable naming an options file.
pub const CONFIG_ENV_VAR: &str = "PEARAI_CONFIG";

/// Discover the options file using the fallback chain.
///
/// An explicit flag or environment path is returned as-is so that a typo
/// surfaces as an error; the home-directory default is only returned when
/// it exists.
pub fn discover_config_path(
    flag: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    home_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path.to_path_buf());
    }

    if let Some(env_path) = env(CONFIG_ENV_VAR).filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(env_path));
    }

    let default = home_dir?.join(".pearai").join("config.json");
    default.exists().then_some(default)
}

/// Load options from the discovered file, then apply env key overrides.
pub async fn load_options(
    flag: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    home_dir: Option<PathBuf>,
) -> anyhow::Result<ApiHandlerOptions> {
    let mut options = match discover_config_path(flag, &env, home_dir) {
        Some(path) => read_options(&path).await?,
        None => {
            tracing::info!("no config file found, using defaults");
            ApiHandlerOptions::default()
        }
    };
    options.apply_env_overrides(&env);
    Ok(options)
}

async fn read_options(path: &Path) -> anyhow::Result<ApiHandlerOptions> {
    tracing::debug!(path = %path.display(), "loading config file");
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
