use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::AppConfig;

/// Values of `CODEX_TIMEOUT` above this are read as milliseconds.
const TIMEOUT_MILLIS_THRESHOLD: u64 = 10_000;

/// Get the default data directory: ~/.codeagent
pub fn get_codeagent_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".codeagent"))
        .ok_or_else(|| ConfigError::Invalid("cannot determine home directory".to_string()))
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn load_default() -> Result<AppConfig, ConfigError> {
    // Priority 1: ~/.codeagent/config.toml
    let data_dir = get_codeagent_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./codeagent.toml
    let local_config = Path::new("codeagent.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Environment overrides (highest priority). `lookup` abstracts `std::env::var` for tests.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(raw) = get("CODEX_TIMEOUT") {
        match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => {
                cfg.executor.timeout_secs = if v > TIMEOUT_MILLIS_THRESHOLD {
                    v / 1000
                } else {
                    v
                };
            }
            _ => tracing::warn!(value = %raw, "invalid CODEX_TIMEOUT, keeping {}s", cfg.executor.timeout_secs),
        }
    }

    if let Some(raw) = get("CODEAGENT_FORCE_KILL_DELAY") {
        match raw.trim().parse::<u64>() {
            Ok(v) => cfg.executor.force_kill_delay_secs = v,
            Err(_) => tracing::warn!(value = %raw, "invalid CODEAGENT_FORCE_KILL_DELAY"),
        }
    }

    if let Some(raw) = get("CODEAGENT_ASCII_MODE") {
        cfg.report.ascii = raw.trim().eq_ignore_ascii_case("true");
    }

    if let Some(raw) = get("CODEAGENT_SKIP_PERMISSIONS") {
        cfg.backend.skip_permissions = raw.trim().eq_ignore_ascii_case("true");
    }

    if let Some(raw) = get("CODEAGENT_BACKEND") {
        cfg.backend.default = raw.trim().to_string();
    }
}
