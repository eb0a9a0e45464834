//! Client configuration discovery
//!
//! Sources, first match wins:
//! 1. Process environment (after merging a `.env` file, if present)
//! 2. A config file, either passed explicitly or found by probing
//!
//! Environment:
//! - `COURSEHUB_API_URL` (required for the environment source)
//! - `COURSEHUB_TIMEOUT_SECS`
//! - `COURSEHUB_LOGIN_PATH`
//! - `COURSEHUB_KEYCHAIN_SERVICE`
//!
//! Probed file names are `coursehub.{toml,json}` then `config.{toml,json}`,
//! looked up in the working directory, its two parents, the executable's
//! directory and its two parents. Fields missing from a file take their
//! defaults.

use std::path::{Path, PathBuf};

use coursehub_domain::constants::{
    ENV_API_URL, ENV_KEYCHAIN_SERVICE, ENV_LOGIN_PATH, ENV_TIMEOUT_SECS,
};
use coursehub_domain::{ClientConfig, CoursehubError, Result};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["coursehub.toml", "coursehub.json", "config.toml", "config.json"];

/// Resolve the client configuration for this process
///
/// The config file is only consulted when `COURSEHUB_API_URL` is unset. A
/// set but invalid environment is an error, never silently replaced by a
/// file.
///
/// # Errors
/// `CoursehubError::Config` if the environment is invalid, or if it is
/// absent and no usable config file is found.
pub fn load() -> Result<ClientConfig> {
    if let Ok(dotenv) = dotenvy::dotenv() {
        tracing::debug!(path = %dotenv.display(), "Merged .env into environment");
    }

    if optional_env(ENV_API_URL).is_none() {
        tracing::debug!(var = ENV_API_URL, "Variable unset, looking for a config file");
        return load_from_file(None);
    }

    load_from_env()
}

/// Build a configuration from `COURSEHUB_*` variables
///
/// # Errors
/// `CoursehubError::Config` if `COURSEHUB_API_URL` is unset or any value
/// fails validation.
pub fn load_from_env() -> Result<ClientConfig> {
    let base_url = optional_env(ENV_API_URL).ok_or_else(|| {
        CoursehubError::Config(format!("Missing required environment variable: {ENV_API_URL}"))
    })?;
    let mut config = ClientConfig { base_url, ..ClientConfig::default() };

    if let Some(raw) = optional_env(ENV_TIMEOUT_SECS) {
        config.timeout_secs = raw
            .parse()
            .map_err(|e| CoursehubError::Config(format!("{ENV_TIMEOUT_SECS}='{raw}': {e}")))?;
    }
    config.login_path = optional_env(ENV_LOGIN_PATH).unwrap_or(config.login_path);
    config.keychain_service = optional_env(ENV_KEYCHAIN_SERVICE).unwrap_or(config.keychain_service);

    tracing::info!(base_url = %config.base_url, "Using configuration from environment");
    validate(config)
}

/// Read a TOML or JSON configuration file
///
/// With `None`, the standard locations are probed.
///
/// # Errors
/// `CoursehubError::Config` if no file is found, it cannot be read or
/// parsed, or the result fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let path = match path {
        Some(explicit) if explicit.exists() => explicit,
        Some(explicit) => {
            return Err(CoursehubError::Config(format!(
                "Config file {} does not exist",
                explicit.display()
            )))
        }
        None => probe_config_paths().ok_or_else(|| {
            CoursehubError::Config(format!("None of {CONFIG_FILE_NAMES:?} found"))
        })?,
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| CoursehubError::Config(format!("Cannot read {}: {e}", path.display())))?;

    tracing::info!(path = %path.display(), "Using configuration file");
    validate(parse_config(&contents, &path)?)
}

fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(contents)
            .map_err(|e| CoursehubError::Config(format!("{}: {e}", path.display()))),
        Some("json") | None => serde_json::from_str(contents)
            .map_err(|e| CoursehubError::Config(format!("{}: {e}", path.display()))),
        Some(other) => Err(CoursehubError::Config(format!("Unsupported config format: .{other}"))),
    }
}

/// Reject configurations the client could never use
fn validate(config: ClientConfig) -> Result<ClientConfig> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| CoursehubError::Config(format!("Invalid base URL '{}': {e}", config.base_url)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CoursehubError::Config(format!(
            "Base URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.timeout_secs == 0 {
        return Err(CoursehubError::Config("Timeout must be at least one second".to_string()));
    }

    Ok(config)
}

/// First existing config file in the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf));
    let anchors = std::env::current_dir().ok().into_iter().chain(exe_dir);

    anchors
        .flat_map(|anchor| [anchor.clone(), anchor.join(".."), anchor.join("../..")])
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Trimmed value of `key`; unset and blank are both `None`
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
