//! Application configuration for sectorwise.
//!
//! User config lives at `~/.sectorwise/sectorwise.toml`.
//! Environment variables override config file values, which override
//! defaults. A missing file yields a fully-defaulted config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SectorwiseError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sectorwise.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sectorwise";

/// Env var overriding `[sources].api_url`.
pub const API_URL_ENV: &str = "SECTORWISE_API_URL";

/// Env var overriding `[sources].academic_api_url`.
pub const ACADEMIC_URL_ENV: &str = "SECTORWISE_ACADEMIC_URL";

// ---------------------------------------------------------------------------
// Config structs (matching sectorwise.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Retrieval policy knobs.
    #[serde(default)]
    pub retrieval: RetrievalPolicyConfig,

    /// Upstream source endpoints.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory holding the topic database.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "~/.sectorwise/data".into()
}

/// `[retrieval]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalPolicyConfig {
    /// Staleness window in days. A topic older than this is refreshed.
    #[serde(default = "default_staleness_days")]
    pub staleness_days: i64,

    /// TTL in seconds for cached refresh payloads (`api_<sector>` keys).
    #[serde(default = "default_cache_ttl_secs")]
    pub api_cache_ttl_secs: u64,

    /// TTL in seconds for cached academic resources (`academic_<sector>` keys).
    #[serde(default = "default_cache_ttl_secs")]
    pub academic_cache_ttl_secs: u64,

    /// Maximum number of search results returned.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Display snippet length in characters.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

impl Default for RetrievalPolicyConfig {
    fn default() -> Self {
        Self {
            staleness_days: default_staleness_days(),
            api_cache_ttl_secs: default_cache_ttl_secs(),
            academic_cache_ttl_secs: default_cache_ttl_secs(),
            search_limit: default_search_limit(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

fn default_staleness_days() -> i64 {
    7
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_search_limit() -> usize {
    10
}
fn default_snippet_chars() -> usize {
    200
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// External refresh API endpoint.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Academic resources API endpoint.
    #[serde(default)]
    pub academic_api_url: Option<String>,

    /// Request timeout in seconds for both endpoints.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            academic_api_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Resolved sources (config + environment)
// ---------------------------------------------------------------------------

/// Upstream endpoints after applying environment overrides.
#[derive(Debug, Clone)]
pub struct ResolvedSources {
    /// External refresh API endpoint.
    pub api_url: url::Url,
    /// Academic resources API endpoint.
    pub academic_api_url: url::Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Resolve source endpoints: env vars win over the config file.
///
/// Fails if either endpoint is missing from both, or is not a valid URL.
pub fn resolve_sources(config: &AppConfig) -> Result<ResolvedSources> {
    let api_url = resolve_endpoint(API_URL_ENV, config.sources.api_url.as_deref(), "api_url")?;
    let academic_api_url = resolve_endpoint(
        ACADEMIC_URL_ENV,
        config.sources.academic_api_url.as_deref(),
        "academic_api_url",
    )?;

    Ok(ResolvedSources {
        api_url,
        academic_api_url,
        timeout_secs: config.sources.timeout_secs,
    })
}

fn resolve_endpoint(env_var: &str, configured: Option<&str>, field: &str) -> Result<url::Url> {
    let value = match std::env::var(env_var) {
        Ok(v) if !v.is_empty() => v,
        _ => configured
            .map(String::from)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                SectorwiseError::config(format!(
                    "no {field} configured. Set [sources].{field} in sectorwise.toml \
                     or the {env_var} environment variable."
                ))
            })?,
    };

    url::Url::parse(&value)
        .map_err(|e| SectorwiseError::config(format!("invalid {field} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sectorwise/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SectorwiseError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sectorwise/sectorwise.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SectorwiseError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SectorwiseError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SectorwiseError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SectorwiseError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SectorwiseError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` in a configured path to the user's home directory.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| SectorwiseError::config("could not determine home directory"))?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(raw))
}
