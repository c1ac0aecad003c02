//! Application configuration for qagraph.
//!
//! User config lives at `~/.qagraph/qagraph.toml`.
//! A `--config` path overrides the default location; missing keys fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{QaGraphError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "qagraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".qagraph";

// ---------------------------------------------------------------------------
// Config structs (matching qagraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// NLP service endpoints.
    #[serde(default)]
    pub services: ServicesConfig,

    /// Memoization of service responses.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// `[services]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Coreference resolver endpoint.
    #[serde(default = "default_coref_url")]
    pub coref_url: String,

    /// Dependency parser endpoint.
    #[serde(default = "default_parser_url")]
    pub parser_url: String,

    /// Tokenize + POS + NER tagger endpoint.
    #[serde(default = "default_tagger_url")]
    pub tagger_url: String,

    /// Per-request timeout. Model inference on long contexts is slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            coref_url: default_coref_url(),
            parser_url: default_parser_url(),
            tagger_url: default_tagger_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_coref_url() -> String {
    "http://127.0.0.1:8000/coref".into()
}
fn default_parser_url() -> String {
    "http://127.0.0.1:8000/parse".into()
}
fn default_tagger_url() -> String {
    "http://127.0.0.1:8000/tag".into()
}
fn default_timeout_secs() -> u64 {
    120
}

/// Lifetime of the single-entry response caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Caches live for the whole batch; consecutive records sharing a text reuse the response.
    #[default]
    Batch,
    /// Caches are cleared before every record.
    Document,
}

/// `[cache]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub scope: CacheScope,
}

// ---------------------------------------------------------------------------
// Service endpoints (runtime, validated from config)
// ---------------------------------------------------------------------------

/// Validated service endpoints, ready for the HTTP clients.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub coref: Url,
    pub parser: Url,
    pub tagger: Url,
    pub timeout_secs: u64,
}

impl TryFrom<&ServicesConfig> for ServiceEndpoints {
    type Error = QaGraphError;

    fn try_from(config: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            coref: parse_endpoint("coref_url", &config.coref_url)?,
            parser: parse_endpoint("parser_url", &config.parser_url)?,
            tagger: parse_endpoint("tagger_url", &config.tagger_url)?,
            timeout_secs: config.timeout_secs,
        })
    }
}

fn parse_endpoint(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| QaGraphError::config(format!("services.{key} = {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(QaGraphError::config(format!(
            "services.{key}: unsupported scheme '{other}', expected http or https"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.qagraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| QaGraphError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.qagraph/qagraph.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| QaGraphError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| QaGraphError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    init_config_in(&dir)
}

/// Write a default config file into `dir`, creating it if needed.
pub fn init_config_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| QaGraphError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| QaGraphError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| QaGraphError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
