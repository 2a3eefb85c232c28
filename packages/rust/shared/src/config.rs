//! Application configuration for ArticleSync.
//!
//! User config lives at `~/.articlesync/articlesync.toml`.
//! The API token itself is never stored in the file; the config names the
//! environment variable that holds it. Validation is eager: a process with
//! missing credentials or knowledge-base ids refuses to start.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArticleSyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "articlesync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".articlesync";

// ---------------------------------------------------------------------------
// Config structs (matching articlesync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Inbound receiver settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Knowledge-store (Coze) settings.
    #[serde(default)]
    pub coze: CozeConfig,

    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook receiver binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Capacity of the bounded batch queue between receiver and worker.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Directory for archiving raw inbound payloads. Disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            queue_capacity: default_queue_capacity(),
            archive_dir: None,
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".into()
}
fn default_queue_capacity() -> usize {
    64
}

/// `[coze]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CozeConfig {
    /// Base URL of the knowledge-store API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,

    /// Knowledge base receiving snippet documents (hot/incremental).
    #[serde(default)]
    pub snippet_kb_id: String,

    /// Knowledge base receiving full-text documents. Full-text sync is
    /// skipped silently when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulltext_kb_id: Option<String>,

    /// Knowledge base receiving reference documents.
    #[serde(default)]
    pub references_kb_id: String,

    /// Upload timeout in seconds (uploads can be large).
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

impl Default for CozeConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_token_env: default_api_token_env(),
            snippet_kb_id: String::new(),
            fulltext_kb_id: None,
            references_kb_id: String::new(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.coze.cn".into()
}
fn default_api_token_env() -> String {
    "COZE_API_KEY".into()
}
fn default_upload_timeout() -> u64 {
    60
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Accepted source-channel names (case-sensitive exact match).
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Path of the append-only dedup log.
    #[serde(default = "default_dedup_log")]
    pub dedup_log: String,

    /// Article download timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            whitelist: Vec::new(),
            dedup_log: default_dedup_log(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_dedup_log() -> String {
    "var/processed_sn.log".into()
}
fn default_fetch_timeout() -> u64 {
    20
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.articlesync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ArticleSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.articlesync/articlesync.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ArticleSyncError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ArticleSyncError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ArticleSyncError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ArticleSyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ArticleSyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Eagerly validate a loaded config. Called once at startup; a failure here
/// refuses to start the process.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    resolve_api_token(&config.coze)?;

    if config.coze.snippet_kb_id.is_empty() {
        return Err(ArticleSyncError::config(
            "coze.snippet_kb_id is not configured",
        ));
    }
    if config.coze.references_kb_id.is_empty() {
        return Err(ArticleSyncError::config(
            "coze.references_kb_id is not configured",
        ));
    }
    if config.server.bind_addr.is_empty() {
        return Err(ArticleSyncError::config("server.bind_addr is empty"));
    }
    if config.server.queue_capacity == 0 {
        return Err(ArticleSyncError::config("server.queue_capacity must be > 0"));
    }

    Ok(())
}

/// Read the API token from the environment variable named in the config.
pub fn resolve_api_token(coze: &CozeConfig) -> Result<String> {
    let var_name = &coze.api_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ArticleSyncError::config(format!(
            "Coze API token not found. Set the {var_name} environment variable."
        ))),
    }
}
