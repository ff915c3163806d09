//! Application configuration for docindex.
//!
//! User config lives at `~/.docindex/docindex.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocIndexError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docindex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docindex";

// ---------------------------------------------------------------------------
// Config structs (matching docindex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Search ranking and output settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Database file used by the `db` commands.
    #[serde(default = "default_database")]
    pub database: String,

    /// Base URL of the published documentation, used to print absolute links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Output format for `fmt` and `db export`: "js" or "json".
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            base_url: None,
            output_format: default_output_format(),
        }
    }
}

fn default_database() -> String {
    "~/.docindex/docindex.db".into()
}
fn default_output_format() -> String {
    "js".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of hits returned.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Weight of a title match relative to a text match.
    #[serde(default = "default_title_boost")]
    pub title_boost: f64,

    /// Snippet width in characters.
    #[serde(default = "default_snippet_width")]
    pub snippet_width: usize,

    /// Whether misspelled terms may match within a small edit distance.
    #[serde(default = "default_true")]
    pub fuzzy: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            title_boost: default_title_boost(),
            snippet_width: default_snippet_width(),
            fuzzy: true,
        }
    }
}

fn default_limit() -> usize {
    10
}
fn default_title_boost() -> f64 {
    3.0
}
fn default_snippet_width() -> usize {
    160
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Search settings (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime search settings, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Maximum number of hits; `0` means unlimited.
    pub limit: usize,
    /// Weight of a title match relative to a text match.
    pub title_boost: f64,
    /// Snippet width in characters.
    pub snippet_width: usize,
    /// Allow edit-distance matches.
    pub fuzzy: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SearchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            limit: config.search.limit,
            title_boost: config.search.title_boost,
            snippet_width: config.search.snippet_width,
            fuzzy: config.search.fuzzy,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docindex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocIndexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docindex/docindex.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| DocIndexError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        DocIndexError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocIndexError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocIndexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocIndexError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would make searching or writing meaningless.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.defaults.output_format.as_str() {
        "js" | "json" => {}
        other => {
            return Err(DocIndexError::config(format!(
                "unknown output_format '{other}': expected 'js' or 'json'"
            )));
        }
    }
    if !(config.search.title_boost.is_finite() && config.search.title_boost > 0.0) {
        return Err(DocIndexError::config("search.title_boost must be a positive number"));
    }
    if config.search.snippet_width == 0 {
        return Err(DocIndexError::config("search.snippet_width must be at least 1"));
    }
    Ok(())
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| DocIndexError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}
