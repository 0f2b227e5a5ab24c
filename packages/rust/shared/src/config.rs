//! Application configuration for mdpack.
//!
//! User config lives at `~/.mdpack/mdpack.toml`.
//! CLI flags override config file values, which override defaults.
//! Only the captioning service needs configuring; a plain pack runs without
//! any config file at all.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{MdpackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "mdpack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".mdpack";

/// Instruction sent alongside every image to the captioning service.
pub const DEFAULT_INSTRUCTION: &str = "Describe this image in detail. \
Format the description as Markdown, covering the subject, any visible text, \
layout, colors, and anything else a reader who cannot see the image would need.";

// ---------------------------------------------------------------------------
// Config structs (matching mdpack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Captioning / chat-completions service settings.
    #[serde(default)]
    pub captioning: CaptioningConfig,
}

/// `[captioning]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptioningConfig {
    /// Service base URL, e.g. `https://my-resource.openai.azure.com/`.
    #[serde(default)]
    pub endpoint: String,

    /// `api-version` query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Model deployment name.
    #[serde(default)]
    pub deployment: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Upper bound on generated tokens per request.
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,

    /// Reasoning effort hint sent with `prompt` requests.
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Instruction paired with each image.
    #[serde(default = "default_instruction")]
    pub instruction: String,
}

impl Default for CaptioningConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_version: default_api_version(),
            deployment: String::new(),
            api_key_env: default_api_key_env(),
            max_completion_tokens: default_max_completion_tokens(),
            reasoning_effort: default_reasoning_effort(),
            timeout_secs: default_timeout_secs(),
            instruction: default_instruction(),
        }
    }
}

fn default_api_version() -> String {
    "2024-10-21".into()
}
fn default_api_key_env() -> String {
    "AZURE_OPENAI_API_KEY".into()
}
fn default_max_completion_tokens() -> u32 {
    10_000
}
fn default_reasoning_effort() -> String {
    "medium".into()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_instruction() -> String {
    DEFAULT_INSTRUCTION.into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.mdpack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| MdpackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.mdpack/mdpack.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| MdpackError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| MdpackError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MdpackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| MdpackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MdpackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the captioning section names a reachable-looking service.
pub fn validate_captioning(config: &CaptioningConfig) -> Result<()> {
    if config.endpoint.trim().is_empty() {
        return Err(MdpackError::config(
            "captioning.endpoint is not set. Run `mdpack config init` and edit the file.",
        ));
    }
    Url::parse(&config.endpoint).map_err(|e| {
        MdpackError::config(format!(
            "captioning.endpoint '{}' is not a valid URL: {e}",
            config.endpoint
        ))
    })?;
    if config.deployment.trim().is_empty() {
        return Err(MdpackError::config("captioning.deployment is not set"));
    }
    resolve_api_key(config).map(|_| ())
}

/// Read the API key from the env var named in the config.
pub fn resolve_api_key(config: &CaptioningConfig) -> Result<String> {
    let var_name = &config.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(MdpackError::config(format!(
            "captioning API key not found. Set the {var_name} environment variable."
        ))),
    }
}
