//! Application configuration for readmegen.
//!
//! User config lives at `~/.readmegen/readmegen.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReadmeGenError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "readmegen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".readmegen";

// ---------------------------------------------------------------------------
// Config structs (matching readmegen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM backend settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// API call policies.
    #[serde(default)]
    pub api: ApiConfig,

    /// Repository ingestion policies.
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Markdown output settings.
    #[serde(default)]
    pub markdown: MarkdownConfig,
}

/// `[llm]` section: which backend to talk to and its sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend service selector: "llama", "openai", or "vsegpt".
    #[serde(default = "default_api")]
    pub api: String,

    /// Model identifier sent to hosted backends.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the backend. Required for "llama"; for hosted backends a
    /// non-empty value overrides the provider default (useful for proxies).
    #[serde(default)]
    pub url: String,

    /// Total context window of the target model, in tokens.
    #[serde(default = "default_tokens")]
    pub tokens: usize,

    /// Sampling temperature for all prompt jobs.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api: default_api(),
            model: default_model(),
            url: String::new(),
            tokens: default_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_api() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_tokens() -> usize {
    16_384
}
fn default_temperature() -> f32 {
    0.1
}

/// `[api]` section: request shaping shared across backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Maximum number of concurrently in-flight backend requests.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,

    /// System message prepended to chat-style payloads.
    #[serde(default = "default_system_message")]
    pub system_message: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            system_message: default_system_message(),
        }
    }
}

fn default_rate_limit() -> usize {
    5
}
fn default_system_message() -> String {
    "You are a technical writer generating README documentation for a \
     software repository."
        .into()
}

/// `[ingestion]` section: repository walking policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Glob patterns excluded from the walk, on top of hidden files.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Maximum size in bytes for a file to be retained in the context.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_ignore_patterns() -> Vec<String> {
    ["node_modules/", "target/", "dist/", "build/", "__pycache__/", "venv/"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_max_file_bytes() -> u64 {
    100 * 1024
}

/// `[markdown]` section: README rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Text substituted for sections whose prompt job failed.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Badge style passed to shields.io.
    #[serde(default = "default_badge_style")]
    pub badge_style: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            badge_style: default_badge_style(),
        }
    }
}

fn default_placeholder() -> String {
    "▹ ▹ ▹".into()
}
fn default_badge_style() -> String {
    "flat".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.readmegen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReadmeGenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.readmegen/readmegen.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ReadmeGenError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ReadmeGenError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ReadmeGenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReadmeGenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ReadmeGenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Env var holding the API key for a given backend selector, if it needs one.
pub fn api_key_env(service: &str) -> Option<&'static str> {
    match service {
        "openai" => Some("OPENAI_API_KEY"),
        "vsegpt" => Some("VSE_GPT_KEY"),
        _ => None,
    }
}

/// Check that the configured backend's API key env var is set and non-empty.
/// Self-hosted backends need no key and always pass.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let Some(var_name) = api_key_env(&config.llm.api) else {
        return Ok(());
    };
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(ReadmeGenError::config(format!(
            "API key for the '{}' backend not found. Set the {var_name} environment variable.",
            config.llm.api
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("rate_limit"));
        assert!(toml_str.contains("system_message"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.llm.api, "openai");
        assert_eq!(parsed.api.rate_limit, 5);
        assert_eq!(parsed.llm.tokens, 16_384);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[llm]
api = "llama"
url = "http://127.0.0.1:11434/api/generate"
tokens = 8192
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.llm.api, "llama");
        assert_eq!(config.llm.tokens, 8192);
        assert_eq!(config.api.rate_limit, 5);
        assert!(!config.markdown.placeholder.is_empty());
    }

    #[test]
    fn api_key_env_per_service() {
        assert_eq!(api_key_env("openai"), Some("OPENAI_API_KEY"));
        assert_eq!(api_key_env("vsegpt"), Some("VSE_GPT_KEY"));
        assert_eq!(api_key_env("llama"), None);
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Self-hosted backends need no key
        config.llm.api = "llama".into();
        assert!(validate_api_key(&config).is_ok());
    }
}
