//! Configuration file management for seedling.
//!
//! Provides a TOML-based config file at `~/.config/seedling/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use seedling_core::llm::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use seedling_core::llm::types::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use seedling_core::llm::{ClientConfig, GenerationParams, RetryPolicy};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "SEEDLING_BASE_URL";
pub const MODEL_ENV: &str = "SEEDLING_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub llm: LlmSection,
    pub retry: RetrySection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// API key. Prefer the `OPENAI_API_KEY` env var over storing it here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Pause between attempts after a transient failure.
    pub backoff_secs: u64,
    /// Give up after this many attempts. Unset retries forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            backoff_secs: RetryPolicy::DEFAULT_BACKOFF.as_secs(),
            max_attempts: None,
        }
    }
}

impl RetrySection {
    fn policy(&self) -> RetryPolicy {
        let backoff = Duration::from_secs(self.backoff_secs);
        match self.max_attempts {
            Some(max) => RetryPolicy::bounded(backoff, max),
            None => RetryPolicy::unbounded(backoff),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the seedling config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/seedling` or `~/.config/seedling`,
/// on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("seedling");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("seedling")
}

/// Return the path to the seedling config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. A missing file is `Ok(None)`; a file
/// that exists but does not parse is an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file may hold an API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct SeedlingConfig {
    pub client: ClientConfig,
}

impl SeedlingConfig {
    /// Resolve configuration from the config file on disk plus env and CLI.
    pub fn resolve(overrides: &CliOverrides) -> Result<Self> {
        let file = load_config()?;
        Self::resolve_with(file, overrides)
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `OPENAI_API_KEY` env > `llm.api_key` > error
    /// - Base URL: `SEEDLING_BASE_URL` env > `llm.base_url` > default
    /// - Model: `--model` > `SEEDLING_MODEL` env > `llm.model` > default
    /// - Max tokens: `--max-tokens` > `llm.max_tokens` > default
    pub fn resolve_with(file: Option<ConfigFile>, overrides: &CliOverrides) -> Result<Self> {
        let file = file.unwrap_or_default();

        let api_key = match non_empty_env(API_KEY_ENV) {
            Some(key) => key,
            None => match file.llm.api_key.filter(|k| !k.trim().is_empty()) {
                Some(key) => key,
                None => bail!(
                    "API key not found; set {API_KEY_ENV} or add `api_key` under [llm] in {}",
                    config_path().display()
                ),
            },
        };

        let base_url = non_empty_env(BASE_URL_ENV).unwrap_or(file.llm.base_url);

        let model = match &overrides.model {
            Some(m) => m.clone(),
            None => non_empty_env(MODEL_ENV).unwrap_or(file.llm.model),
        };

        let max_tokens = overrides.max_tokens.unwrap_or(file.llm.max_tokens);

        let client = ClientConfig {
            api_key,
            base_url,
            params: GenerationParams { model, max_tokens },
            timeout: Duration::from_secs(file.llm.timeout_secs),
            retry: file.retry.policy(),
        };
        Ok(Self { client })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
