//! Configuration loading
//!
//! This module provides:
//! - `StepRuntimeConfig` - Runtime configuration for a step runner (library-public)
//! - `Config` - Full application configuration loaded from config.toml (CLI-only)

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use crate::llm::Credential;
#[cfg(feature = "cli")]
use crate::react::Variant;

// =============================================================================
// Library-public types (always available)
// =============================================================================

/// Directory name for project-level configuration and data
pub const PROJECT_DIR: &str = ".react-step";

/// Directory name for persisted step histories
pub const HISTORY_DIR: &str = "history";

/// Runtime configuration for a `StepRunner`.
///
/// # Example
///
/// ```
/// use react_step::StepRuntimeConfig;
///
/// let config = StepRuntimeConfig {
///     model: "claude-sonnet-4-20250514".to_string(),
///     max_tokens: 1024,
///     early_answer_threshold: 9.0,
///     fence_line_threshold: 5,
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StepRuntimeConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Positivity score at or above which a final answer preempts actions
    pub early_answer_threshold: f64,
    /// Plain-mode observations longer than this many lines get fenced
    pub fence_line_threshold: usize,
}

impl Default for StepRuntimeConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            early_answer_threshold: crate::react::EARLY_ANSWER_THRESHOLD,
            fence_line_threshold: crate::react::FENCE_LINE_THRESHOLD,
        }
    }
}

// =============================================================================
// CLI-only types (gated behind "cli" feature)
// =============================================================================

#[cfg(feature = "cli")]
impl StepRuntimeConfig {
    /// Create runtime config from application Config
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model.model.clone(),
            max_tokens: config.model.max_tokens,
            early_answer_threshold: config.parser.early_answer_threshold,
            fence_line_threshold: config.parser.fence_line_threshold,
        }
    }
}

/// Main configuration structure loaded from config.toml
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub model: ModelConfig,
    pub parser: ParserConfig,
    pub tools: ToolsConfig,
    pub prompts: PromptsConfig,
}

#[cfg(feature = "cli")]
impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the config directory path (~/.config/react-step)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("react-step"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub working_dir: Option<PathBuf>,
    /// Trace prompt/response pairs and latency
    pub verbose: bool,
}

/// Model settings
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub max_tokens: u32,
    pub auth: AuthMethod,
    /// Credential sent with each request; when unset the provider's own
    /// environment variables apply
    pub api_key: Option<String>,
}

#[cfg(feature = "cli")]
impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            auth: AuthMethod::ApiKey,
            api_key: None,
        }
    }
}

#[cfg(feature = "cli")]
impl ModelConfig {
    pub fn credential(&self) -> Option<Credential> {
        let key = self.api_key.clone().filter(|k| !k.is_empty())?;
        Some(match self.auth {
            AuthMethod::ApiKey => Credential::ApiKey(key),
            AuthMethod::Bearer => Credential::Bearer(key),
        })
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    ApiKey,
    Bearer,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub variant: Variant,
    pub early_answer_threshold: f64,
    pub fence_line_threshold: usize,
}

#[cfg(feature = "cli")]
impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Plain,
            early_answer_threshold: crate::react::EARLY_ANSWER_THRESHOLD,
            fence_line_threshold: crate::react::FENCE_LINE_THRESHOLD,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Tool manifest (`[[tool]]` entries)
    pub catalog: Option<PathBuf>,
    /// Tool ids enabled for each step, in prompt order
    pub enabled: Vec<String>,
}

/// Template overrides; unset entries use the built-in templates
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub conversational: Option<PathBuf>,
    pub plain: Option<PathBuf>,
}

#[cfg(feature = "cli")]
impl PromptsConfig {
    pub fn template_path(&self, variant: Variant) -> Option<&PathBuf> {
        match variant {
            Variant::Conversational => self.conversational.as_ref(),
            Variant::Plain => self.plain.as_ref(),
        }
    }
}
