//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizmark_core::engine::GradingEngineConfig;
use quizmark_core::extractor::ExtractorConfig;
use quizmark_core::traits::LlmProvider;

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::ollama::OllamaProvider;

/// File looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "quizmark.toml";
pub const GEMINI_KEY_ENV: &str = "QUIZMARK_GEMINI_KEY";
pub const ANTHROPIC_KEY_ENV: &str = "QUIZMARK_ANTHROPIC_KEY";

/// Connection settings for one text-generation backend.
///
/// `Debug` masks API keys so configs can be logged.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini { base_url, .. } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Anthropic { base_url, .. } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

impl ProviderConfig {
    fn resolved(&self) -> ProviderConfig {
        match self {
            ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
                api_key: resolve_env_vars(api_key),
                base_url: base_url.as_deref().map(resolve_env_vars),
            },
            ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
                api_key: resolve_env_vars(api_key),
                base_url: base_url.as_deref().map(resolve_env_vars),
            },
            ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
                base_url: resolve_env_vars(base_url),
            },
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Top-level quizmark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizmarkConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature for extraction calls.
    #[serde(default)]
    pub default_temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Retries on transient provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max submissions graded concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for batch reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizmark-results")
}

impl Default for QuizmarkConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: 0.0,
            max_tokens: default_max_tokens(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

impl QuizmarkConfig {
    /// Extraction settings, with an optional model override.
    pub fn extractor_config(&self, model: Option<&str>) -> ExtractorConfig {
        ExtractorConfig {
            model: model.unwrap_or(self.default_model.as_str()).to_string(),
            max_tokens: self.max_tokens,
            temperature: self.default_temperature,
        }
    }

    /// Engine settings, with an optional parallelism override.
    pub fn engine_config(&self, parallelism: Option<usize>) -> GradingEngineConfig {
        GradingEngineConfig {
            parallelism: parallelism.unwrap_or(self.parallelism).max(1),
            max_retries_per_submission: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Look up a provider by name, or the default provider.
    pub fn provider(&self, name: Option<&str>) -> Result<(&str, &ProviderConfig)> {
        let name = name.unwrap_or(self.default_provider.as_str());
        let (key, config) = self.providers.get_key_value(name).with_context(|| {
            let mut known: Vec<_> = self.providers.keys().map(String::as_str).collect();
            known.sort_unstable();
            format!(
                "provider '{name}' is not configured (configured: {})",
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            )
        })?;
        Ok((key.as_str(), config))
    }
}

/// Replace `${VAR}` references with environment values.
///
/// Unset variables resolve to an empty string; an unterminated `${` is kept as-is.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from the default locations.
///
/// Search order:
/// 1. `quizmark.toml` in the current directory
/// 2. `~/.config/quizmark/config.toml`
///
/// `QUIZMARK_GEMINI_KEY` and `QUIZMARK_ANTHROPIC_KEY` override or add
/// the matching provider's API key.
pub fn load_config() -> Result<QuizmarkConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizmarkConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => [Some(PathBuf::from(LOCAL_CONFIG_FILE)), global_config_path()]
            .into_iter()
            .flatten()
            .find(|p| p.exists()),
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizmarkConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizmarkConfig::default(),
    };

    apply_env_overrides(&mut config);

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), v.resolved()))
        .collect();

    Ok(config)
}

fn apply_env_overrides(config: &mut QuizmarkConfig) {
    if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
        match config.providers.get_mut("gemini") {
            Some(ProviderConfig::Gemini { api_key, .. }) => *api_key = key,
            _ => {
                config.providers.insert(
                    "gemini".into(),
                    ProviderConfig::Gemini {
                        api_key: key,
                        base_url: None,
                    },
                );
            }
        }
    }

    if let Ok(key) = std::env::var(ANTHROPIC_KEY_ENV) {
        match config.providers.get_mut("anthropic") {
            Some(ProviderConfig::Anthropic { api_key, .. }) => *api_key = key,
            _ => {
                config.providers.insert(
                    "anthropic".into(),
                    ProviderConfig::Anthropic {
                        api_key: key,
                        base_url: None,
                    },
                );
            }
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("quizmark")
            .join("config.toml")
    })
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Arc<dyn LlmProvider> {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => {
            Arc::new(GeminiProvider::new(api_key, base_url.clone()))
        }
        ProviderConfig::Anthropic { api_key, base_url } => {
            Arc::new(AnthropicProvider::new(api_key, base_url.clone()))
        }
        ProviderConfig::Ollama { base_url } => Arc::new(OllamaProvider::new(base_url)),
    }
}
