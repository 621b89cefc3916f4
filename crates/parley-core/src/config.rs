//! Runtime configuration.
//!
//! Precedence: environment (`PARLEY__*`) > TOML file (`PARLEY_CONFIG`, default `config/parley.toml`) > defaults.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | host | 127.0.0.1 | Gateway bind address. |
//! | port | 8000 | Gateway port. |
//! | request_timeout_secs | 30 | Upper bound on each provider call; a timeout counts as a transport error. |
//! | temperature | 0.7 | Sampling temperature sent to both providers. |
//! | max_tokens | 1000 | Completion budget per call. |
//! | openai.* / meta_llama.* | see [`ProviderConfig`] | Endpoint, model name and key per provider. |

use serde::{Deserialize, Serialize};
use std::path::Path;

const INFERENCE_BASE_URL: &str = "https://models.inference.ai.azure.com";

/// One OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Empty => resolved from `GITHUB_TOKEN`, then `PARLEY_LLM_API_KEY`.
    #[serde(default)]
    pub api_key: String,
}

impl ProviderConfig {
    /// API key with environment fallback. `None` when nothing is configured.
    pub fn resolved_api_key(&self) -> Option<String> {
        Some(self.api_key.trim().to_string())
            .filter(|k| !k.is_empty())
            .or_else(|| env_opt_string("GITHUB_TOKEN"))
            .or_else(|| env_opt_string("PARLEY_LLM_API_KEY"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParleyConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub openai: ProviderConfig,
    pub meta_llama: ProviderConfig,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 30,
            temperature: 0.7,
            max_tokens: 1000,
            openai: ProviderConfig {
                base_url: INFERENCE_BASE_URL.to_string(),
                model: "gpt-4o".to_string(),
                api_key: String::new(),
            },
            meta_llama: ProviderConfig {
                base_url: INFERENCE_BASE_URL.to_string(),
                model: "Llama-3.3-70B-Instruct".to_string(),
                api_key: String::new(),
            },
        }
    }
}

impl ParleyConfig {
    /// Load from `PARLEY_CONFIG` (or `config/parley.toml`) and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("PARLEY_CONFIG").unwrap_or_else(|_| "config/parley.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load with an explicit file path; a missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("host", d.host)?
            .set_default("port", d.port as i64)?
            .set_default("request_timeout_secs", d.request_timeout_secs as i64)?
            .set_default("temperature", d.temperature as f64)?
            .set_default("max_tokens", d.max_tokens as i64)?
            .set_default("openai.base_url", d.openai.base_url)?
            .set_default("openai.model", d.openai.model)?
            .set_default("openai.api_key", d.openai.api_key)?
            .set_default("meta_llama.base_url", d.meta_llama.base_url)?
            .set_default("meta_llama.model", d.meta_llama.model)?
            .set_default("meta_llama.api_key", d.meta_llama.api_key)?;

        let built = builder
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("PARLEY").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// Bind address for the gateway.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
