//! Narrative generator configuration.

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeProvider {
    /// Ollama API (local, default)
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API
    OpenAI,
}

impl NarrativeProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

/// Configuration for the narrative-summary collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Whether narrative generation is attempted at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub provider: NarrativeProvider,
    /// API endpoint base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key for OpenAI-compatible providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in the response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Generation temperature (0.0 - 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum characters of grounding context sent with the prompt.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_tokens() -> u32 {
    1800
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_context_chars() -> usize {
    12000
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: NarrativeProvider::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

impl NarrativeConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported: `LLM_ENABLED`, `LLM_PROVIDER` (ollama|openai),
    /// `LLM_ENDPOINT`, `LLM_API_KEY`, `LLM_MODEL`, `LLM_MAX_TOKENS`,
    /// `LLM_TEMPERATURE`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("LLM_ENABLED") {
            self.enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }
        if let Ok(val) = std::env::var("LLM_PROVIDER") {
            if let Some(provider) = NarrativeProvider::parse(&val) {
                self.provider = provider;
                if self.provider == NarrativeProvider::OpenAI
                    && self.endpoint == default_endpoint()
                {
                    self.endpoint = "https://api.openai.com".to_string();
                }
            }
        }
        if let Ok(val) = std::env::var("LLM_ENDPOINT") {
            self.endpoint = val;
        }
        if let Ok(val) = std::env::var("LLM_API_KEY") {
            self.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("LLM_MODEL") {
            self.model = val;
        }
        if let Ok(val) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = val.parse() {
                self.max_tokens = n;
            }
        }
        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(t) = val.parse() {
                self.temperature = t;
            }
        }
        self
    }
}
