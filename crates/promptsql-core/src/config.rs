//! Engine configuration.
//!
//! Every field has a default, so `{}` is a valid configuration. Provider base
//! URLs and API keys fall back to environment variables (see
//! [`Provider::base_url_env`] and [`Provider::api_key_env`]) and then to the
//! provider's public endpoint.

use crate::provider::Provider;
use schemars::generate::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PROJECT: &str = "mindsdb";
pub const DEFAULT_MODEL_NAME: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f64 = 0.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Project used for unqualified model names. Always exists and cannot be dropped.
    pub default_project: String,

    /// Chat model used when a model sets neither `model_name` nor `provider`.
    pub default_model: String,

    pub default_temperature: f64,

    /// Completion token limit applied when a model sets no `max_tokens`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Timeout for a single provider request, in seconds.
    pub request_timeout_secs: u64,

    /// How often `wait_predictor` checks the model status, in milliseconds.
    pub poll_interval_ms: u64,

    pub providers: ProvidersConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_project: DEFAULT_PROJECT.to_string(),
            default_model: DEFAULT_MODEL_NAME.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            default_max_tokens: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            providers: ProvidersConfig::default(),
        }
    }
}

/// Per-provider overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub google: ProviderConfig,
    pub ollama: ProviderConfig,
    pub nvidia_nim: ProviderConfig,
    pub vllm: ProviderConfig,
    pub writer: ProviderConfig,
    pub litellm: ProviderConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl EngineConfig {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::OpenAi => &self.providers.openai,
            Provider::Anthropic => &self.providers.anthropic,
            Provider::Google => &self.providers.google,
            Provider::Ollama => &self.providers.ollama,
            Provider::NvidiaNim => &self.providers.nvidia_nim,
            Provider::Vllm => &self.providers.vllm,
            Provider::Writer => &self.providers.writer,
            Provider::Litellm => &self.providers.litellm,
        }
    }

    /// Base URL for `provider`: configured value, then its env var, then the public default.
    pub fn base_url(&self, provider: Provider) -> String {
        self.base_url_with(provider, env_value)
    }

    /// API key for `provider`: configured value, then its env var.
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        self.api_key_with(provider, env_value)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// JSON Schema (draft 7) of the configuration file.
    pub fn json_schema() -> serde_json::Value {
        SchemaSettings::draft07()
            .into_generator()
            .into_root_schema_for::<EngineConfig>()
            .to_value()
    }

    fn base_url_with(&self, provider: Provider, env: impl Fn(&str) -> Option<String>) -> String {
        non_empty(self.provider(provider).base_url.clone())
            .or_else(|| env(provider.base_url_env()))
            .unwrap_or_else(|| provider.default_base_url().to_string())
    }

    fn api_key_with(
        &self,
        provider: Provider,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        non_empty(self.provider(provider).api_key.clone()).or_else(|| env(provider.api_key_env()))
    }
}

fn env_value(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_project, "mindsdb");
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn reads_camel_case_fields() {
        let config = EngineConfig::from_json(
            r#"{
                "defaultModel": "claude-2.1",
                "defaultMaxTokens": 256,
                "providers": {
                    "ollama": { "baseUrl": "http://gpu-box:11434" },
                    "nvidiaNim": { "apiKey": "nvapi-test" }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.default_model, "claude-2.1");
        assert_eq!(config.default_max_tokens, Some(256));
        assert_eq!(
            config.base_url_with(Provider::Ollama, no_env),
            "http://gpu-box:11434"
        );
        assert_eq!(
            config.api_key_with(Provider::NvidiaNim, no_env).as_deref(),
            Some("nvapi-test")
        );
        assert_eq!(
            config.base_url_with(Provider::Vllm, no_env),
            "http://127.0.0.1:8000/v1"
        );
    }

    #[test]
    fn base_url_precedence() {
        let mut config = EngineConfig::default();
        let env = |name: &str| (name == "OPENAI_API_BASE").then(|| "http://proxy/v1".to_string());

        assert_eq!(
            config.base_url_with(Provider::OpenAi, no_env),
            "https://api.openai.com/v1"
        );
        assert_eq!(config.base_url_with(Provider::OpenAi, env), "http://proxy/v1");

        config.providers.openai.base_url = Some("http://configured/v1".into());
        assert_eq!(
            config.base_url_with(Provider::OpenAi, env),
            "http://configured/v1"
        );
    }

    #[test]
    fn api_key_precedence() {
        let mut config = EngineConfig::default();
        let env = |name: &str| (name == "GOOGLE_API_KEY").then(|| "from-env".to_string());

        assert_eq!(config.api_key_with(Provider::Google, no_env), None);
        assert_eq!(
            config.api_key_with(Provider::Google, env).as_deref(),
            Some("from-env")
        );

        config.providers.google.api_key = Some("  ".into());
        assert_eq!(
            config.api_key_with(Provider::Google, env).as_deref(),
            Some("from-env")
        );

        config.providers.google.api_key = Some("from-config".into());
        assert_eq!(
            config.api_key_with(Provider::Google, env).as_deref(),
            Some("from-config")
        );
    }

    #[test]
    fn schema_lists_properties() {
        let schema = EngineConfig::json_schema();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("defaultProject"));
        assert!(properties.contains_key("providers"));
    }
}
