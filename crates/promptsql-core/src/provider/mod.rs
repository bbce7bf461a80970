//! LLM chat providers.
//!
//! A [`ChatModel`] turns a rendered prompt into an answer. Models are created by
//! a [`ChatModelFactory`] from a [`ProviderEndpoint`] (provider, base URL,
//! credential, timeout); [`HttpChatModelFactory`] builds the HTTP clients for
//! OpenAI (and OpenAI-compatible servers), Anthropic, Google Gemini and
//! Ollama. Tests and embedders can supply
//! their own factory to the engine instead.

mod anthropic;
mod error;
mod google;
mod http;
pub mod models;
mod ollama;
mod openai;

pub use anthropic::AnthropicChat;
pub use error::ProviderError;
pub use google::GoogleChat;
pub use ollama::{ollama_model_exists, ollama_model_exists_at, OllamaChat};
pub use openai::OpenAiChat;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A supported LLM provider.
///
/// `nvidia_nim`, `vllm`, `writer` and `litellm` speak the OpenAI chat
/// completions protocol and share [`OpenAiChat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    Ollama,
    #[serde(rename = "nvidia_nim")]
    NvidiaNim,
    Vllm,
    Writer,
    Litellm,
}

impl Provider {
    pub const ALL: [Provider; 8] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Google,
        Provider::Ollama,
        Provider::NvidiaNim,
        Provider::Vllm,
        Provider::Writer,
        Provider::Litellm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Ollama => "ollama",
            Self::NvidiaNim => "nvidia_nim",
            Self::Vllm => "vllm",
            Self::Writer => "writer",
            Self::Litellm => "litellm",
        }
    }

    /// Comma-separated names of every provider.
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(Provider::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `USING` option that carries this provider's credential.
    pub fn api_key_option(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai_api_key",
            Self::Anthropic => "anthropic_api_key",
            Self::Google => "google_api_key",
            Self::Ollama => "ollama_api_key",
            Self::NvidiaNim => "nvidia_nim_api_key",
            Self::Vllm => "vllm_api_key",
            Self::Writer => "writer_api_key",
            Self::Litellm => "litellm_api_key",
        }
    }

    /// Environment variable consulted when no credential is configured.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
            Self::Ollama => "OLLAMA_API_KEY",
            Self::NvidiaNim => "NVIDIA_API_KEY",
            Self::Vllm => "VLLM_API_KEY",
            Self::Writer => "WRITER_API_KEY",
            Self::Litellm => "LITELLM_API_KEY",
        }
    }

    /// Environment variable overriding the API base URL.
    pub fn base_url_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_BASE",
            Self::Anthropic => "ANTHROPIC_API_BASE",
            Self::Google => "GOOGLE_API_BASE",
            Self::Ollama => "OLLAMA_HOST",
            Self::NvidiaNim => "NVIDIA_NIM_API_BASE",
            Self::Vllm => "VLLM_API_BASE",
            Self::Writer => "WRITER_API_BASE",
            Self::Litellm => "LITELLM_API_BASE",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Google => "https://generativelanguage.googleapis.com/v1beta",
            Self::Ollama => "http://127.0.0.1:11434",
            Self::NvidiaNim => "https://integrate.api.nvidia.com/v1",
            Self::Vllm => "http://127.0.0.1:8000/v1",
            Self::Writer => "https://api.writer.com/v1",
            Self::Litellm => "http://127.0.0.1:4000",
        }
    }

    /// Model used when `model_name` is omitted but the provider is explicit.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Anthropic => "claude-3-haiku-20240307",
            Self::Google => "gemini-1.5-flash",
            Self::Ollama => "llama3",
            Self::NvidiaNim => "meta/llama-3_1-8b-instruct",
            Self::Vllm => "meta-llama/Meta-Llama-3-8B-Instruct",
            Self::Writer => "palmyra-x5",
            Self::Litellm => "gpt-4o",
        }
    }

    /// Self-hosted servers (Ollama, vLLM, a LiteLLM proxy) may run without
    /// authentication; a key is sent when one is configured.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama | Self::Vllm | Self::Litellm)
    }

    /// Path of the chat completions route under the base URL.
    pub(crate) fn chat_completions_path(&self) -> &'static str {
        match self {
            Self::Writer => "/chat",
            _ => "/chat/completions",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "google" | "gemini" => Ok(Self::Google),
            "ollama" => Ok(Self::Ollama),
            "nvidia_nim" => Ok(Self::NvidiaNim),
            "vllm" => Ok(Self::Vllm),
            "writer" => Ok(Self::Writer),
            "litellm" => Ok(Self::Litellm),
            _ => Err(ProviderError::UnknownProvider(s.to_string())),
        }
    }
}

/// A single-turn chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Where and how to reach a provider.
#[derive(Clone, PartialEq)]
pub struct ProviderEndpoint {
    pub provider: Provider,
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ProviderEndpoint {
    pub fn new(provider: Provider, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            base_url: normalize_base_url(&base_url.into()),
            api_key: None,
            timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The credential, or `MissingApiKey` when the provider needs one.
    pub(crate) fn require_api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey {
                provider: self.provider,
                option: self.provider.api_key_option(),
                env: self.provider.api_key_env(),
            })
    }
}

impl fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| crate::redact::REDACTED))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Adds a scheme when missing (`OLLAMA_HOST=0.0.0.0:11434`) and strips trailing slashes.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// A chat model that can answer prompts.
pub trait ChatModel: Send + Sync {
    /// Sends the request and returns the answer text.
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;
}

/// Builds chat models for endpoints.
pub trait ChatModelFactory: Send + Sync {
    fn connect(&self, endpoint: &ProviderEndpoint) -> Result<Box<dyn ChatModel>, ProviderError>;
}

/// Factory producing the HTTP clients for each provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpChatModelFactory;

impl ChatModelFactory for HttpChatModelFactory {
    fn connect(&self, endpoint: &ProviderEndpoint) -> Result<Box<dyn ChatModel>, ProviderError> {
        let model: Box<dyn ChatModel> = match endpoint.provider {
            Provider::OpenAi
            | Provider::NvidiaNim
            | Provider::Vllm
            | Provider::Writer
            | Provider::Litellm => Box::new(OpenAiChat::new(endpoint)?),
            Provider::Anthropic => Box::new(AnthropicChat::new(endpoint)?),
            Provider::Google => Box::new(GoogleChat::new(endpoint)?),
            Provider::Ollama => Box::new(OllamaChat::new(endpoint)?),
        };
        Ok(model)
    }
}
