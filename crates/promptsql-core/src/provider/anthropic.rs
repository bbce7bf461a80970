//! Anthropic messages API client.

use super::http::{build_client, send_json};
use super::{ChatModel, ChatRequest, Provider, ProviderEndpoint, ProviderError};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API requires `max_tokens`; used when the model sets none.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicChat {
    client: Client,
    url: String,
    api_key: String,
}

impl AnthropicChat {
    pub fn new(endpoint: &ProviderEndpoint) -> Result<Self, ProviderError> {
        let api_key = endpoint.require_api_key()?.to_string();
        Ok(Self {
            client: build_client(endpoint)?,
            url: format!("{}/messages", endpoint.base_url),
            api_key,
        })
    }
}

pub(crate) fn request_body(request: &ChatRequest) -> Value {
    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "temperature": request.temperature,
        "messages": [{ "role": "user", "content": request.prompt }],
    });
    if let Some(system) = &request.system {
        body["system"] = json!(system);
    }
    body
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ChatModel for AnthropicChat {
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let response: MessagesResponse = send_json(
            Provider::Anthropic,
            self.client
                .post(&self.url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request_body(request)),
        )?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse {
                provider: Provider::Anthropic,
                message: "response contained no text blocks".to_string(),
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_defaults_max_tokens() {
        let body = request_body(&ChatRequest {
            model: "claude-2.1".into(),
            prompt: "hi".into(),
            system: Some("Be brief.".into()),
            temperature: 0.0,
            max_tokens: None,
        });
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["messages"][0]["content"], "hi");
    }
}
