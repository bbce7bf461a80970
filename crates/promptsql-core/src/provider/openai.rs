//! OpenAI chat completions client.
//!
//! Also serves the OpenAI-compatible providers: NVIDIA NIM, vLLM, Writer and
//! LiteLLM proxies differ only in base URL, route and whether a key is needed.

use super::http::{build_client, send_json};
use super::{ChatModel, ChatRequest, Provider, ProviderEndpoint, ProviderError};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct OpenAiChat {
    client: Client,
    provider: Provider,
    url: String,
    api_key: Option<String>,
}

impl OpenAiChat {
    pub fn new(endpoint: &ProviderEndpoint) -> Result<Self, ProviderError> {
        let provider = endpoint.provider;
        let api_key = if provider.requires_api_key() {
            Some(endpoint.require_api_key()?.to_string())
        } else {
            endpoint.api_key.clone().filter(|key| !key.is_empty())
        };
        Ok(Self {
            client: build_client(endpoint)?,
            provider,
            url: format!("{}{}", endpoint.base_url, provider.chat_completions_path()),
            api_key,
        })
    }
}

pub(crate) fn request_body(request: &ChatRequest) -> Value {
    let mut messages = Vec::new();
    if let Some(system) = &request.system {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    let mut body = json!({
        "model": request.model,
        "messages": messages,
        "temperature": request.temperature,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    body
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

impl ChatModel for OpenAiChat {
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let mut builder = self.client.post(&self.url).json(&request_body(request));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let response: CompletionResponse = send_json(self.provider, builder)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: self.provider,
                message: "response contained no message content".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".into(),
            prompt: "What is the capital of Sweden?".into(),
            system: None,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    #[test]
    fn body_has_user_message() {
        let body = request_body(&request());
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "What is the capital of Sweden?");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn body_puts_system_prompt_first() {
        let mut req = request();
        req.system = Some("Be brief.".into());
        req.max_tokens = Some(64);
        let body = request_body(&req);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["max_tokens"], 64);
    }
}
