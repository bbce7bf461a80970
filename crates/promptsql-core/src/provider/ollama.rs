//! Ollama client for locally hosted models.

use super::http::{build_client, send_json};
use super::{
    normalize_base_url, ChatModel, ChatRequest, Provider, ProviderEndpoint, ProviderError,
};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Timeout for the existence probe; a local server answers quickly or not at all.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OllamaChat {
    client: Client,
    base_url: String,
}

impl OllamaChat {
    pub fn new(endpoint: &ProviderEndpoint) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(endpoint)?,
            base_url: endpoint.base_url.clone(),
        })
    }

    /// Asks the server for a model's details (`POST /api/show`).
    pub fn show(&self, model: &str) -> Result<Value, ProviderError> {
        send_json(
            Provider::Ollama,
            self.client
                .post(format!("{}/api/show", self.base_url))
                .json(&json!({ "model": model })),
        )
    }
}

pub(crate) fn request_body(request: &ChatRequest) -> Value {
    let mut messages = Vec::new();
    if let Some(system) = &request.system {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    let mut options = json!({ "temperature": request.temperature });
    if let Some(max_tokens) = request.max_tokens {
        options["num_predict"] = json!(max_tokens);
    }

    json!({
        "model": request.model,
        "messages": messages,
        "stream": false,
        "options": options,
    })
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
}

impl ChatModel for OllamaChat {
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let response: ChatResponse = send_json(
            Provider::Ollama,
            self.client
                .post(format!("{}/api/chat", self.base_url))
                .json(&request_body(request)),
        )?;

        response
            .message
            .map(|message| message.content)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: Provider::Ollama,
                message: "response contained no message".to_string(),
            })
    }
}

/// True when the local Ollama server (`OLLAMA_HOST`, default
/// `127.0.0.1:11434`) has `model`. Any failure counts as unavailable.
pub fn ollama_model_exists(model: &str) -> bool {
    let base_url = std::env::var(Provider::Ollama.base_url_env())
        .unwrap_or_else(|_| Provider::Ollama.default_base_url().to_string());
    ollama_model_exists_at(&base_url, model)
}

/// Same as [`ollama_model_exists`] against an explicit server.
pub fn ollama_model_exists_at(base_url: &str, model: &str) -> bool {
    let endpoint = ProviderEndpoint::new(Provider::Ollama, normalize_base_url(base_url), PROBE_TIMEOUT);
    let probe = OllamaChat::new(&endpoint).and_then(|client| client.show(model));

    #[cfg(feature = "tracing")]
    if let Err(err) = &probe {
        tracing::debug!(model, error = %err, "Ollama model probe failed");
    }

    probe.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_disables_streaming() {
        let body = request_body(&ChatRequest {
            model: "mistral".into(),
            prompt: "hi".into(),
            system: None,
            temperature: 0.0,
            max_tokens: Some(32),
        });
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 32);
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn probe_against_closed_port_is_false() {
        // Port 9 (discard) is not an Ollama server on any test machine.
        assert!(!ollama_model_exists_at("127.0.0.1:9", "mistral"));
    }
}
