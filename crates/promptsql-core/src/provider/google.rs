//! Google Gemini `generateContent` client.

use super::http::{build_client, send_json};
use super::{ChatModel, ChatRequest, Provider, ProviderEndpoint, ProviderError};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct GoogleChat {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleChat {
    pub fn new(endpoint: &ProviderEndpoint) -> Result<Self, ProviderError> {
        let api_key = endpoint.require_api_key()?.to_string();
        Ok(Self {
            client: build_client(endpoint)?,
            base_url: endpoint.base_url.clone(),
            api_key,
        })
    }
}

pub(crate) fn request_body(request: &ChatRequest) -> Value {
    let mut generation_config = json!({ "temperature": request.temperature });
    if let Some(max_tokens) = request.max_tokens {
        generation_config["maxOutputTokens"] = json!(max_tokens);
    }

    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "generationConfig": generation_config,
    });
    if let Some(system) = &request.system {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl ChatModel for GoogleChat {
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let model = request.model.trim_start_matches("models/");
        let url = format!("{}/models/{model}:generateContent", self.base_url);

        let response: GenerateResponse = send_json(
            Provider::Google,
            self.client
                .post(url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body(request)),
        )?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse {
                provider: Provider::Google,
                message: "response contained no candidate text".to_string(),
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_uses_generation_config() {
        let body = request_body(&ChatRequest {
            model: "gemini-1.5-pro".into(),
            prompt: "hi".into(),
            system: None,
            temperature: 0.2,
            max_tokens: Some(100),
        });
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 100);
        assert!(body.get("systemInstruction").is_none());
    }
}
