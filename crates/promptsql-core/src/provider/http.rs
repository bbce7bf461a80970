//! Blocking HTTP plumbing shared by the provider clients.

use super::{Provider, ProviderEndpoint, ProviderError};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

const USER_AGENT: &str = concat!("promptsql/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed back in `ProviderError::Api` messages.
const MAX_ERROR_BODY_CHARS: usize = 500;

pub(super) fn build_client(endpoint: &ProviderEndpoint) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(endpoint.timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| ProviderError::Http {
            provider: endpoint.provider,
            source,
        })
}

/// Sends a request and decodes a JSON success body into `T`.
pub(super) fn send_json<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .map_err(|source| ProviderError::Http { provider, source })?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|source| ProviderError::Http { provider, source })?;

    if !status.is_success() {
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|err| ProviderError::InvalidResponse {
        provider,
        message: err.to_string(),
    })
}

/// Pulls a readable message out of a provider error body.
///
/// Handles `{"error": {"message": ...}}` (OpenAI, Anthropic, Google) and
/// `{"error": "..."}` (Ollama); anything else is returned truncated.
pub(super) fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let error = json.get("error");
        if let Some(message) = error
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
        if let Some(message) = error.and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
