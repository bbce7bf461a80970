//! Error types for provider calls.

use super::Provider;
use thiserror::Error;

/// Errors raised while talking to an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The `provider` argument names no supported provider.
    #[error("unknown provider '{0}' (supported: {supported})", supported = Provider::supported_names())]
    UnknownProvider(String),

    /// No credential was supplied for a provider that requires one.
    #[error(
        "missing API key for {provider}: pass '{option}' in USING or set the {env} environment variable"
    )]
    MissingApiKey {
        provider: Provider,
        option: &'static str,
        env: &'static str,
    },

    /// The request could not be sent or the response could not be read.
    #[error("request to {provider} failed: {source}")]
    Http {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Api {
        provider: Provider,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {provider}: {message}")]
    InvalidResponse { provider: Provider, message: String },
}
