use crate::provider::ProviderError;
use crate::templater::TemplateError;
use thiserror::Error;

/// Errors raised by an ML engine while creating or querying a model.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid value for '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The stored artifact does not match what the engine expects.
    #[error("corrupt model artifact: {0}")]
    Artifact(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl EngineError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
