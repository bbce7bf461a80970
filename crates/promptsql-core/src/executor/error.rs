use crate::engine::EngineError;
use crate::error::ParseError;
use crate::types::PredictorStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`Executor`](super::Executor).
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("project '{0}' already exists")]
    ProjectExists(String),

    #[error("project '{0}' does not exist")]
    ProjectNotFound(String),

    #[error("project '{0}' cannot be dropped")]
    ProtectedProject(String),

    #[error("model '{0}' already exists")]
    ModelExists(String),

    #[error("model '{0}' does not exist")]
    ModelNotFound(String),

    #[error("model '{name}' is not ready (status: {status})")]
    ModelNotReady {
        name: String,
        status: PredictorStatus,
    },

    #[error("unknown ML engine '{0}'")]
    UnknownEngine(String),

    #[error("training of model '{name}' failed: {message}")]
    TrainingFailed { name: String, message: String },

    #[error("timed out after {waited:?} waiting for model '{name}' (status: {status})")]
    WaitTimeout {
        name: String,
        waited: Duration,
        status: PredictorStatus,
    },

    #[error("column '{column}' is not produced by model '{model}'")]
    UnknownColumn { column: String, model: String },

    #[error("failed to start training thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
