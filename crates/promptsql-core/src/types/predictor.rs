use crate::types::OptionMap;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a predictor.
///
/// ```text
/// generating ──▶ training ──▶ complete
///                    │
///                    └──────▶ error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PredictorStatus {
    /// Registered, training has not started yet.
    Generating,
    /// The engine is preparing the model.
    Training,
    /// Ready to answer queries.
    Complete,
    /// Training failed; see [`PredictorRecord::error`].
    Error,
}

impl PredictorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generating => "generating",
            Self::Training => "training",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// True once the predictor has left the pending states.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl fmt::Display for PredictorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model registered in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictorRecord {
    pub project: String,
    pub name: String,
    /// Lowercase engine name (e.g. `langchain`).
    pub engine: String,
    /// Column the model predicts.
    pub target: String,
    /// Raw `USING` arguments, secrets included.
    pub options: OptionMap,
    pub status: PredictorStatus,
    /// Failure message when `status` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Engine-specific state produced by training.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_finished_at: Option<DateTime<Utc>>,
}

impl PredictorRecord {
    pub fn new(
        project: impl Into<String>,
        name: impl Into<String>,
        engine: impl Into<String>,
        target: impl Into<String>,
        options: OptionMap,
    ) -> Self {
        let now = Utc::now();
        Self {
            project: project.into(),
            name: name.into(),
            engine: engine.into(),
            target: target.into(),
            options,
            status: PredictorStatus::Generating,
            error: None,
            artifact: None,
            created_at: now,
            updated_at: now,
            training_finished_at: None,
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.project, self.name)
    }

    pub(crate) fn set_status(&mut self, status: PredictorStatus) {
        self.status = status;
        self.updated_at = Utc::now();
        if status.is_settled() {
            self.training_finished_at = Some(self.updated_at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_starts_generating() {
        let record = PredictorRecord::new("proj", "m", "langchain", "answer", OptionMap::new());
        assert_eq!(record.status, PredictorStatus::Generating);
        assert!(record.training_finished_at.is_none());
        assert_eq!(record.qualified_name(), "proj.m");
    }

    #[test]
    fn settling_stamps_finish_time() {
        let mut record = PredictorRecord::new("proj", "m", "langchain", "answer", OptionMap::new());
        record.set_status(PredictorStatus::Training);
        assert!(record.training_finished_at.is_none());
        record.set_status(PredictorStatus::Complete);
        assert!(record.training_finished_at.is_some());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&PredictorStatus::Complete).unwrap();
        assert_eq!(json, "\"complete\"");
    }
}
