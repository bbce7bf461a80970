//! ML engines.
//!
//! An engine turns the `USING` arguments of `CREATE MODEL` into a stored
//! artifact (training) and answers `SELECT` queries against that artifact
//! (prediction). Engines are looked up by name in an [`EngineRegistry`];
//! the only built-in engine is [`LangchainEngine`].

mod error;
mod langchain;
mod registry;

pub use error::EngineError;
pub use langchain::{LangchainEngine, LangchainSettings, LANGCHAIN_ENGINE};
pub use registry::EngineRegistry;

use crate::types::{Bindings, OptionMap, PredictorRecord, ResultSet};
use serde_json::Value;

/// Engine state stored on a predictor once training completes.
pub type ModelArtifact = Value;

/// Column names of `DESCRIBE` results.
pub const DESCRIBE_COLUMNS: [&str; 2] = ["attribute", "value"];

/// Inputs to [`MlEngine::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateArgs {
    pub project: String,
    pub name: String,
    pub target: String,
    pub options: OptionMap,
}

pub trait MlEngine: Send + Sync {
    /// Name used in `USING engine = '<name>'`.
    fn name(&self) -> &str;

    /// Validates the arguments and builds the model artifact.
    ///
    /// Runs on the training thread, so it may block.
    fn create(&self, args: &CreateArgs) -> Result<ModelArtifact, EngineError>;

    /// Answers a query. The result's first column is the model's target.
    fn predict(
        &self,
        record: &PredictorRecord,
        bindings: &Bindings,
    ) -> Result<ResultSet, EngineError>;

    /// Engine-specific `DESCRIBE` rows (`attribute`, `value`).
    fn describe(&self, record: &PredictorRecord) -> ResultSet;
}

/// Appends an `attribute`/`value` row to a describe table.
pub(crate) fn push_attribute(table: &mut ResultSet, attribute: &str, value: impl Into<Value>) {
    table.push_row(vec![Value::String(attribute.to_string()), value.into()]);
}
