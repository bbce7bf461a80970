//! Types for the model-SQL surface.
//!
//! This module defines the parsed statement tree, the tabular result returned by
//! every statement, and the predictor record tracked by the executor.

mod predictor;
mod result;
mod statement;

pub use predictor::{PredictorRecord, PredictorStatus};
pub use result::ResultSet;
pub use statement::{
    Bindings, CreateModel, ModelQuery, ObjectName, OptionMap, OptionValue, Projection, Statement,
};

/// Column holding the user's input in prompt-based models.
pub const USER_COLUMN: &str = "question";

/// Column holding the model's generated answer.
pub const ASSISTANT_COLUMN: &str = "answer";
