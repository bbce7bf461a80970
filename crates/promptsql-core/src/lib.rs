pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod parser;
pub mod provider;
pub mod redact;
pub mod templater;
pub mod types;

// Re-export main types and functions
pub use config::EngineConfig;
pub use engine::{EngineError, EngineRegistry, LangchainEngine, MlEngine};
pub use error::{ParseError, ParseErrorKind, Position};
pub use executor::{Executor, ExecutorError};
pub use parser::{parse_statement, parse_statements};
pub use provider::{ollama_model_exists, Provider, ProviderError};
pub use templater::{render_prompt, template_variables, TemplateError};

pub use types::{
    Bindings, CreateModel, ModelQuery, ObjectName, OptionMap, OptionValue, PredictorRecord,
    PredictorStatus, Projection, ResultSet, Statement, ASSISTANT_COLUMN, USER_COLUMN,
};
