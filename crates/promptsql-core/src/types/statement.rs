//! Parsed statement tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A possibly project-qualified object name (`proj.model` or `model`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectName {
    /// Project (database) qualifier, if one was written.
    pub project: Option<String>,
    /// Object name.
    pub name: String,
}

impl ObjectName {
    pub fn new(project: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            project: project.map(str::to_string),
            name: name.into(),
        }
    }

    /// Returns the qualifier, or `default` when the name is unqualified.
    pub fn project_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.project.as_deref().unwrap_or(default)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{project}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A literal value from a `USING` list or a `WHERE` binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Converts to a JSON value. Whole numbers become integers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serde_json::Value::from(*n as i64)
            }
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(_) => write!(f, "{}", self.to_json()),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// `USING` arguments keyed by lowercase option name.
pub type OptionMap = BTreeMap<String, OptionValue>;

/// `WHERE column = value` bindings keyed by column name.
pub type Bindings = BTreeMap<String, OptionValue>;

/// `CREATE MODEL <name> PREDICT <target> USING ...`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateModel {
    pub name: ObjectName,
    /// Column the model produces.
    pub target: String,
    pub options: OptionMap,
    pub or_replace: bool,
    pub if_not_exists: bool,
}

impl CreateModel {
    /// The engine named in `USING engine=...`, if any.
    pub fn engine(&self) -> Option<&str> {
        self.options.get("engine").and_then(OptionValue::as_str)
    }
}

/// Columns requested by a `SELECT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Wildcard,
    Columns(Vec<String>),
}

/// `SELECT <projection> FROM <model> WHERE k = v AND ...`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelQuery {
    pub model: ObjectName,
    pub projection: Projection,
    pub bindings: Bindings,
}

/// A single parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateProject { name: String, if_not_exists: bool },
    DropProject { name: String, if_exists: bool },
    CreateModel(CreateModel),
    DropModel { name: ObjectName, if_exists: bool },
    Select(ModelQuery),
    Describe { name: ObjectName },
    ShowModels { project: Option<String> },
    ShowDatabases,
}

impl Statement {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateProject { .. } => "CREATE DATABASE",
            Self::DropProject { .. } => "DROP DATABASE",
            Self::CreateModel(_) => "CREATE MODEL",
            Self::DropModel { .. } => "DROP MODEL",
            Self::Select(_) => "SELECT",
            Self::Describe { .. } => "DESCRIBE",
            Self::ShowModels { .. } => "SHOW MODELS",
            Self::ShowDatabases => "SHOW DATABASES",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_display() {
        assert_eq!(
            ObjectName::new(Some("proj"), "model").to_string(),
            "proj.model"
        );
        assert_eq!(ObjectName::new(None, "model").to_string(), "model");
    }

    #[test]
    fn object_name_project_fallback() {
        let name = ObjectName::new(None, "model");
        assert_eq!(name.project_or("mindsdb"), "mindsdb");
    }

    #[test]
    fn option_value_numbers_render_without_fraction() {
        assert_eq!(OptionValue::Number(3.0).to_string(), "3");
        assert_eq!(OptionValue::Number(0.5).to_string(), "0.5");
        assert_eq!(OptionValue::Number(3.0).to_json(), serde_json::json!(3));
    }

    #[test]
    fn option_value_string_coercions() {
        assert_eq!(OptionValue::String("0.7".into()).as_f64(), Some(0.7));
        assert_eq!(OptionValue::Null.as_str(), None);
    }
}
