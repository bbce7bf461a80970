//! Prompt template rendering.
//!
//! Models created with a `prompt_template` argument carry placeholders such as
//! `{{question}}` or `{{name}}`. At prediction time the `WHERE` bindings of the
//! query are substituted into those placeholders:
//!
//! ```text
//! SELECT answer FROM proj.m WHERE question='...' AND name='...'
//!                                  └────────┬────────┘
//!            'Your name is {{name}}. Answer: {{question}}' → rendered prompt
//! ```
//!
//! Rendering uses MiniJinja in strict mode, so an unbound placeholder is an
//! error rather than an empty string.
//!
//! # Example
//!
//! ```
//! use promptsql_core::templater::{render_prompt, template_variables};
//! use std::collections::BTreeMap;
//!
//! let template = "Your name is {{name}}. Answer the user in a useful way: {{question}}";
//! assert_eq!(template_variables(template), vec!["name", "question"]);
//!
//! let mut bindings = BTreeMap::new();
//! bindings.insert("name".to_string(), serde_json::json!("Ada"));
//! bindings.insert("question".to_string(), serde_json::json!("Who are you?"));
//!
//! let prompt = render_prompt(template, &bindings).unwrap();
//! assert!(prompt.starts_with("Your name is Ada."));
//! ```

mod error;
mod jinja;

pub use error::TemplateError;

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Lists the simple `{{ name }}` placeholders of a template in order of first appearance.
pub fn template_variables(template: &str) -> Vec<String> {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\{\{-?\s*([A-Za-z_][A-Za-z0-9_]*)\s*-?\}\}").expect("Invalid regex pattern")
    });

    let mut variables: Vec<String> = Vec::new();
    for caps in re.captures_iter(template) {
        let name = &caps[1];
        if !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
    }
    variables
}

/// Checks that a template compiles.
///
/// # Errors
///
/// - `TemplateError::SyntaxError` - Invalid template syntax
pub fn validate_template(template: &str) -> Result<(), TemplateError> {
    jinja::compile_jinja(template)
}

/// Renders a prompt template with the given bindings.
///
/// # Errors
///
/// - `TemplateError::UndefinedVariable` - A placeholder has no binding
/// - `TemplateError::SyntaxError` - Invalid template syntax
/// - `TemplateError::RenderError` - Other rendering failures
pub fn render_prompt(
    template: &str,
    bindings: &BTreeMap<String, serde_json::Value>,
) -> Result<String, TemplateError> {
    if let Some(missing) = template_variables(template)
        .into_iter()
        .find(|name| !bindings.contains_key(name))
    {
        return Err(TemplateError::UndefinedVariable(missing));
    }

    jinja::render_jinja(template, bindings)
}
