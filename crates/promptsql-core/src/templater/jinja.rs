//! MiniJinja wrapper for prompt rendering.

use super::error::TemplateError;
use minijinja::{Environment, UndefinedBehavior, Value};
use std::collections::BTreeMap;

/// Recursion limit for template rendering.
const RECURSION_LIMIT: usize = 100;

const TEMPLATE_NAME: &str = "prompt";

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_recursion_limit(RECURSION_LIMIT);
    env
}

/// Renders a prompt template with strict undefined-variable checking.
pub(crate) fn render_jinja(
    template: &str,
    context: &BTreeMap<String, serde_json::Value>,
) -> Result<String, TemplateError> {
    let mut env = environment();
    env.add_template(TEMPLATE_NAME, template)?;

    let tmpl = env.get_template(TEMPLATE_NAME)?;
    let rendered = tmpl.render(Value::from_serialize(context))?;

    Ok(rendered)
}

/// Compiles a template without rendering it.
pub(crate) fn compile_jinja(template: &str) -> Result<(), TemplateError> {
    let mut env = environment();
    env.add_template(TEMPLATE_NAME, template)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_simple_variable() {
        let mut ctx = BTreeMap::new();
        ctx.insert("question".to_string(), serde_json::json!("Hi?"));

        let result = render_jinja("Answer: {{question}}", &ctx).unwrap();
        assert_eq!(result, "Answer: Hi?");
    }

    #[test]
    fn renders_conditional() {
        let mut ctx = BTreeMap::new();
        ctx.insert("formal".to_string(), serde_json::json!(true));

        let template = "{% if formal %}Dear user, {% endif %}hello";
        let result = render_jinja(template, &ctx).unwrap();
        assert_eq!(result, "Dear user, hello");
    }

    #[test]
    fn does_not_escape_html() {
        let mut ctx = BTreeMap::new();
        ctx.insert("question".to_string(), serde_json::json!("<b>&</b>"));

        let result = render_jinja("{{ question }}", &ctx).unwrap();
        assert_eq!(result, "<b>&</b>");
    }

    #[test]
    fn errors_on_undefined_variable() {
        let result = render_jinja("{{ missing }}", &BTreeMap::new());
        assert!(matches!(
            result.unwrap_err(),
            TemplateError::UndefinedVariable(_)
        ));
    }

    #[test]
    fn errors_on_syntax_error() {
        let result = compile_jinja("Answer: {{ unclosed");
        assert!(matches!(result.unwrap_err(), TemplateError::SyntaxError(_)));
    }
}
