//! Runs scripts statement by statement against an executor.

use crate::input::ScriptSource;
use promptsql_core::{parse_statements, Executor, ResultSet, Statement};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Block after each `CREATE MODEL` until training settles.
    pub wait: bool,
    pub wait_timeout: Option<Duration>,
}

/// Result of one executed statement.
#[derive(Debug, Clone)]
pub struct StatementOutput {
    pub source: String,
    pub statement: &'static str,
    pub result: ResultSet,
}

/// A script that stopped early.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptFailure {
    pub source: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<StatementOutput>,
    pub errors: Vec<ScriptFailure>,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs every script in order. A failing statement stops its script; later
/// scripts still run against the same executor.
pub fn run_scripts(
    executor: &Executor,
    sources: &[ScriptSource],
    options: RunOptions,
) -> RunReport {
    let mut report = RunReport::default();

    for source in sources {
        let statements = match parse_statements(&source.content) {
            Ok(statements) => statements,
            Err(err) => {
                report.errors.push(ScriptFailure {
                    source: source.name.clone(),
                    message: err.to_string(),
                });
                continue;
            }
        };
        info!(source = %source.name, statements = statements.len(), "Running script");

        for statement in &statements {
            match run_statement(executor, statement, options) {
                Ok(result) => report.results.push(StatementOutput {
                    source: source.name.clone(),
                    statement: statement.kind(),
                    result,
                }),
                Err(message) => {
                    report.errors.push(ScriptFailure {
                        source: source.name.clone(),
                        message: format!("{}: {message}", statement.kind()),
                    });
                    break;
                }
            }
        }
    }

    report
}

fn run_statement(
    executor: &Executor,
    statement: &Statement,
    options: RunOptions,
) -> Result<ResultSet, String> {
    let mut result = executor.execute(statement).map_err(|e| e.to_string())?;

    if let (true, Statement::CreateModel(create)) = (options.wait, statement) {
        let project = create.name.project_or(&executor.config().default_project);
        debug!(model = %create.name, "Waiting for model");
        let record = executor
            .wait_predictor(project, &create.name.name, options.wait_timeout)
            .map_err(|e| e.to_string())?;

        if let Some(index) = result.column_index("status") {
            for row in &mut result.rows {
                row[index] = Value::String(record.status.to_string());
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(name: &str, content: &str) -> ScriptSource {
        ScriptSource {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_runs_statements_in_order() {
        let executor = Executor::default();
        let report = run_scripts(
            &executor,
            &[script("a.sql", "CREATE DATABASE proj; SHOW DATABASES;")],
            RunOptions::default(),
        );
        assert!(!report.has_errors());
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[1].statement, "SHOW DATABASES");
    }

    #[test]
    fn test_failure_stops_script_only() {
        let executor = Executor::default();
        let report = run_scripts(
            &executor,
            &[
                script("a.sql", "DROP DATABASE nope; CREATE DATABASE never;"),
                script("b.sql", "CREATE DATABASE proj;"),
            ],
            RunOptions::default(),
        );
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.starts_with("DROP DATABASE"));
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].source, "b.sql");
    }

    #[test]
    fn test_parse_error_skips_script() {
        let executor = Executor::default();
        let report = run_scripts(
            &executor,
            &[script("bad.sql", "CREATE DATABASE ok; SELEKT 1;")],
            RunOptions::default(),
        );
        assert_eq!(report.errors.len(), 1);
        assert!(report.results.is_empty());
        let databases = executor.run_sql("SHOW DATABASES").unwrap();
        assert_eq!(databases.len(), 1);
    }

    #[test]
    fn test_wait_reports_settled_status() {
        let executor = Executor::default();
        let report = run_scripts(
            &executor,
            &[script(
                "m.sql",
                "CREATE MODEL m PREDICT answer USING engine='langchain', prompt_template='{{question}}';",
            )],
            RunOptions {
                wait: true,
                wait_timeout: Some(Duration::from_secs(10)),
            },
        );
        assert!(!report.has_errors(), "{:?}", report.errors);
        assert_eq!(report.results[0].result.first_text("status"), Some("complete"));
    }
}
