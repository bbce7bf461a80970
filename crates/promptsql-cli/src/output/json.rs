//! JSON output formatting.

use crate::runner::RunReport;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Serialize)]
struct JsonResult<'a> {
    source: &'a str,
    statement: &'a str,
    columns: &'a [String],
    rows: Vec<Map<String, Value>>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: Vec<JsonResult<'a>>,
    errors: &'a [crate::runner::ScriptFailure],
}

/// Format the run report as JSON, with rows as column-keyed objects.
///
/// If `compact` is true, outputs minified JSON without whitespace.
pub fn format_json(report: &RunReport, compact: bool) -> serde_json::Result<String> {
    let json = JsonReport {
        results: report
            .results
            .iter()
            .map(|output| JsonResult {
                source: &output.source,
                statement: output.statement,
                columns: &output.result.columns,
                rows: output.result.to_records(),
            })
            .collect(),
        errors: &report.errors,
    };

    if compact {
        serde_json::to_string(&json)
    } else {
        serde_json::to_string_pretty(&json)
    }
}
