//! Human-readable table output formatting.

use crate::runner::{RunReport, StatementOutput};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::fmt::Write;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Format each statement result as a table, with optional colors.
pub fn format_table(report: &RunReport, colored: bool) -> String {
    let mut out = String::new();
    for (index, output) in report.results.iter().enumerate() {
        if index > 0 {
            writeln!(out).unwrap();
        }
        write_result(&mut out, output, colored);
    }
    out
}

fn write_result(out: &mut String, output: &StatementOutput, colored: bool) {
    let header = format!("{} ({})", output.statement, output.source);
    if colored {
        writeln!(out, "{}", header.bold()).unwrap();
    } else {
        writeln!(out, "{header}").unwrap();
    }

    let result = &output.result;
    if result.columns.is_empty() {
        if colored {
            writeln!(out, "{}", "OK".green()).unwrap();
        } else {
            writeln!(out, "OK").unwrap();
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(result.columns.iter().cloned());
    for row in &result.rows {
        builder.push_record(row.iter().map(cell_text));
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    writeln!(out, "{table}").unwrap();

    let count = format!(
        "{} row{}",
        result.len(),
        if result.len() == 1 { "" } else { "s" }
    );
    if colored {
        writeln!(out, "{}", count.dimmed()).unwrap();
    } else {
        writeln!(out, "{count}").unwrap();
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
