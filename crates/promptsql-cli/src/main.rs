//! PromptSQL CLI - run model SQL scripts

use promptsql_cli::cli::{self, OutputFormat};
use promptsql_cli::input;
use promptsql_cli::logging;
use promptsql_cli::output::{format_json, format_table};
use promptsql_cli::runner::{run_scripts, RunOptions, RunReport};

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use promptsql_core::{EngineConfig, Executor};
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use cli::Args;

/// A statement failed.
const EXIT_FAILURE: u8 = 1;
/// Configuration or input error (unreadable file, invalid config).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(args.verbose, args.quiet);

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("promptsql: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    if args.config_schema {
        let schema = serde_json::to_string_pretty(&EngineConfig::json_schema())
            .context("Failed to serialize config schema")?;
        write_output(&args.output, &schema)?;
        return Ok(false);
    }

    let config = input::load_config(args.config.as_deref())?;
    let sources = input::read_input(&args.files)?;
    let executor = Executor::new(config);

    let report = run_scripts(
        &executor,
        &sources,
        RunOptions {
            wait: args.wait,
            wait_timeout: args.wait_timeout(),
        },
    );

    let output_str = match args.format {
        OutputFormat::Json => {
            format_json(&report, args.compact).context("Failed to serialize results")?
        }
        OutputFormat::Table => {
            let colored = args.output.is_none() && io::stdout().is_terminal();
            format_table(&report, colored)
        }
    };
    write_output(&args.output, &output_str)?;

    if args.format != OutputFormat::Json || args.output.is_some() {
        print_errors_to_stderr(&report);
    }

    Ok(report.has_errors())
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure newline at end for terminal output
        if !content.is_empty() && !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn print_errors_to_stderr(report: &RunReport) {
    let colored = io::stderr().is_terminal();
    for failure in &report.errors {
        let label = if colored {
            "error".red().bold().to_string()
        } else {
            "error".to_string()
        };
        eprintln!("promptsql: {label}: {}: {}", failure.source, failure.message);
    }
}
