//! Input handling for script files, stdin and the configuration file.

use anyhow::{Context, Result};
use promptsql_core::EngineConfig;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// A SQL script and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    pub name: String,
    pub content: String,
}

/// Read SQL scripts from files or stdin.
///
/// If no files are provided, reads from stdin.
pub fn read_input(files: &[PathBuf]) -> Result<Vec<ScriptSource>> {
    if files.is_empty() {
        read_from_stdin()
    } else {
        read_from_files(files)
    }
}

/// Load the engine configuration, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    EngineConfig::from_json(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

fn read_from_stdin() -> Result<Vec<ScriptSource>> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read from stdin")?;

    Ok(vec![ScriptSource {
        name: "<stdin>".to_string(),
        content,
    }])
}

fn read_from_files(files: &[PathBuf]) -> Result<Vec<ScriptSource>> {
    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;

            Ok(ScriptSource {
                name: path.display().to_string(),
                content,
            })
        })
        .collect()
}
