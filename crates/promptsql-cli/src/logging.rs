//! Logging setup for the CLI, powered by tracing-subscriber.

use tracing_subscriber::EnvFilter;

/// Crates whose events are shown at the chosen level.
const OWN_TARGETS: &[&str] = &["promptsql_core", "promptsql_cli"];

/// Maps `-q` / `-v` flags to a level for this workspace's crates.
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

/// Builds the filter: `RUST_LOG` when set, otherwise `level` for our crates
/// and `warn` for everything else.
pub fn build_env_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = vec!["warn".to_string()];
    for target in OWN_TARGETS {
        directives.push(format!("{target}={level}"));
    }
    EnvFilter::new(directives.join(","))
}

/// Installs a stderr `fmt` subscriber. Does nothing if one is already set.
pub fn init_logging(verbose: u8, quiet: bool) {
    let filter = build_env_filter(level_for(verbose, quiet));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .with_thread_names(verbose > 1)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(level_for(0, false), "warn");
        assert_eq!(level_for(1, false), "info");
        assert_eq!(level_for(3, false), "debug");
        assert_eq!(level_for(2, true), "error");
    }
}
