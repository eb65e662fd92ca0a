//! Diagnostic logging setup
//!
//! Filter precedence: `PARTLOG_LOG`, then `--quiet`/`--verbose`, then the
//! `log_filter` setting. Output goes to stderr so command output stays
//! pipeable.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "PARTLOG_LOG";

/// The filter directive to use when `PARTLOG_LOG` is unset
pub fn default_directive<'a>(quiet: bool, verbose: bool, configured: &'a str) -> &'a str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        configured
    }
}

/// Install the global subscriber
pub fn init_tracing(quiet: bool, verbose: bool, configured: &str) -> anyhow::Result<()> {
    let directive = default_directive(quiet, verbose, configured);

    // A bad directive in the settings file falls back to "warn"
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
