//! Logging utilities for CLI output

use tracing_subscriber::EnvFilter;

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            LogLevel::Quiet
        } else if verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }

    /// Default `tracing` filter for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "debug",
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

/// Send `tracing` events to stderr; `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    // A subscriber may already be installed when embedded in another program
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_flags() {
        assert_eq!(LogLevel::from_flags(false, false), LogLevel::Normal);
        assert_eq!(LogLevel::from_flags(true, false), LogLevel::Verbose);
        assert_eq!(LogLevel::from_flags(true, true), LogLevel::Quiet);
    }

    #[test]
    fn test_filter_directive() {
        assert_eq!(LogLevel::Quiet.filter_directive(), "error");
        assert_eq!(LogLevel::Normal.filter_directive(), "warn");
        assert_eq!(LogLevel::Verbose.filter_directive(), "debug");
    }
}
