//! Tracing subscriber setup.

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Default filter directive when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "campaign_forge=debug,info"
    } else {
        "campaign_forge=info,warn"
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean. Calling it twice is an error.
pub fn init_tracing(verbose: bool, format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(verbose)
                    .with_ansi(use_color())
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?,
    }
    Ok(())
}

fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
        assert!(default_filter(true).contains("debug"));
    }

    #[test]
    fn test_second_init_fails() {
        // The first call may fail if another test installed a subscriber.
        let _ = init_tracing(false, LogFormat::Compact);
        assert!(init_tracing(false, LogFormat::Json).is_err());
    }
}
