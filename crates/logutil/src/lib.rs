//! Utilities for logging.

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    HumanReadable,
    Json,
}

/// Build the filter for the global subscriber.
///
/// `RUST_LOG` directives take precedence, `default_level` applies to
/// everything they don't cover.
pub fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
}

/// Configure the global tracing subscriber.
///
/// Calling this more than once is a no-op, the first subscriber stays
/// installed.
pub fn configure_global_logger<W>(default_level: Level, format: LogFormat, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter(default_level))
        .with_writer(writer);

    let _ = match format {
        LogFormat::HumanReadable => {
            tracing::subscriber::set_global_default(builder.with_target(false).finish())
        }
        LogFormat::Json => tracing::subscriber::set_global_default(
            builder
                .json()
                .with_file(true)
                .with_line_number(true)
                .finish(),
        ),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_twice() {
        configure_global_logger(Level::DEBUG, LogFormat::HumanReadable, std::io::sink);
        configure_global_logger(Level::ERROR, LogFormat::Json, std::io::sink);
        tracing::debug!("still fine");
    }
}
