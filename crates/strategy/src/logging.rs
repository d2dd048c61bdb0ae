use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "keeper.log";

/// Directives used when `RUST_LOG` is unset: the configured level for this
/// crate, `warn` for everything else.
fn default_directives(level: &str) -> String {
    format!("leverage_strategy={level},warn")
}

/// Install the global subscriber: JSON lines to a daily-rolling file under
/// `log_dir`, plus compact text on stderr when enabled.
///
/// Hold the returned [`WorkerGuard`] until exit. Dropping it flushes the
/// file writer.
pub fn init_tracing(logging: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.log_dir)
        .with_context(|| format!("creating log directory {}", logging.log_dir))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&logging.log_dir, LOG_FILE_PREFIX));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(&logging.level)));

    let stderr_layer = logging
        .stderr
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(true).compact());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(file_writer).with_ansi(false).json())
        .with(stderr_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_crate_level() {
        let directives = default_directives("debug");
        assert_eq!(directives, "leverage_strategy=debug,warn");
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
