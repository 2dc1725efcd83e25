use anyhow::Context;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::shared::config::{CONFIG, LoggingConfig};

/// Installs the stderr and rolling-file layers. Keep the returned guard alive
/// until exit so buffered file output is flushed.
pub fn init() -> anyhow::Result<WorkerGuard> {
    let cfg: &LoggingConfig = &CONFIG.logging;
    let stderr_filter = parse_level("stdout_level", &cfg.stdout_level)?;
    let file_filter = parse_level("file_level", &cfg.file_level)?;

    // Rendered output owns stdout.
    let stderr_layer = fmt::layer()
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&cfg.log_dir, "pivot_udx.log"));
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    info!(log_dir = %cfg.log_dir, "Logging initialized");
    Ok(guard)
}

fn parse_level(key: &str, value: &str) -> anyhow::Result<LevelFilter> {
    value
        .parse::<LevelFilter>()
        .with_context(|| format!("logging.{} = {:?} is not a log level", key, value))
}

#[cfg(test)]
pub fn init_for_tests() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env()
            .add_directive("pivot_udx=debug".parse().unwrap());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::parse_level;

    #[test]
    fn parse_level_names_the_bad_key() {
        assert!(parse_level("file_level", "debug").is_ok());
        let err = parse_level("stdout_level", "loud").unwrap_err();
        assert!(err.to_string().contains("logging.stdout_level"));
    }
}
