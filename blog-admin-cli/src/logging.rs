use std::io;

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Логи CLI идут в stderr без времени: stdout остаётся для вывода команд.
/// `RUST_LOG` важнее `level` из настроек.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| anyhow!("bad LOG_LEVEL {level:?}: {e}"))?,
    };
    let verbose = filter
        .max_level_hint()
        .is_some_and(|hint| hint >= tracing::Level::DEBUG);

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose)
        .without_time()
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}
