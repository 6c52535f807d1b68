use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter
pub const LOG_ENV: &str = "PLANK_LOG";

/// Resolve the filter: `PLANK_LOG` first, then the configured level, then `info`.
pub fn build_filter(level: &str) -> EnvFilter {
    match EnvFilter::try_from_env(LOG_ENV) {
        Ok(f) => f,
        Err(_) => match level.parse::<EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!("WARN: log level '{level}' is not a valid tracing filter ({e}); falling back to 'info'");
                EnvFilter::new("info")
            }
        },
    }
}

/// Log to `<log_dir>/plank.log`; the terminal belongs to the TUI.
/// Keep the returned guard alive for the life of the program so buffered lines are flushed.
pub fn init(log_dir: &Path, level: &str) -> Option<WorkerGuard> {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("WARN: cannot create log dir {}: {e}", log_dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::never(log_dir, "plank.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .ok()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "plank starting");
    Some(guard)
}
