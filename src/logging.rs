use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize tracing. Returns the file writer guard when file logging is
/// configured; it must stay alive for the process lifetime.
pub fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    match &config.log_dir {
        Some(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, &config.log_file);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            if config.log_json {
                let file_layer = fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(non_blocking)
                    .with_ansi(false);
                registry.with(file_layer).init();
            } else {
                let file_layer = fmt::layer()
                    .with_target(false)
                    .with_writer(non_blocking)
                    .with_ansi(false);
                let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
                registry.with(file_layer).with(stdout_layer).init();
            }
            Some(guard)
        }
        None => {
            let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
            registry.with(stdout_layer).init();
            None
        }
    }
}
