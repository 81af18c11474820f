use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::AppPaths;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// sqlx logs every statement at info; keep it to slow-query warnings.
const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Which binary is logging. Batch jobs print their JSON report on stdout, so
/// their console output goes to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Server,
    Batch,
}

impl LogTarget {
    pub fn file_name(self) -> &'static str {
        match self {
            LogTarget::Server => "server.log",
            LogTarget::Batch => "batch.log",
        }
    }

    fn console(self) -> BoxMakeWriter {
        match self {
            LogTarget::Server => BoxMakeWriter::new(std::io::stdout),
            LogTarget::Batch => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber: console plus a daily-rolling file under the log dir.
pub fn init(paths: &AppPaths, target: LogTarget) {
    let log_dir = &paths.log_dir;
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, target.file_name());
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(target.console());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
