//! Process-wide logging: compact lines on stderr plus a daily-rolling file
//! under `~/.jotter/logs`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "jotter.log";
const DEFAULT_FILTER: &str = "info,tao=warn,wry=warn";

/// Keeps the file writer alive; dropping it flushes buffered lines.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init(log_dir: Option<&Path>) -> LoggingGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if installed.is_ok() {
        install_panic_hook();
        match log_dir {
            Some(dir) => tracing::info!(log_dir = %dir.display(), "logging initialized"),
            None => tracing::warn!("no log directory available, logging to stderr only"),
        }
    }

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Panics are logged rather than lost in a windowless process.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "unhandled panic");
        default_hook(info);
    }));
}
