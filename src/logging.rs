//! File-based tracing output. The dashboard owns the terminal, so log lines go
//! to `~/.config/dealscope/dealscope.log` instead of stdout or stderr.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::config_dir;

/// Install the subscriber. The returned guard must live until exit so
/// buffered lines are flushed. Returns `None` (logging disabled) when the log
/// directory cannot be created.
pub fn init(verbose: bool) -> Option<WorkerGuard> {
    let log_dir = config_dir();
    if std::fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    let appender = tracing_appender::rolling::never(&log_dir, "dealscope.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let directive = if verbose { "info,dealscope=debug" } else { "info" };

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(EnvFilter::new(directive))
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(verbose, log_dir = %log_dir.display(), "logging initialized");
    }
    Some(guard)
}
