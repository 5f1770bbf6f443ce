//! Tracing setup shared by the binaries.
//!
//! Events go to `~/.claude/slack-notifications.log` through a non-blocking
//! writer, and warnings also go to stderr. `CLAUDE_SLACK_LOG` sets the filter.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_ENV: &str = "CLAUDE_SLACK_LOG";
pub const LOG_FILE_NAME: &str = "slack-notifications.log";

/// `<home>/.claude/slack-notifications.log`
pub fn log_file_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".claude").join(LOG_FILE_NAME)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber for binary `name`.
///
/// Returns the file writer's guard; keep it alive until `main` returns so
/// buffered lines are flushed. `None` means only stderr logging is active.
pub fn init(name: &str) -> Option<WorkerGuard> {
    init_at(name, dirs::home_dir().map(|home| log_file_path(&home)))
}

/// Like [`init`], with an explicit log file.
pub fn init_at(name: &str, log_path: Option<PathBuf>) -> Option<WorkerGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(LevelFilter::WARN);

    let file = log_path.and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let (file_layer, guard) = match file {
        Some(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    tracing::debug!(binary = name, "logging initialised");
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        assert_eq!(
            log_file_path(Path::new("/home/dev")),
            PathBuf::from("/home/dev/.claude/slack-notifications.log")
        );
    }

    #[test]
    fn test_init_at_creates_log_file_and_tolerates_reinit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".claude").join(LOG_FILE_NAME);

        let first = init_at("first", Some(path.clone()));
        assert!(first.is_some());
        assert!(path.exists());

        let second = init_at("second", None);
        assert!(second.is_none());
        tracing::warn!("logging still works after a second init");
        drop(first);
    }
}
