//! Logging for gitpulse
//!
//! One daily-rotated log file under the XDG state directory
//! (`~/.local/state/gitpulse/`). Rotation leaves one file per day behind;
//! `logging.max_files` bounds how many of those survive the next `init`.

use crate::config::{Config, LoggingConfig};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Rotated files are named `gitpulse.log.YYYY-MM-DD`.
const LOG_FILE_PREFIX: &str = "gitpulse.log";

/// Holds the non-blocking writer's worker thread. Dropping it flushes
/// pending writes, so callers keep it alive for the process lifetime.
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Initialize file logging from the `[logging]` config section.
///
/// Prunes rotated log files beyond `max_files` before opening the
/// appender, so a long-lived install never accumulates unbounded logs.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let pruned = prune_rotated_logs(&log_dir, config.max_files)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let (writer, worker) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(level_filter(config))
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    tracing::info!(
        dir = %log_dir.display(),
        level = %config.level,
        pruned,
        "Logging started"
    );

    Ok(LoggingGuard { _worker: worker })
}

/// `RUST_LOG` wins over the configured level; an unparseable configured
/// level falls back to `info` instead of failing startup.
fn level_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Remove rotated log files beyond the `keep` newest. Returns how many
/// were removed.
///
/// Daily rotation suffixes file names with the ISO date, so lexicographic
/// order on the name is chronological order.
pub fn prune_rotated_logs(dir: &Path, keep: usize) -> Result<usize> {
    let mut rotated: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        })
        .collect();

    if rotated.len() <= keep {
        return Ok(0);
    }

    rotated.sort();
    let excess = rotated.len() - keep;
    let mut removed = 0;
    for path in rotated.into_iter().take(excess) {
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not remove old log file");
            }
        }
    }

    Ok(removed)
}

/// Stdout logging for test binaries.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Current log file path.
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_prune_keeps_newest_rotated_logs() {
        let dir = TempDir::new().unwrap();
        for date in ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"] {
            touch(dir.path(), &format!("{}.{}", LOG_FILE_PREFIX, date));
        }
        touch(dir.path(), "unrelated.txt");

        let removed = prune_rotated_logs(dir.path(), 2).unwrap();
        assert_eq!(removed, 2);
        assert!(!dir.path().join("gitpulse.log.2024-01-01").exists());
        assert!(!dir.path().join("gitpulse.log.2024-01-02").exists());
        assert!(dir.path().join("gitpulse.log.2024-01-03").exists());
        assert!(dir.path().join("gitpulse.log.2024-01-04").exists());
        // Files outside the log prefix are never touched.
        assert!(dir.path().join("unrelated.txt").exists());
    }

    #[test]
    fn test_prune_noop_under_limit() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "gitpulse.log.2024-01-01");

        assert_eq!(prune_rotated_logs(dir.path(), 5).unwrap(), 0);
        assert!(dir.path().join("gitpulse.log.2024-01-01").exists());
    }

    #[test]
    fn test_log_file_path() {
        assert!(log_file_path().ends_with("gitpulse.log"));
    }
}
