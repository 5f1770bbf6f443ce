//! Per-session aggregation state for PostToolUse notifications.
//!
//! Each session keeps a small JSON file recording its recent tool calls and
//! when the last notification went out. Tool calls that land inside the
//! aggregation window are sent as a single "recent activity" digest.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Overrides the directory state files live in.
pub const STATE_DIR_ENV: &str = "CLAUDE_SLACK_STATE_DIR";

const FILE_PREFIX: &str = "claude-slack-aggregation-";

/// Only the most recent records are kept.
pub const MAX_TOOL_RECORDS: usize = 10;

/// State files untouched for this long are deleted.
pub const STALE_AFTER: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// Directory holding the state files: `CLAUDE_SLACK_STATE_DIR` or the system temp dir.
pub fn state_dir() -> PathBuf {
    std::env::var_os(STATE_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

/// Hex digits of the session id digest appended to every file stem.
const DIGEST_CHARS: usize = 12;

/// Keep session ids from escaping the state directory. The digest suffix
/// keeps ids that sanitize alike (`a/b`, `a_b`) in separate files.
fn file_stem(session_id: &str) -> String {
    let digest = Sha256::digest(session_id.as_bytes());
    let suffix: String = digest
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>()
        .chars()
        .take(DIGEST_CHARS)
        .collect();

    let readable: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}", readable, suffix)
}

fn is_state_file(name: &str) -> bool {
    name.starts_with(FILE_PREFIX) && name.ends_with(".json")
}

/// A single tool call as remembered between hook invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub tool_name: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationState {
    pub session_id: String,
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
    pub last_notification: DateTime<Utc>,
    #[serde(default)]
    pub notification_count: u32,
}

impl AggregationState {
    pub fn new(session_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.to_string(),
            tools: Vec::new(),
            last_notification: now,
            notification_count: 0,
        }
    }

    pub fn file_path(dir: &Path, session_id: &str) -> PathBuf {
        dir.join(format!("{}{}.json", FILE_PREFIX, file_stem(session_id)))
    }

    /// Loads the stored state, or `None` when it is missing or unreadable.
    pub fn load(dir: &Path, session_id: &str) -> Option<Self> {
        let path = Self::file_path(dir, session_id);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt aggregation state");
                None
            }
        }
    }

    /// True when the previous notification went out less than `timeout_secs` ago.
    /// A non-positive timeout disables aggregation.
    pub fn should_aggregate(&self, timeout_secs: i64, now: DateTime<Utc>) -> bool {
        if timeout_secs <= 0 {
            return false;
        }
        now.signed_duration_since(self.last_notification) < Duration::seconds(timeout_secs)
    }

    /// Appends a tool call and marks a notification as sent at `now`.
    pub fn record(&mut self, tool_name: &str, description: &str, now: DateTime<Utc>) {
        self.tools.push(ToolRecord {
            tool_name: tool_name.to_string(),
            description: description.to_string(),
            timestamp: now,
        });
        if self.tools.len() > MAX_TOOL_RECORDS {
            let excess = self.tools.len() - MAX_TOOL_RECORDS;
            self.tools.drain(..excess);
        }
        self.last_notification = now;
        self.notification_count = self.notification_count.saturating_add(1);
    }

    /// Writes the state under an exclusive advisory lock.
    ///
    /// If another process holds the lock the write still happens, unlocked.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create state directory: {:?}", dir))?;

        let path = Self::file_path(dir, &self.session_id);
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize aggregation state")?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open state file: {:?}", path))?;

        let locked = match file.try_lock_exclusive() {
            Ok(()) => true,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "writing aggregation state without lock");
                false
            }
        };

        file.set_len(0)
            .and_then(|_| file.write_all(json.as_bytes()))
            .with_context(|| format!("Failed to write state file: {:?}", path))?;

        if locked {
            let _ = FileExt::unlock(&file);
        }

        Ok(path)
    }
}

/// Deletes aggregation state files in `dir` whose last modification is older
/// than `max_age`. Returns how many were removed.
pub fn cleanup_stale(dir: &Path, max_age: std::time::Duration) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read state directory: {:?}", dir))?;
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if !is_state_file(&name.to_string_lossy()) {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };

        if age > max_age {
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(path = %entry.path().display(), "removed stale aggregation state");
                    removed += 1;
                }
                Err(e) => warn!(path = %entry.path().display(), error = %e, "failed to remove stale state"),
            }
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_file_path_sanitizes_session_id() {
        let path = AggregationState::file_path(Path::new("/tmp"), "../evil/id");
        assert_eq!(path.parent(), Some(Path::new("/tmp")));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("claude-slack-aggregation-___evil_id-"));
        assert!(name.ends_with(".json"));
        assert_eq!(
            name.len(),
            "claude-slack-aggregation-___evil_id-".len() + DIGEST_CHARS + ".json".len()
        );
    }

    #[test]
    fn test_file_path_distinguishes_ids_that_sanitize_alike() {
        let dir = Path::new("/tmp");
        assert_ne!(
            AggregationState::file_path(dir, "a/b"),
            AggregationState::file_path(dir, "a_b")
        );
        assert_eq!(
            AggregationState::file_path(dir, "a/b"),
            AggregationState::file_path(dir, "a/b")
        );
    }

    #[test]
    fn test_ids_that_sanitize_alike_keep_separate_state() {
        let dir = tempdir().unwrap();
        let mut slash = AggregationState::new("a/b", at(0));
        slash.record("Edit", "edited", at(1));
        slash.save(dir.path()).unwrap();
        AggregationState::new("a_b", at(0)).save(dir.path()).unwrap();

        let loaded = AggregationState::load(dir.path(), "a/b").unwrap();
        assert_eq!(loaded.session_id, "a/b");
        assert_eq!(loaded.tools.len(), 1);
    }

    #[test]
    fn test_should_aggregate_window() {
        let state = AggregationState::new("s", at(0));
        assert!(state.should_aggregate(5, at(3)));
        assert!(!state.should_aggregate(5, at(5)));
        assert!(!state.should_aggregate(5, at(60)));
        assert!(!state.should_aggregate(0, at(1)));
        assert!(!state.should_aggregate(-1, at(1)));
    }

    #[test]
    fn test_record_keeps_last_ten() {
        let mut state = AggregationState::new("s", at(0));
        for i in 0..15 {
            state.record("Write", &format!("write {}", i), at(i));
        }
        assert_eq!(state.tools.len(), MAX_TOOL_RECORDS);
        assert_eq!(state.tools[0].description, "write 5");
        assert_eq!(state.tools[9].description, "write 14");
        assert_eq!(state.notification_count, 15);
        assert_eq!(state.last_notification, at(14));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let mut state = AggregationState::new("abc", at(0));
        state.record("Edit", "edited", at(1));

        let path = state.save(dir.path()).unwrap();
        assert!(path.exists());

        let loaded = AggregationState::load(dir.path(), "abc").unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_save_overwrites_longer_content() {
        let dir = tempdir().unwrap();
        let mut state = AggregationState::new("abc", at(0));
        for i in 0..10 {
            state.record("Bash", &"x".repeat(100), at(i));
        }
        state.save(dir.path()).unwrap();

        let fresh = AggregationState::new("abc", at(20));
        fresh.save(dir.path()).unwrap();
        assert_eq!(AggregationState::load(dir.path(), "abc").unwrap(), fresh);
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = tempdir().unwrap();
        assert!(AggregationState::load(dir.path(), "nope").is_none());

        let path = AggregationState::file_path(dir.path(), "bad");
        fs::write(&path, "{ not json").unwrap();
        assert!(AggregationState::load(dir.path(), "bad").is_none());
    }

    #[test]
    fn test_cleanup_ignores_fresh_and_foreign_files() {
        let dir = tempdir().unwrap();
        AggregationState::new("fresh", Utc::now())
            .save(dir.path())
            .unwrap();
        fs::write(dir.path().join("unrelated.json"), "{}").unwrap();

        let removed = cleanup_stale(dir.path(), STALE_AFTER).unwrap();
        assert_eq!(removed, 0);
        assert!(AggregationState::file_path(dir.path(), "fresh").exists());
    }

    #[test]
    fn test_cleanup_zero_age_removes_state_files() {
        let dir = tempdir().unwrap();
        AggregationState::new("old", Utc::now())
            .save(dir.path())
            .unwrap();
        fs::write(dir.path().join("unrelated.json"), "{}").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        let removed = cleanup_stale(dir.path(), std::time::Duration::ZERO).unwrap();
        assert_eq!(removed, 1);
        assert!(dir.path().join("unrelated.json").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert_eq!(cleanup_stale(&missing, STALE_AFTER).unwrap(), 0);
    }
}
