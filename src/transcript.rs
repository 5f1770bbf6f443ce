//! Session summaries read from Claude Code JSONL transcripts.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Tools whose `file_path` input counts as a modified file.
const FILE_TOOLS: [&str; 3] = ["Write", "Edit", "MultiEdit"];

/// How busy a session was, judged by its number of tool calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Empty,
    Brief,
    Moderate,
    Significant,
}

impl ActivityLevel {
    pub fn from_tool_count(count: usize) -> Self {
        match count {
            0 => ActivityLevel::Empty,
            1 => ActivityLevel::Brief,
            2..=4 => ActivityLevel::Moderate,
            _ => ActivityLevel::Significant,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Empty => "No activity recorded",
            ActivityLevel::Brief => "Brief session",
            ActivityLevel::Moderate => "Session completed with activity",
            ActivityLevel::Significant => "Active session with significant work",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSummary {
    /// Total tool calls, repeats included
    pub tool_uses: usize,
    /// Distinct tool names in first-use order
    pub unique_tools: Vec<String>,
    /// Distinct file names touched by Write/Edit/MultiEdit, in first-touch order
    pub modified_files: Vec<String>,
    pub user_messages: usize,
    pub assistant_messages: usize,
}

impl TranscriptSummary {
    pub fn activity(&self) -> ActivityLevel {
        ActivityLevel::from_tool_count(self.tool_uses)
    }

    fn record_tool(&mut self, name: &str, input: &Value) {
        self.tool_uses += 1;
        if !self.unique_tools.iter().any(|t| t == name) {
            self.unique_tools.push(name.to_string());
        }

        if FILE_TOOLS.contains(&name) {
            let file_name = input
                .get("file_path")
                .and_then(Value::as_str)
                .and_then(|p| Path::new(p).file_name())
                .and_then(|n| n.to_str());
            if let Some(file_name) = file_name {
                if !self.modified_files.iter().any(|f| f == file_name) {
                    self.modified_files.push(file_name.to_string());
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptEntry {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<Value>,
}

/// Summarise the transcript at `path`.
///
/// A missing or unreadable file yields an empty summary; lines that are not
/// valid JSON are skipped.
pub fn summarize_transcript(path: Option<&Path>) -> TranscriptSummary {
    let mut summary = TranscriptSummary::default();

    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        return summary;
    };
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "transcript not readable");
            return summary;
        }
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stopped reading transcript");
                break;
            }
        }

        let Ok(line) = std::str::from_utf8(&buf) else {
            debug!(path = %path.display(), "skipping non-UTF-8 transcript line");
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Ok(entry) = serde_json::from_str::<TranscriptEntry>(line) else {
            continue;
        };

        match entry.kind.as_str() {
            "user" => summary.user_messages += 1,
            "assistant" => {
                summary.assistant_messages += 1;
                let content = entry
                    .message
                    .as_ref()
                    .and_then(|m| m.get("content"))
                    .and_then(Value::as_array);
                for item in content.into_iter().flatten() {
                    if item.get("type").and_then(Value::as_str) != Some("tool_use") {
                        continue;
                    }
                    if let Some(name) = item.get("name").and_then(Value::as_str) {
                        let input = item.get("input").unwrap_or(&Value::Null);
                        summary.record_tool(name, input);
                    }
                }
            }
            _ => {}
        }
    }

    summary
}
