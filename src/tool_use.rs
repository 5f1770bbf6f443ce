//! Human-readable descriptions of Claude Code tool calls.

use std::path::Path;

use serde_json::Value;

/// Result flags pulled from a PostToolUse `tool_response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub success: bool,
    pub exit_code: i64,
    pub error: Option<String>,
}

impl Default for ToolOutcome {
    fn default() -> Self {
        Self {
            success: true,
            exit_code: 0,
            error: None,
        }
    }
}

impl ToolOutcome {
    /// Missing flags count as success. Non-object responses (plain strings
    /// from some tools) carry no flags at all.
    pub fn from_response(response: &Value) -> Self {
        let success = response
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let exit_code = response
            .get("exit_code")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let error = response
            .get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        Self {
            success,
            exit_code,
            error,
        }
    }

    pub fn failed(&self) -> bool {
        !self.success || self.exit_code != 0
    }
}

fn str_field<'a>(input: &'a Value, key: &str) -> &'a str {
    input.get(key).and_then(Value::as_str).unwrap_or("")
}

fn int_field(input: &Value, key: &str) -> i64 {
    input.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn file_name_or<'a>(path: &'a str, fallback: &'a str) -> &'a str {
    if path.is_empty() {
        return fallback;
    }
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(fallback)
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// One-line summary of a tool call, prefixed with `❌ Failed: ` when it failed.
pub fn describe_tool(tool_name: &str, input: &Value, response: &Value) -> String {
    let outcome = ToolOutcome::from_response(response);
    let prefix = if outcome.failed() { "\u{274C} Failed: " } else { "" };

    let body = match tool_name {
        "Write" => {
            let filename = file_name_or(str_field(input, "file_path"), "file");
            let size = str_field(input, "content").chars().count();
            if size > 0 {
                format!("\u{1F4DD} Created {} ({} chars)", filename, size)
            } else {
                format!("\u{1F4DD} Created {}", filename)
            }
        }
        "Edit" => {
            let filename = file_name_or(str_field(input, "file_path"), "file");
            let old = str_field(input, "old_string");
            let new = str_field(input, "new_string");
            if !old.is_empty() && !new.is_empty() {
                format!(
                    "\u{270F}\u{FE0F} Modified {} ({} \u{2192} {} chars)",
                    filename,
                    old.chars().count(),
                    new.chars().count()
                )
            } else {
                format!("\u{270F}\u{FE0F} Modified {}", filename)
            }
        }
        "MultiEdit" => {
            let filename = file_name_or(str_field(input, "file_path"), "file");
            let count = input
                .get("edits")
                .and_then(Value::as_array)
                .map_or(1, Vec::len);
            format!("\u{1F4DD} Multi-edited {} ({} changes)", filename, count)
        }
        "Bash" => {
            let command = clip(str_field(input, "command"), 50);
            let description = str_field(input, "description");
            let shown = if description.is_empty() {
                command
            } else {
                format!("{} ({})", description, command)
            };
            let exit_info = if outcome.exit_code != 0 {
                format!(" [exit: {}]", outcome.exit_code)
            } else {
                String::new()
            };
            format!("\u{26A1} Executed: {}{}", shown, exit_info)
        }
        "Read" => {
            let filename = file_name_or(str_field(input, "file_path"), "file");
            let offset = int_field(input, "offset");
            let limit = int_field(input, "limit");
            let range = if limit > 0 {
                format!(" (lines {}-{})", offset, offset + limit)
            } else if offset > 0 {
                format!(" (from line {})", offset)
            } else {
                String::new()
            };
            format!("\u{1F4D6} Read {}{}", filename, range)
        }
        "Grep" | "Glob" => {
            let pattern = str_field(input, "pattern");
            let path = str_field(input, "path");
            let location = if path.is_empty() {
                String::new()
            } else {
                format!(" in {}", file_name_or(path, path))
            };
            format!("\u{1F50D} Searched for: {}{}", pattern, location)
        }
        "TodoWrite" | "TodoRead" => "\u{1F4CB} Updated task list".to_string(),
        "WebFetch" | "WebSearch" => {
            let url = str_field(input, "url");
            let query = str_field(input, "query");
            let term = [url, query]
                .into_iter()
                .find(|s| !s.is_empty())
                .unwrap_or("web content");
            let term: String = term.chars().take(50).collect();
            format!("\u{1F310} Web research: {}", term)
        }
        "NotebookEdit" => {
            let filename = file_name_or(str_field(input, "notebook_path"), "notebook");
            let mode = input
                .get("edit_mode")
                .and_then(Value::as_str)
                .unwrap_or("replace");
            format!("\u{1F4D3} {} in {}", title_case(mode), filename)
        }
        other => format!("\u{1F527} Used {}", other),
    };

    format!("{}{}", prefix, body).trim().to_string()
}
