//! Registration of the Slack hook executables in Claude Code's `settings.json`.
//!
//! The settings file belongs to Claude Code, so it is handled as untyped JSON
//! and only the Slack entries under `hooks.<type>` are ever touched.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::config::{load_document, save_document};
use crate::error::Result;

/// Directory the hook commands are expected in, relative to the project.
pub const HOOKS_DIR: &str = "$CLAUDE_PROJECT_DIR/.claude/hooks";

/// The three Claude Code events this integration listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Notification,
    PostToolUse,
    Stop,
}

impl HookKind {
    pub const ALL: [HookKind; 3] = [HookKind::Notification, HookKind::PostToolUse, HookKind::Stop];

    /// Key under `hooks` in settings.json
    pub fn settings_key(&self) -> &'static str {
        match self {
            HookKind::Notification => "notification",
            HookKind::PostToolUse => "posttooluse",
            HookKind::Stop => "stop",
        }
    }

    /// Value of `hook_event_name` in the hook's stdin payload
    pub fn event_name(&self) -> &'static str {
        match self {
            HookKind::Notification => "Notification",
            HookKind::PostToolUse => "PostToolUse",
            HookKind::Stop => "Stop",
        }
    }

    /// File name of the installed hook executable
    pub fn executable(&self) -> &'static str {
        match self {
            HookKind::Notification => "notification-slack",
            HookKind::PostToolUse => "posttooluse-slack",
            HookKind::Stop => "stop-slack",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            HookKind::Notification => "Send notifications to Slack",
            HookKind::PostToolUse => "Send tool usage updates to Slack",
            HookKind::Stop => "Send session completion notifications to Slack",
        }
    }

    /// Maps a hook file name (with or without `.py`) back to its kind.
    pub fn from_filename(name: &str) -> Option<HookKind> {
        let stem = strip_py(name);
        HookKind::ALL.into_iter().find(|kind| kind.executable() == stem)
    }

    pub fn command(&self) -> String {
        format!("{}/{}", HOOKS_DIR, self.executable())
    }

    fn entry(&self) -> Value {
        json!({
            "command": self.command(),
            "description": self.description(),
        })
    }
}

/// File names of all three hook executables.
pub fn all_hook_filenames() -> Vec<String> {
    HookKind::ALL
        .iter()
        .map(|kind| kind.executable().to_string())
        .collect()
}

fn strip_py(name: &str) -> &str {
    name.strip_suffix(".py").unwrap_or(name)
}

fn entry_command(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(command) => Some(command.as_str()),
        Value::Object(map) => map.get("command").and_then(Value::as_str),
        _ => None,
    }
}

/// Last path component of a hook command, ignoring any arguments after it.
fn command_filename(command: &str) -> &str {
    let program = command.split_whitespace().next().unwrap_or("");
    program.rsplit(['/', '\\']).next().unwrap_or(program)
}

/// True if `command` runs one of the `*-slack` hook executables.
pub fn is_slack_hook_command(command: &str) -> bool {
    strip_py(command_filename(command)).ends_with("-slack")
}

fn matches_any(command: &str, names: &[&str]) -> bool {
    let stem = strip_py(command_filename(command));
    names.iter().any(|name| strip_py(name) == stem)
}

/// Add the standard entry for each hook type that has no Slack entry yet.
///
/// Unrecognised file names are skipped. Returns the hook types that were
/// added; calling it again with the same names adds nothing.
pub fn register_hooks<S: AsRef<str>>(hook_filenames: &[S], settings_path: &Path) -> Result<Vec<HookKind>> {
    let mut settings = load_document(settings_path)?;

    let hooks = settings
        .entry("hooks")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(hooks) = hooks else {
        tracing::warn!(path = %settings_path.display(), "`hooks` is not an object, leaving settings untouched");
        return Ok(Vec::new());
    };

    let mut added = Vec::new();
    for name in hook_filenames {
        let Some(kind) = HookKind::from_filename(name.as_ref()) else {
            tracing::debug!(name = name.as_ref(), "skipping unknown hook file");
            continue;
        };

        match hooks.get_mut(kind.settings_key()) {
            None => {
                hooks.insert(
                    kind.settings_key().to_string(),
                    Value::Array(vec![kind.entry()]),
                );
                added.push(kind);
            }
            Some(Value::Array(entries)) => {
                let present = entries
                    .iter()
                    .filter_map(entry_command)
                    .any(is_slack_hook_command);
                if !present {
                    entries.push(kind.entry());
                    added.push(kind);
                }
            }
            Some(_) => {
                tracing::warn!(
                    hook_type = kind.settings_key(),
                    "hook entry is not a list, not registering Slack hook"
                );
            }
        }
    }

    if !added.is_empty() {
        save_document(&settings, settings_path)?;
    }
    Ok(added)
}

/// Remove the entries that run any of `hook_filenames`.
///
/// Hook types left with no entries are dropped from `hooks`. The file is only
/// rewritten when something was removed.
pub fn unregister_hooks<S: AsRef<str>>(hook_filenames: &[S], settings_path: &Path) -> Result<bool> {
    let mut settings = load_document(settings_path)?;
    let names: Vec<&str> = hook_filenames.iter().map(AsRef::as_ref).collect();

    let Some(Value::Object(hooks)) = settings.get_mut("hooks") else {
        return Ok(false);
    };

    let mut removed = false;
    let mut emptied = Vec::new();
    for (hook_type, entries) in hooks.iter_mut() {
        let Value::Array(entries) = entries else {
            continue;
        };

        let before = entries.len();
        entries.retain(|entry| !entry_command(entry).is_some_and(|cmd| matches_any(cmd, &names)));
        if entries.len() < before {
            removed = true;
            if entries.is_empty() {
                emptied.push(hook_type.clone());
            }
        }
    }

    for hook_type in emptied {
        hooks.remove(&hook_type);
    }

    if removed {
        save_document(&settings, settings_path)?;
    }
    Ok(removed)
}
