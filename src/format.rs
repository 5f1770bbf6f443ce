//! Block Kit message builders.
//!
//! The first three builders are generic templates driven by typed reports.
//! The rest build the payloads the event hooks send and take the current
//! time explicitly so output is reproducible in tests.

use std::path::Path;

use chrono::{DateTime, Local};

use crate::aggregation::ToolRecord;
use crate::blocks::{field, truncate, Block, SlackMessage, DEFAULT_MAX_LENGTH};
use crate::tool_use::ToolOutcome;
use crate::transcript::TranscriptSummary;

const HOOK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn iso_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Bulleted list of the first `limit` items, with a trailing `(+N more <noun>)`.
fn bullet_list(items: &[String], limit: usize, noun: &str) -> String {
    let mut text = items
        .iter()
        .take(limit)
        .map(|item| format!("\u{2022} {}", item))
        .collect::<Vec<_>>()
        .join("\n");
    if items.len() > limit {
        text.push_str(&format!("\n\u{2022} (+{} more {})", items.len() - limit, noun));
    }
    text
}

/// Comma-separated list of the first `limit` items, with a trailing `(+N more)`.
fn inline_list(items: &[String], limit: usize) -> String {
    let mut text = items
        .iter()
        .take(limit)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > limit {
        text.push_str(&format!(" (+{} more)", items.len() - limit));
    }
    text
}

// ---------------------------------------------------------------------------
// Generic templates
// ---------------------------------------------------------------------------

/// Outcome of a finished session.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub session_id: Option<String>,
    pub failed: bool,
    pub duration: Option<String>,
    pub commands_executed: Option<u64>,
    pub files_modified: Option<u64>,
    pub tools_used: Option<Vec<String>>,
    pub modified_files: Option<Vec<String>>,
    pub error_message: Option<String>,
    pub timestamp: Option<String>,
}

pub fn session_complete(report: &SessionReport) -> SlackMessage {
    let header = if report.failed {
        "\u{274C} Claude Code Session Failed"
    } else {
        "\u{2705} Claude Code Session Completed"
    };
    let mut blocks = vec![Block::header(header)];

    let mut fields = Vec::new();
    if let Some(id) = &report.session_id {
        fields.push(field("Session ID", id));
    }
    if let Some(duration) = &report.duration {
        fields.push(field("Duration", duration));
    }
    if let Some(commands) = report.commands_executed {
        fields.push(field("Commands", commands));
    }
    if let Some(files) = report.files_modified {
        fields.push(field("Files Modified", files));
    }
    if !fields.is_empty() {
        blocks.push(Block::fields(fields));
    }

    if let Some(tools) = &report.tools_used {
        blocks.push(Block::section(format!(
            "*Tools Used:*\n{}",
            inline_list(tools, 10)
        )));
    }
    if let Some(files) = &report.modified_files {
        blocks.push(Block::section(format!(
            "*Modified Files:*\n{}",
            bullet_list(files, 5, "files")
        )));
    }

    if report.failed {
        if let Some(error) = &report.error_message {
            blocks.push(Block::section(format!("*Error:*\n{}", error)));
        }
    }

    let timestamp = report.timestamp.clone().unwrap_or_else(iso_now);
    blocks.push(Block::context(format!("Completed at {}", timestamp)));

    let outcome = if report.failed { "failed" } else { "completed" };
    SlackMessage::new(format!("Claude Code session {}", outcome), blocks)
}

/// A request for user input.
#[derive(Debug, Clone, Default)]
pub struct InputRequest {
    pub prompt: Option<String>,
    pub context: Option<String>,
    pub session_id: Option<String>,
    /// Seconds until the request expires
    pub timeout: Option<u64>,
    pub options: Vec<String>,
    pub timestamp: Option<String>,
}

pub fn input_needed(request: &InputRequest) -> SlackMessage {
    let mut blocks = vec![Block::header("\u{26A0}\u{FE0F} Input Needed")];

    let prompt = request.prompt.as_deref().unwrap_or("Input required");
    let mut prompt_text = format!("*Prompt:*\n{}", prompt);
    if let Some(context) = request.context.as_deref().filter(|c| !c.is_empty()) {
        prompt_text.push_str(&format!("\n\n*Context:*\n{}", context));
    }
    blocks.push(Block::section(prompt_text));

    let mut fields = Vec::new();
    if let Some(id) = &request.session_id {
        fields.push(field("Session ID", id));
    }
    if let Some(timeout) = request.timeout {
        fields.push(field("Timeout", format!("{}m", timeout / 60)));
    }
    if !fields.is_empty() {
        blocks.push(Block::fields(fields));
    }

    if !request.options.is_empty() {
        blocks.push(Block::section(format!(
            "*Available Options:*\n{}",
            bullet_list(&request.options, 10, "options")
        )));
    }

    let timestamp = request.timestamp.clone().unwrap_or_else(iso_now);
    blocks.push(Block::context(format!("Requested at {}", timestamp)));

    SlackMessage::new("Claude Code needs input to continue", blocks)
}

/// A mid-session progress report.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub current_task: Option<String>,
    pub session_id: Option<String>,
    pub progress_percentage: Option<f64>,
    pub estimated_completion: Option<String>,
    /// `(processed, total)`
    pub files: Option<(u64, u64)>,
    pub timestamp: Option<String>,
}

/// Ten-cell bar, one filled cell per 10%.
pub fn progress_bar(percentage: f64) -> String {
    let filled = (percentage.clamp(0.0, 100.0) / 10.0).floor() as usize;
    format!("{}{}", "\u{2588}".repeat(filled), "\u{2591}".repeat(10 - filled))
}

pub fn work_in_progress(update: &ProgressUpdate) -> SlackMessage {
    let mut blocks = vec![Block::header("\u{1F504} Work in Progress")];

    let task = update.current_task.as_deref().unwrap_or("Working...");
    let task = if task.chars().count() > 200 {
        format!("{}...", task.chars().take(197).collect::<String>())
    } else {
        task.to_string()
    };
    blocks.push(Block::section(format!("*Current Task:*\n{}", task)));

    let mut fields = Vec::new();
    if let Some(id) = &update.session_id {
        fields.push(field("Session ID", id));
    }
    if let Some(pct) = update.progress_percentage {
        fields.push(field("Progress", format!("{} {}%", progress_bar(pct), pct)));
    }
    if let Some(eta) = update.estimated_completion.as_deref().filter(|e| !e.is_empty()) {
        fields.push(field("ETA", eta));
    }
    if let Some((processed, total)) = update.files {
        fields.push(field("Files", format!("{}/{}", processed, total)));
    }
    if !fields.is_empty() {
        blocks.push(Block::fields(fields));
    }

    let timestamp = update.timestamp.clone().unwrap_or_else(iso_now);
    blocks.push(Block::context(format!("Updated at {}", timestamp)));

    SlackMessage::new("Claude Code work in progress", blocks)
}

// ---------------------------------------------------------------------------
// Hook payloads
// ---------------------------------------------------------------------------

/// Identity shared by every hook payload.
#[derive(Debug, Clone)]
pub struct HookContext<'a> {
    pub session_id: &'a str,
    pub project_name: &'a str,
    pub now: DateTime<Local>,
}

impl HookContext<'_> {
    fn stamp(&self) -> String {
        self.now.format(HOOK_TIME_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Permission,
    Idle,
    Custom,
}

impl NotificationKind {
    pub fn emoji(self) -> &'static str {
        match self {
            NotificationKind::Permission => "\u{26A0}\u{FE0F}",
            NotificationKind::Idle => "\u{23F3}",
            NotificationKind::Custom => "\u{1F4E2}",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            NotificationKind::Permission => "Permission Required",
            NotificationKind::Idle => "Waiting for Input",
            NotificationKind::Custom => "Claude Code Notification",
        }
    }

    fn context_line(self) -> &'static str {
        match self {
            NotificationKind::Permission => "Claude needs approval to proceed",
            NotificationKind::Idle => "Session is waiting for your input",
            NotificationKind::Custom => "Notification from Claude Code",
        }
    }
}

pub fn classify_notification(message: &str) -> NotificationKind {
    let lower = message.to_lowercase();
    if lower.contains("permission") {
        NotificationKind::Permission
    } else if lower.contains("waiting") || lower.contains("idle") {
        NotificationKind::Idle
    } else {
        NotificationKind::Custom
    }
}

pub fn notification(ctx: &HookContext<'_>, message: &str, cwd: Option<&str>) -> SlackMessage {
    let kind = classify_notification(message);

    let mut blocks = vec![
        Block::section(format!("{} *{}*", kind.emoji(), kind.title())),
        Block::section(truncate(message, DEFAULT_MAX_LENGTH)),
    ];

    let mut fields = vec![
        field("Session", ctx.session_id),
        field("Project", ctx.project_name),
    ];
    if let Some(cwd) = cwd.filter(|c| !c.is_empty() && *c != ctx.project_name) {
        let shown = if cwd.chars().count() > 50 {
            Path::new(cwd)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(cwd)
        } else {
            cwd
        };
        fields.push(field("Directory", shown));
    }
    blocks.push(Block::fields(fields));

    blocks.push(Block::context(format!(
        "{} \u{2022} {}",
        kind.context_line(),
        ctx.stamp()
    )));

    let preview: String = message.chars().take(100).collect();
    SlackMessage::new(format!("Claude Code notification: {}", preview), blocks)
}

pub fn post_tool_use(
    ctx: &HookContext<'_>,
    tool_name: &str,
    description: &str,
    outcome: &ToolOutcome,
) -> SlackMessage {
    let emoji = if outcome.failed() { "\u{274C}" } else { "\u{1F527}" };
    let mut blocks = vec![Block::section(format!("{} *{}*", emoji, description))];

    let mut fields = vec![field("Session", ctx.session_id), field("Tool", tool_name)];
    if outcome.failed() {
        let error = outcome.error.as_deref().unwrap_or("Unknown error");
        fields.push(field("Error", truncate(error, 100)));
    }
    blocks.push(Block::fields(fields));

    blocks.push(Block::context(format!("Executed at {}", ctx.stamp())));

    SlackMessage::new(format!("Claude Code tool usage: {}", description), blocks)
}

/// Digest of recent tool calls. `records` includes the current call last.
pub fn aggregated_activity(ctx: &HookContext<'_>, records: &[ToolRecord]) -> SlackMessage {
    let recent = &records[records.len().saturating_sub(5)..];

    // Latest description per tool, in first-seen order.
    let mut summary: Vec<(&str, &str)> = Vec::new();
    for record in recent {
        match summary.iter_mut().find(|(name, _)| *name == record.tool_name) {
            Some(entry) => entry.1 = record.description.as_str(),
            None => summary.push((record.tool_name.as_str(), record.description.as_str())),
        }
    }

    let activity = if summary.len() == 1 {
        summary[0].1.to_string()
    } else {
        summary
            .iter()
            .map(|(_, desc)| format!("\u{2022} {}", desc))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut fields = vec![
        field("Session", ctx.session_id),
        field("Project", ctx.project_name),
    ];
    if records.len() > 1 {
        fields.push(field("Tools Used", format!("{} operations", records.len())));
    }

    let blocks = vec![
        Block::section("\u{1F504} *Recent Activity*"),
        Block::section(activity),
        Block::fields(fields),
        Block::context(format!("Updated at {}", ctx.stamp())),
    ];

    let current = records.last().map_or("", |r| r.description.as_str());
    SlackMessage::new(format!("Claude Code activity: {}", current), blocks)
}

pub fn session_summary(ctx: &HookContext<'_>, summary: &TranscriptSummary) -> SlackMessage {
    let tool_count = summary.tool_uses;
    let (emoji, status) = match tool_count {
        n if n >= 5 => ("\u{1F3AF}", "Productive Session Complete"),
        n if n >= 1 => ("\u{2705}", "Session Complete"),
        _ => ("\u{1F4A4}", "Session Complete (No Activity)"),
    };

    let mut fields = vec![
        field("Session ID", ctx.session_id),
        field("Project", ctx.project_name),
    ];
    if tool_count > 0 {
        fields.push(field("Tools Used", tool_count));
        fields.push(field("Files Modified", summary.modified_files.len()));
    }

    let mut activity = format!("*Summary:* {}", summary.activity().label());
    if !summary.unique_tools.is_empty() {
        activity.push_str(&format!(
            "\n*Tools:* {}",
            inline_list(&summary.unique_tools, 5)
        ));
    }
    if !summary.modified_files.is_empty() {
        activity.push_str(&format!(
            "\n*Files:* {}",
            inline_list(&summary.modified_files, 3)
        ));
    }

    let blocks = vec![
        Block::section(format!("{} *{}*", emoji, status)),
        Block::fields(fields),
        Block::section(activity),
        Block::context(format!("Completed at {}", ctx.stamp())),
    ];

    SlackMessage::new(
        format!("Claude Code session {} completed", ctx.session_id),
        blocks,
    )
}
