//! Notification hook: forwards Claude Code's attention requests to Slack.

use std::ops::ControlFlow;

use chrono::Local;
use tracing::info;

use super::{HookInput, HookOutcome, HookRuntime};
use crate::error::HookError;
use crate::format::{self, HookContext};
use crate::settings::HookKind;

pub fn handle(input: &HookInput, runtime: &HookRuntime) -> Result<HookOutcome, HookError> {
    let session_id = input.require_session()?;
    let message = input
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or(HookError::MissingField("message"))?;
    input.require_event(HookKind::Notification)?;

    let effective = match runtime.active_config()? {
        ControlFlow::Continue(effective) => effective,
        ControlFlow::Break(outcome) => return Ok(outcome),
    };
    if !effective.config.allows(HookKind::Notification) {
        info!("input-needed notifications are turned off");
        return Ok(HookOutcome::Skipped(
            "Notification type disabled in settings".to_string(),
        ));
    }

    let ctx = HookContext {
        session_id,
        project_name: effective.config.project_name_or_default(),
        now: Local::now(),
    };
    let kind = format::classify_notification(message);
    info!(session_id, ?kind, "sending notification");

    let slack_message = format::notification(&ctx, message, input.cwd.as_deref());
    runtime.deliver(&effective, slack_message, "Notification sent to Slack")
}
