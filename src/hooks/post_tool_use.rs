//! PostToolUse hook: reports tool activity, batching bursts of calls.

use std::ops::ControlFlow;

use chrono::{Local, Utc};
use tracing::{debug, info, warn};

use super::{HookInput, HookOutcome, HookRuntime};
use crate::aggregation::{self, AggregationState, STALE_AFTER};
use crate::error::HookError;
use crate::format::{self, HookContext};
use crate::settings::HookKind;
use crate::tool_use::{describe_tool, ToolOutcome};

pub fn handle(input: &HookInput, runtime: &HookRuntime) -> Result<HookOutcome, HookError> {
    match aggregation::cleanup_stale(&runtime.state_dir, STALE_AFTER) {
        Ok(0) => {}
        Ok(n) => debug!(removed = n, "pruned aggregation state"),
        Err(e) => warn!(error = %e, "failed to prune aggregation state"),
    }

    let session_id = input.require_session()?;
    let tool_name = input
        .tool_name
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(HookError::MissingField("tool_name"))?;
    input.require_event(HookKind::PostToolUse)?;

    let effective = match runtime.active_config()? {
        ControlFlow::Continue(effective) => effective,
        ControlFlow::Break(outcome) => return Ok(outcome),
    };
    let config = &effective.config;
    let filters = config.tool_filters();

    if !filters.allows(tool_name) {
        info!(tool_name, "tool not in notification filter");
        return Ok(HookOutcome::Skipped(format!(
            "Tool {} not in notification filter",
            tool_name
        )));
    }

    let outcome = ToolOutcome::from_response(&input.tool_response);
    let enabled = if outcome.failed() {
        config.allows_errors() || config.allows(HookKind::PostToolUse)
    } else {
        config.allows(HookKind::PostToolUse)
    };
    if !enabled {
        info!(tool_name, "work-in-progress notifications are turned off");
        return Ok(HookOutcome::Skipped(
            "Notification type disabled in settings".to_string(),
        ));
    }

    let description = describe_tool(tool_name, &input.tool_input, &input.tool_response);
    info!(tool_name, %description, "generated tool description");

    let now = Utc::now();
    let previous = AggregationState::load(&runtime.state_dir, session_id);
    let aggregate = previous
        .as_ref()
        .is_some_and(|state| state.should_aggregate(filters.aggregate_timeout_secs(), now));
    let over_limit = match (filters.max_notifications_per_session, &previous) {
        (Some(max), Some(state)) => state.notification_count >= max,
        _ => false,
    };

    let mut state = previous.unwrap_or_else(|| AggregationState::new(session_id, now));
    state.record(tool_name, &description, now);
    if let Err(e) = state.save(&runtime.state_dir) {
        warn!(error = %e, "failed to save aggregation state");
    }

    if over_limit {
        info!(session_id, "notification limit reached for session");
        return Ok(HookOutcome::Skipped(
            "Notification limit reached for this session".to_string(),
        ));
    }

    let ctx = HookContext {
        session_id,
        project_name: config.project_name_or_default(),
        now: Local::now(),
    };
    let message = if aggregate {
        info!(session_id, "sending aggregated notification");
        format::aggregated_activity(&ctx, &state.tools)
    } else {
        info!(tool_name, "sending individual notification");
        format::post_tool_use(&ctx, tool_name, &description, &outcome)
    };

    runtime.deliver(&effective, message, "PostToolUse notification sent")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use serde_json::json;

    fn write_input(session: &str) -> HookInput {
        HookInput::parse(
            &json!({
                "session_id": session,
                "hook_event_name": "PostToolUse",
                "tool_name": "Write",
                "tool_input": {"file_path": "/p/main.rs", "content": "fn main() {}"},
                "tool_response": {"success": true}
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_requires_tool_name() {
        let fixture = Fixture::new(None);
        let input = HookInput::parse(
            r#"{"session_id": "s", "hook_event_name": "PostToolUse"}"#,
        )
        .unwrap();
        assert!(matches!(
            handle(&input, &fixture.runtime),
            Err(HookError::MissingField("tool_name"))
        ));
    }

    #[test]
    fn test_filtered_tool_is_skipped() {
        let fixture = Fixture::new(None);
        fixture.write_active_config();
        let input = HookInput::parse(
            r#"{"session_id": "s", "hook_event_name": "PostToolUse", "tool_name": "Read"}"#,
        )
        .unwrap();
        let outcome = handle(&input, &fixture.runtime).unwrap();
        assert_eq!(
            outcome,
            HookOutcome::Skipped("Tool Read not in notification filter".to_string())
        );
        assert!(AggregationState::load(&fixture.runtime.state_dir, "s").is_none());
    }

    #[test]
    fn test_first_call_is_individual_then_aggregated() {
        let mut server = mockito::Server::new();
        let individual = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("Claude Code tool usage".to_string()))
            .with_status(200)
            .expect(1)
            .create();
        let aggregated = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("Recent Activity".to_string()))
            .with_status(200)
            .expect(1)
            .create();

        let fixture = Fixture::new(Some(server.url()));
        fixture.write_active_config();

        handle(&write_input("agg"), &fixture.runtime).unwrap();
        handle(&write_input("agg"), &fixture.runtime).unwrap();

        individual.assert();
        aggregated.assert();
        let state = AggregationState::load(&fixture.runtime.state_dir, "agg").unwrap();
        assert_eq!(state.tools.len(), 2);
        assert_eq!(state.notification_count, 2);
    }

    #[test]
    fn test_zero_timeout_never_aggregates() {
        let mut server = mockito::Server::new();
        let individual = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("Claude Code tool usage".to_string()))
            .with_status(200)
            .expect(2)
            .create();

        let fixture = Fixture::new(Some(server.url()));
        fixture.write_config(json!({
            "version": "1.0",
            "active": true,
            "webhook_url": URL,
            "tool_filters": {"aggregate_timeout": 0}
        }));

        handle(&write_input("s"), &fixture.runtime).unwrap();
        handle(&write_input("s"), &fixture.runtime).unwrap();
        individual.assert();
    }

    #[test]
    fn test_session_limit_suppresses() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/").with_status(200).expect(1).create();

        let fixture = Fixture::new(Some(server.url()));
        fixture.write_config(json!({
            "version": "1.0",
            "active": true,
            "webhook_url": URL,
            "tool_filters": {"max_notifications_per_session": 1}
        }));

        assert!(matches!(
            handle(&write_input("lim"), &fixture.runtime).unwrap(),
            HookOutcome::Sent(_)
        ));
        assert!(matches!(
            handle(&write_input("lim"), &fixture.runtime).unwrap(),
            HookOutcome::Skipped(_)
        ));
        mock.assert();
    }

    #[test]
    fn test_failed_tool_still_reported_when_progress_off() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("Failed".to_string()))
            .with_status(200)
            .expect(1)
            .create();

        let fixture = Fixture::new(Some(server.url()));
        fixture.write_config(json!({
            "version": "1.0",
            "active": true,
            "webhook_url": URL,
            "notification_settings": {"work_in_progress": false}
        }));

        let ok = write_input("s");
        assert!(matches!(
            handle(&ok, &fixture.runtime).unwrap(),
            HookOutcome::Skipped(_)
        ));

        let failed = HookInput::parse(
            &json!({
                "session_id": "s",
                "hook_event_name": "PostToolUse",
                "tool_name": "Bash",
                "tool_input": {"command": "false"},
                "tool_response": {"exit_code": 1, "error": "exit status 1"}
            })
            .to_string(),
        )
        .unwrap();
        assert!(matches!(
            handle(&failed, &fixture.runtime).unwrap(),
            HookOutcome::Sent(_)
        ));
        mock.assert();
    }
}
