//! Stop hook: posts a summary when a session ends.

use std::ops::ControlFlow;
use std::path::Path;

use chrono::Local;
use tracing::info;

use super::{HookInput, HookOutcome, HookRuntime};
use crate::error::HookError;
use crate::format::{self, HookContext};
use crate::settings::HookKind;
use crate::transcript::summarize_transcript;

pub fn handle(input: &HookInput, runtime: &HookRuntime) -> Result<HookOutcome, HookError> {
    let session_id = input.require_session()?;
    input.require_event(HookKind::Stop)?;

    // A Stop hook that is already running must not trigger another round.
    if input.stop_hook_active {
        info!("skipping notification, stop hook already active");
        return Ok(HookOutcome::Skipped(
            "Skipping notification - stop hook already active".to_string(),
        ));
    }

    let effective = match runtime.active_config()? {
        ControlFlow::Continue(effective) => effective,
        ControlFlow::Break(outcome) => return Ok(outcome),
    };
    if !effective.config.allows(HookKind::Stop) {
        info!("session-complete notifications are turned off");
        return Ok(HookOutcome::Skipped(
            "Notification type disabled in settings".to_string(),
        ));
    }

    let transcript = input.transcript_path.as_deref().map(Path::new);
    info!(transcript = ?transcript, "summarising transcript");
    let summary = summarize_transcript(transcript);

    let ctx = HookContext {
        session_id,
        project_name: effective.config.project_name_or_default(),
        now: Local::now(),
    };
    info!(session_id, tools = summary.tool_uses, "sending session summary");
    let message = format::session_summary(&ctx, &summary);
    runtime.deliver(&effective, message, "Session complete notification sent")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stop_hook_active_skips_before_config() {
        let fixture = Fixture::new(None);
        // A broken config would be an error if it were read.
        fixture.write_config(json!({"version": "1.0", "active": true, "webhook_url": "bad"}));
        let input = HookInput::parse(
            r#"{"session_id": "s", "hook_event_name": "Stop", "stop_hook_active": true}"#,
        )
        .unwrap();
        assert!(matches!(
            handle(&input, &fixture.runtime).unwrap(),
            HookOutcome::Skipped(_)
        ));
    }

    #[test]
    fn test_wrong_event() {
        let fixture = Fixture::new(None);
        let input =
            HookInput::parse(r#"{"session_id": "s", "hook_event_name": "Notification"}"#).unwrap();
        assert!(matches!(
            handle(&input, &fixture.runtime),
            Err(HookError::WrongEvent(_))
        ));
    }

    #[test]
    fn test_sends_summary_for_transcript() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex("Claude Code session s1 completed".to_string()),
                mockito::Matcher::Regex("Brief session".to_string()),
                mockito::Matcher::Regex("main.rs".to_string()),
            ]))
            .with_status(200)
            .expect(1)
            .create();

        let fixture = Fixture::new(Some(server.url()));
        fixture.write_active_config();

        let transcript = fixture.dir.path().join("transcript.jsonl");
        std::fs::write(
            &transcript,
            json!({
                "type": "assistant",
                "message": {"content": [
                    {"type": "tool_use", "name": "Write", "input": {"file_path": "/p/main.rs"}}
                ]}
            })
            .to_string(),
        )
        .unwrap();

        let input = HookInput::parse(
            &json!({
                "session_id": "s1",
                "hook_event_name": "Stop",
                "transcript_path": transcript,
            })
            .to_string(),
        )
        .unwrap();

        let outcome = handle(&input, &fixture.runtime).unwrap();
        mock.assert();
        assert_eq!(outcome, HookOutcome::Sent("Session complete notification sent"));
    }
}
