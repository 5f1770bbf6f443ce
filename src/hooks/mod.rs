//! Claude Code event hooks.
//!
//! Each hook binary reads one JSON document from stdin, decides whether a
//! Slack message is warranted and sends it. Exit code 0 means "nothing to
//! do or sent"; 1 means the input, config or delivery was bad.

pub mod notification;
pub mod post_tool_use;
pub mod stop;

use std::io::{self, Read};
use std::ops::ControlFlow;
use std::path::PathBuf;

use chrono::Local;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::aggregation;
use crate::blocks::SlackMessage;
use crate::config::{record_delivery, EffectiveConfig, SlackConfig, Workspace};
use crate::error::HookError;
use crate::logging;
use crate::sender::WebhookSender;
use crate::settings::HookKind;

/// Input JSON schema from Claude Code hooks.
///
/// Only the fields the Slack hooks read are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub hook_event_name: String,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    /// Only present for Notification
    #[serde(default)]
    pub message: Option<String>,
    /// Only present for PostToolUse
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub tool_response: Value,
    /// Only present for Stop
    #[serde(default)]
    pub stop_hook_active: bool,
}

impl HookInput {
    pub fn parse(raw: &str) -> Result<Self, HookError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn require_session(&self) -> Result<&str, HookError> {
        non_empty(&self.session_id).ok_or(HookError::MissingField("session_id"))
    }

    pub fn require_event(&self, kind: HookKind) -> Result<(), HookError> {
        if self.hook_event_name == kind.event_name() {
            Ok(())
        } else {
            Err(HookError::WrongEvent(self.hook_event_name.clone()))
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// How a hook invocation that didn't fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Sent(&'static str),
    Skipped(String),
}

impl HookOutcome {
    pub fn message(&self) -> &str {
        match self {
            HookOutcome::Sent(msg) => msg,
            HookOutcome::Skipped(reason) => reason,
        }
    }
}

/// Everything a hook needs from its surroundings.
#[derive(Debug)]
pub struct HookRuntime {
    pub workspace: Workspace,
    pub sender: WebhookSender,
    pub state_dir: PathBuf,
}

impl HookRuntime {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            workspace: Workspace::from_env()?,
            sender: WebhookSender::new(),
            state_dir: aggregation::state_dir(),
        })
    }

    /// Loads the effective config and applies the gates every hook shares.
    ///
    /// `Break` means the hook should stop quietly with that outcome.
    pub(crate) fn active_config(
        &self,
    ) -> Result<ControlFlow<HookOutcome, EffectiveConfig>, HookError> {
        let Some(effective) = self.workspace.load_effective()? else {
            info!("Slack integration not configured");
            return Ok(ControlFlow::Break(HookOutcome::Skipped(
                "Slack integration not configured".to_string(),
            )));
        };

        if !effective.config.active {
            info!("Slack integration disabled");
            return Ok(ControlFlow::Break(HookOutcome::Skipped(
                "Slack integration disabled".to_string(),
            )));
        }

        effective.config.validate()?;
        Ok(ControlFlow::Continue(effective))
    }

    /// Sends `message` and records the delivery in the config's statistics.
    pub(crate) fn deliver(
        &self,
        effective: &EffectiveConfig,
        message: SlackMessage,
        sent: &'static str,
    ) -> Result<HookOutcome, HookError> {
        let message = message.in_thread(thread_of(&effective.config));
        let outcome = self.sender.send(&effective.config.webhook_url, &message);

        if !outcome.success {
            let reason = outcome.error.unwrap_or_else(|| "Unknown error".to_string());
            return Err(HookError::Network(reason));
        }

        info!(status = outcome.status_code, "{}", sent);
        if let Err(e) = record_delivery(&effective.source, Local::now()) {
            warn!(error = %e, "could not update notification statistics");
        }
        Ok(HookOutcome::Sent(sent))
    }
}

fn thread_of(config: &SlackConfig) -> Option<String> {
    config.thread_ts.clone().filter(|ts| !ts.is_empty())
}

/// Runs hook `kind` against a raw stdin payload.
pub fn dispatch(kind: HookKind, raw: &str, runtime: &HookRuntime) -> Result<HookOutcome, HookError> {
    let input = HookInput::parse(raw)?;
    match kind {
        HookKind::Notification => notification::handle(&input, runtime),
        HookKind::PostToolUse => post_tool_use::handle(&input, runtime),
        HookKind::Stop => stop::handle(&input, runtime),
    }
}

/// Entry point shared by the hook binaries. Returns the process exit code.
pub fn run_main(kind: HookKind) -> i32 {
    let _guard = logging::init(kind.executable());

    let mut raw = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut raw) {
        error!(error = %e, "failed to read stdin");
        return 1;
    }

    let runtime = match HookRuntime::from_env() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to resolve workspace");
            return 1;
        }
    };

    match dispatch(kind, &raw, &runtime) {
        Ok(outcome) => {
            println!("{}", outcome.message());
            0
        }
        Err(e) => {
            error!(hook = kind.executable(), "{}", e);
            1
        }
    }
}
