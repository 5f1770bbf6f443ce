//! `/user:slack:start`: turn notifications on, optionally into a thread.

use std::io::{self, Write};

use super::{StartArgs, FAILURE, SUCCESS};
use crate::config::{Scope, SlackConfig, Workspace};

pub fn run(workspace: &Workspace, args: &StartArgs, out: &mut dyn Write) -> io::Result<i32> {
    let config_path = workspace.config_path(Scope::Project);
    let mut config = match SlackConfig::load(&config_path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            writeln!(out, "\u{274C} Slack integration is not configured.")?;
            writeln!(out, "Please run '/user:slack:setup <webhook_url>' first.")?;
            return Ok(FAILURE);
        }
        Err(e) => {
            writeln!(out, "\u{274C} Error loading configuration: {}", e)?;
            return Ok(FAILURE);
        }
    };

    if !config.is_configured() {
        writeln!(out, "\u{274C} Slack webhook URL is not configured.")?;
        writeln!(out, "Please run '/user:slack:setup <webhook_url>' first.")?;
        return Ok(FAILURE);
    }

    let was_active = config.active;
    config.active = true;
    if let Some(thread_ts) = &args.thread_ts {
        config.thread_ts = Some(thread_ts.clone());
    }

    if let Err(e) = config.save(&config_path) {
        writeln!(out, "\u{274C} Error saving configuration: {}", e)?;
        return Ok(FAILURE);
    }

    if was_active {
        writeln!(out, "\u{2139}\u{FE0F} Slack notifications are already enabled.")?;
    } else {
        writeln!(out, "\u{2705} Slack notifications enabled!")?;
        writeln!(out, "Notifications will be sent to the configured webhook.")?;
    }
    if let Some(thread_ts) = &config.thread_ts {
        writeln!(
            out,
            "Thread mode enabled: replies will be posted to thread {}",
            thread_ts
        )?;
    }
    Ok(SUCCESS)
}
