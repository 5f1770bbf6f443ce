//! `/user:slack:stop`: turn notifications off and leave thread mode.

use std::io::{self, Write};

use super::{FAILURE, SUCCESS};
use crate::config::{Scope, SlackConfig, Workspace};

pub fn run(workspace: &Workspace, out: &mut dyn Write) -> io::Result<i32> {
    let config_path = workspace.config_path(Scope::Project);
    let mut config = match SlackConfig::load(&config_path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            writeln!(out, "\u{274C} Slack integration is not configured.")?;
            writeln!(out, "Nothing to disable.")?;
            return Ok(FAILURE);
        }
        Err(e) => {
            writeln!(out, "\u{274C} Error loading configuration: {}", e)?;
            return Ok(FAILURE);
        }
    };

    let was_inactive = !config.active;
    config.active = false;
    config.thread_ts = None;

    if let Err(e) = config.save(&config_path) {
        writeln!(out, "\u{274C} Error saving configuration: {}", e)?;
        return Ok(FAILURE);
    }

    if was_inactive {
        writeln!(out, "\u{2139}\u{FE0F} Slack notifications are already disabled.")?;
    } else {
        writeln!(out, "\u{1F507} Slack notifications disabled.")?;
        writeln!(out, "You can re-enable them with '/user:slack:start'.")?;
    }
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::load_document;
    use serde_json::json;

    #[test]
    fn test_stop_not_configured() {
        let (_dir, ws) = workspace();
        let mut out = Vec::new();
        assert_eq!(run(&ws, &mut out).unwrap(), FAILURE);
        assert!(output(out).contains("Nothing to disable"));
    }

    #[test]
    fn test_stop_disables_and_clears_thread() {
        let (_dir, ws) = workspace();
        write_config(
            &ws,
            json!({"version": "1.0", "active": true, "webhook_url": URL, "thread_ts": "1.2"}),
        );

        let mut out = Vec::new();
        assert_eq!(run(&ws, &mut out).unwrap(), SUCCESS);
        assert!(output(out).contains("Slack notifications disabled."));

        let doc = load_document(&ws.config_path(Scope::Project)).unwrap();
        assert_eq!(doc["active"], json!(false));
        assert!(!doc.contains_key("thread_ts"));
        assert_eq!(doc["webhook_url"], json!(URL));
    }

    #[test]
    fn test_stop_already_disabled() {
        let (_dir, ws) = workspace();
        write_config(&ws, json!({"version": "1.0", "active": false, "webhook_url": URL}));
        let mut out = Vec::new();
        assert_eq!(run(&ws, &mut out).unwrap(), SUCCESS);
        assert!(output(out).contains("already disabled"));
    }
}
