//! `/user:slack:setup`: store the webhook and register the hooks.

use std::io::{self, Write};

use tracing::info;

use super::{SetupArgs, FAILURE, SETUP_USAGE, SUCCESS};
use crate::config::{Scope, SlackConfig, Workspace, CONFIG_VERSION};
use crate::error::{Result, ValidationError};
use crate::settings::{all_hook_filenames, register_hooks};
use crate::webhook::mask_webhook_url;

pub fn run(workspace: &Workspace, args: &[String], out: &mut dyn Write) -> io::Result<i32> {
    let parsed = match SetupArgs::parse(args) {
        Ok(parsed) => parsed,
        Err(ValidationError::InvalidWebhookUrl) => {
            writeln!(out, "\u{274C} Error: Invalid Slack webhook URL format.")?;
            writeln!(
                out,
                "Expected format: https://hooks.slack.com/services/T.../B.../..."
            )?;
            return Ok(FAILURE);
        }
        Err(e) => {
            writeln!(out, "\u{274C} Error: {}.", e)?;
            writeln!(out, "{}", SETUP_USAGE)?;
            return Ok(FAILURE);
        }
    };

    if let Err(e) = configure(workspace, &parsed) {
        writeln!(out, "\u{274C} Error saving configuration: {}", e)?;
        return Ok(FAILURE);
    }

    writeln!(out, "\u{2705} Slack integration configured successfully!")?;
    writeln!(out, "Webhook URL: {}", mask_webhook_url(&parsed.webhook_url))?;
    if let Some(channel) = &parsed.default_channel {
        writeln!(out, "Default channel: {}", channel)?;
    }
    if let Some(project) = &parsed.project_name {
        writeln!(out, "Project name: {}", project)?;
    }
    Ok(SUCCESS)
}

/// Merges the arguments into the project config and registers all hooks.
fn configure(workspace: &Workspace, args: &SetupArgs) -> Result<()> {
    let config_path = workspace.config_path(Scope::Project);
    let mut config = SlackConfig::load(&config_path)?.unwrap_or_default();

    config.webhook_url = args.webhook_url.clone();
    if let Some(channel) = &args.default_channel {
        config.default_channel = Some(channel.clone());
    }
    if let Some(project) = &args.project_name {
        config.project_name = Some(project.clone());
    }
    config.version = Some(CONFIG_VERSION.to_string());
    config.active = true;
    config.save(&config_path)?;
    info!(path = %config_path.display(), "saved Slack configuration");

    let added = register_hooks(
        &all_hook_filenames(),
        &workspace.settings_path(Scope::Project),
    )?;
    info!(added = added.len(), "registered Slack hooks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::load_document;
    use serde_json::json;

    fn args(raw: &str) -> Vec<String> {
        super::super::split_arguments(raw)
    }

    #[test]
    fn test_setup_writes_config_and_settings() {
        let (_dir, ws) = workspace();
        let mut out = Vec::new();

        let code = run(&ws, &args(&format!("{} #alerts my-app", URL)), &mut out).unwrap();
        assert_eq!(code, SUCCESS);

        let text = output(out);
        assert!(text.contains("configured successfully"));
        assert!(text.contains("https://hooks.slack.com/services/T00000000/B00000000/..."));
        assert!(!text.contains("XXXXXXXX"));
        assert!(text.contains("Default channel: #alerts"));
        assert!(text.contains("Project name: my-app"));

        let config = SlackConfig::load(&ws.config_path(Scope::Project))
            .unwrap()
            .unwrap();
        assert!(config.active);
        assert_eq!(config.version.as_deref(), Some("1.0"));
        assert_eq!(config.webhook_url, URL);

        let settings = load_document(&ws.settings_path(Scope::Project)).unwrap();
        for key in ["notification", "posttooluse", "stop"] {
            assert_eq!(settings["hooks"][key].as_array().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_setup_preserves_existing_settings() {
        let (_dir, ws) = workspace();
        write_config(
            &ws,
            json!({"version": "1.0", "active": false, "webhook_url": URL, "custom": {"keep": true}}),
        );

        let mut out = Vec::new();
        assert_eq!(run(&ws, &args(URL), &mut out).unwrap(), SUCCESS);

        let doc = load_document(&ws.config_path(Scope::Project)).unwrap();
        assert_eq!(doc["custom"], json!({"keep": true}));
        assert_eq!(doc["active"], json!(true));
    }

    #[test]
    fn test_setup_rejects_invalid_url_without_writing() {
        let (_dir, ws) = workspace();
        let mut out = Vec::new();

        let code = run(&ws, &args("https://example.com/webhook"), &mut out).unwrap();
        assert_eq!(code, FAILURE);
        assert!(output(out).contains("Invalid Slack webhook URL format"));
        assert!(!ws.config_path(Scope::Project).exists());
        assert!(!ws.settings_path(Scope::Project).exists());
    }

    #[test]
    fn test_setup_usage_errors() {
        let (_dir, ws) = workspace();

        let mut out = Vec::new();
        assert_eq!(run(&ws, &[], &mut out).unwrap(), FAILURE);
        let text = output(out);
        assert!(text.contains("Webhook URL is required"));
        assert!(text.contains(SETUP_USAGE));

        let mut out = Vec::new();
        let code = run(&ws, &args(&format!("{} a b c", URL)), &mut out).unwrap();
        assert_eq!(code, FAILURE);
        assert!(output(out).contains("Too many arguments"));
    }
}
