//! `/user:slack:status`: print the effective configuration.

use std::io::{self, Write};

use super::{SETUP_USAGE, SUCCESS};
use crate::config::{Installation, NotificationSettings, Statistics, Workspace};
use crate::webhook::mask_webhook_url;

/// `session_complete` -> `Session Complete`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_notification_settings(out: &mut dyn Write, settings: &NotificationSettings) -> io::Result<()> {
    writeln!(out, "\u{1F514} Notification Settings")?;
    for (key, enabled) in settings.entries() {
        let state = if enabled {
            "\u{2705} Enabled"
        } else {
            "\u{274C} Disabled"
        };
        writeln!(out, "{}: {}", title_case(&key), state)?;
    }
    Ok(())
}

fn write_statistics(out: &mut dyn Write, stats: &Statistics) -> io::Result<()> {
    writeln!(out, "\u{1F4C8} Statistics")?;
    if stats.is_empty() {
        writeln!(out, "No statistics available")?;
        return Ok(());
    }
    if let Some(total) = stats.total_notifications_sent {
        writeln!(out, "Total Notifications Sent: {}", total)?;
    }
    if let Some(today) = stats.notifications_today {
        writeln!(out, "Notifications Today: {}", today)?;
    }
    if let Some(last) = &stats.last_notification_time {
        writeln!(out, "Last Notification: {}", last)?;
    }
    Ok(())
}

/// Always succeeds; problems are reported in the output.
pub fn run(workspace: &Workspace, out: &mut dyn Write) -> io::Result<i32> {
    writeln!(out, "\u{1F4CA} Slack Integration Status")?;
    writeln!(out, "{}", "=".repeat(50))?;

    let effective = match workspace.load_effective() {
        Ok(effective) => effective,
        Err(e) => {
            writeln!(out, "\u{274C} Error loading configuration: {}", e)?;
            return Ok(SUCCESS);
        }
    };

    let Some(config) = effective
        .map(|e| e.config)
        .filter(|config| config.is_configured())
    else {
        writeln!(out, "Status: \u{274C} Not Configured")?;
        writeln!(out)?;
        writeln!(out, "To set up Slack integration:")?;
        writeln!(out, "  {}", SETUP_USAGE.trim_start_matches("Usage: "))?;
        writeln!(out)?;
        writeln!(out, "Example:")?;
        writeln!(
            out,
            "  /user:slack:setup https://hooks.slack.com/services/T.../B.../... #general my-project"
        )?;
        return Ok(SUCCESS);
    };

    if config.active {
        writeln!(out, "Status: \u{2705} Active")?;
    } else {
        writeln!(out, "Status: \u{23F8}\u{FE0F} Configured but Inactive")?;
        writeln!(out)?;
        writeln!(out, "To enable notifications:")?;
        writeln!(out, "  /user:slack:start")?;
        writeln!(out)?;
    }

    writeln!(out, "Webhook URL: {}", mask_webhook_url(&config.webhook_url))?;
    if let Some(project) = &config.project_name {
        writeln!(out, "Project: {}", project)?;
    }
    if let Some(channel) = &config.default_channel {
        writeln!(out, "Default Channel: {}", channel)?;
    }

    match workspace.installation() {
        Installation::Project => writeln!(out, "Installation Type: Project-level")?,
        Installation::User => writeln!(out, "Installation Type: User-level")?,
        Installation::None => {}
    }

    if let Some(thread_ts) = &config.thread_ts {
        writeln!(out, "Thread Mode: \u{2705} Enabled ({})", thread_ts)?;
    }
    writeln!(out)?;

    if let Some(settings) = config
        .notification_settings
        .as_ref()
        .filter(|s| !s.entries().is_empty())
    {
        write_notification_settings(out, settings)?;
        writeln!(out)?;
    }

    if let Some(stats) = &config.statistics {
        write_statistics(out, stats)?;
    }

    Ok(SUCCESS)
}
