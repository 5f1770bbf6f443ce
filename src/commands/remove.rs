//! `/user:slack:remove`: back up and delete the config, unregister the hooks.

use std::fs;
use std::io::{self, BufRead, Write};

use tracing::{info, warn};

use super::{RemoveArgs, FAILURE, SUCCESS};
use crate::config::{backup_config, Scope, SlackConfig, Workspace};
use crate::error::ConfigError;
use crate::settings::{all_hook_filenames, unregister_hooks};

fn confirm(input: &mut dyn BufRead, out: &mut dyn Write) -> io::Result<bool> {
    writeln!(out, "\u{26A0}\u{FE0F}  This will completely remove Slack integration:")?;
    writeln!(out, "   \u{2022} Delete configuration file")?;
    writeln!(out, "   \u{2022} Remove hooks from settings.json")?;
    writeln!(out, "   \u{2022} Disable all notifications")?;
    writeln!(out)?;
    write!(out, "Are you sure you want to continue? (y/N): ")?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub fn run(
    workspace: &Workspace,
    args: &RemoveArgs,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> io::Result<i32> {
    let config_path = workspace.config_path(Scope::Project);
    if !config_path.exists() {
        writeln!(out, "\u{2139}\u{FE0F}  Slack integration is not installed.")?;
        writeln!(out, "Nothing to remove.")?;
        return Ok(SUCCESS);
    }

    if let Err(ConfigError::Malformed { .. }) = SlackConfig::load(&config_path) {
        writeln!(
            out,
            "\u{26A0}\u{FE0F}  Configuration file appears corrupted, but will be removed."
        )?;
    }

    if !args.force && !confirm(input, out)? {
        writeln!(out, "\u{274C} Removal cancelled.")?;
        return Ok(SUCCESS);
    }

    let backup_path = match backup_config(&config_path) {
        Ok(path) => path,
        Err(e) => {
            writeln!(out, "\u{274C} Error creating backup: {}", e)?;
            return Ok(FAILURE);
        }
    };
    if let Some(path) = &backup_path {
        info!(backup = %path.display(), "backed up Slack configuration");
        writeln!(out, "\u{1F4C1} Configuration backed up to: {}", path.display())?;
    }

    let hooks_removed =
        match unregister_hooks(&all_hook_filenames(), &workspace.settings_path(Scope::Project)) {
            Ok(true) => {
                writeln!(out, "\u{1F517} Slack hooks removed from settings.json")?;
                true
            }
            Ok(false) => {
                writeln!(out, "\u{2139}\u{FE0F}  No Slack hooks found in settings.json")?;
                false
            }
            Err(e) => {
                warn!(error = %e, "could not unregister hooks");
                writeln!(
                    out,
                    "\u{26A0}\u{FE0F}  Warning: Could not remove hooks from settings.json: {}",
                    e
                )?;
                false
            }
        };

    if let Err(e) = fs::remove_file(&config_path) {
        writeln!(out, "\u{274C} Error deleting configuration file: {}", e)?;
        return Ok(FAILURE);
    }
    writeln!(out, "\u{1F5D1}\u{FE0F}  Configuration file deleted")?;

    writeln!(out, "\u{2705} Slack integration completely removed!")?;
    writeln!(out)?;
    writeln!(out, "Summary of changes:")?;
    if let Some(path) = &backup_path {
        writeln!(out, "  \u{2022} Configuration backed up to: {}", path.display())?;
    }
    writeln!(out, "  \u{2022} Configuration file deleted: {}", config_path.display())?;
    if hooks_removed {
        writeln!(out, "  \u{2022} Slack hooks removed from settings.json")?;
    }
    writeln!(out, "  \u{2022} All notifications disabled")?;
    Ok(SUCCESS)
}
