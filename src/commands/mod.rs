//! Handlers behind the `/user:slack:*` slash commands.
//!
//! Each handler writes its user-facing text to `out` and returns the exit
//! code the command should end with. Arguments are parsed up front into
//! plain structs so handlers never see raw strings.

pub mod remove;
pub mod setup;
pub mod start;
pub mod status;
pub mod stop;

use crate::error::ValidationError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;

pub const SETUP_USAGE: &str = "Usage: /user:slack:setup <webhook_url> [channel] [project_name]";

/// Splits the raw `ARGUMENTS` string the way the slash commands receive it.
pub fn split_arguments(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// `setup <webhook_url> [channel] [project_name]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupArgs {
    pub webhook_url: String,
    pub default_channel: Option<String>,
    pub project_name: Option<String>,
}

impl SetupArgs {
    pub fn parse(args: &[String]) -> Result<Self, ValidationError> {
        match args {
            [] => Err(ValidationError::MissingArgument("Webhook URL")),
            [_, _, _, _, ..] => Err(ValidationError::TooManyArguments),
            [url, rest @ ..] => {
                crate::webhook::validate_webhook_url(url)?;
                Ok(Self {
                    webhook_url: url.clone(),
                    default_channel: rest.first().cloned(),
                    project_name: rest.get(1).cloned(),
                })
            }
        }
    }
}

/// `start [key=value ...]`; only `thread_ts` is understood.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartArgs {
    pub thread_ts: Option<String>,
}

impl StartArgs {
    pub fn parse(args: &[String]) -> Self {
        let thread_ts = args
            .iter()
            .filter_map(|arg| arg.split_once('='))
            .filter(|(key, _)| *key == "thread_ts")
            .map(|(_, value)| value.to_string())
            .last();
        Self { thread_ts }
    }
}

/// `remove [--force|-f]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveArgs {
    pub force: bool,
}

impl RemoveArgs {
    pub fn parse(args: &[String]) -> Self {
        Self {
            force: args.iter().any(|a| a == "--force" || a == "-f"),
        }
    }
}
