//! claude-slack: front end for the `/user:slack:*` slash commands.
//!
//! Usage: claude-slack <setup|start|stop|status|remove> [ARGS...]
//!
//! When no arguments follow the subcommand they are taken from the
//! `ARGUMENTS` environment variable, which is how Claude Code passes them.

use std::io;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use claude_slack::commands::{self, RemoveArgs, StartArgs};
use claude_slack::config::Workspace;
use claude_slack::logging;

/// Configure and control Slack notifications for Claude Code.
#[derive(Parser)]
#[command(name = "claude-slack", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Raw argument string used when a subcommand gets no arguments
    #[arg(long, env = "ARGUMENTS", hide_env_values = true, global = true, hide = true)]
    arguments: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Store a webhook URL and register the hooks: <webhook_url> [channel] [project_name]
    Setup {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Enable notifications, optionally with thread_ts=<ts>
    Start {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Disable notifications
    Stop,
    /// Show the current configuration
    Status,
    /// Remove the configuration and hooks (--force skips confirmation)
    Remove {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

/// Positional arguments, falling back to the `ARGUMENTS` string.
fn effective_args(args: Vec<String>, fallback: Option<&str>) -> Vec<String> {
    if args.is_empty() {
        fallback.map(commands::split_arguments).unwrap_or_default()
    } else {
        args
    }
}

fn run(cli: Cli) -> Result<i32> {
    let workspace = Workspace::from_env().context("Failed to resolve workspace")?;
    let fallback = cli.arguments.as_deref();
    let mut stdout = io::stdout().lock();

    let code = match cli.command {
        Command::Setup { args } => {
            commands::setup::run(&workspace, &effective_args(args, fallback), &mut stdout)?
        }
        Command::Start { args } => {
            let args = StartArgs::parse(&effective_args(args, fallback));
            commands::start::run(&workspace, &args, &mut stdout)?
        }
        Command::Stop => commands::stop::run(&workspace, &mut stdout)?,
        Command::Status => commands::status::run(&workspace, &mut stdout)?,
        Command::Remove { args } => {
            let args = RemoveArgs::parse(&effective_args(args, fallback));
            let mut stdin = io::stdin().lock();
            commands::remove::run(&workspace, &args, &mut stdin, &mut stdout)?
        }
    };
    Ok(code)
}

fn main() {
    let cli = Cli::parse();

    let code = {
        let _guard = logging::init("claude-slack");
        match run(cli) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("\u{274C} Error: {:#}", e);
                commands::FAILURE
            }
        }
    };

    process::exit(code);
}
