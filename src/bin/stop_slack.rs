//! stop-slack: Claude Code Stop hook.
//!
//! Reads the hook payload from stdin and posts to the configured Slack webhook.

use claude_slack::hooks;
use claude_slack::settings::HookKind;

fn main() {
    std::process::exit(hooks::run_main(HookKind::Stop));
}
