pub mod aggregation;
pub mod blocks;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod hooks;
pub mod logging;
pub mod sender;
pub mod settings;
pub mod tool_use;
pub mod transcript;
pub mod webhook;

pub use blocks::{truncate_message_content, validate_block_kit, Block, SlackMessage};
pub use config::{
    backup_config, load_document, merge_configs, migrate_config, save_document,
    validate_document, SlackConfig, Workspace,
};
pub use error::{ConfigError, HookError, ValidationError};
pub use sender::{SendOutcome, WebhookSender};
pub use settings::{register_hooks, unregister_hooks, HookKind};
pub use webhook::{is_valid_webhook_url, mask_webhook_url};
