//! Slack Block Kit payload model.
//!
//! Only the block types used by the notifications are modelled. Payloads
//! serialize to the JSON shape Slack's incoming webhooks expect.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard limits from Slack's Block Kit reference.
pub const MAX_BLOCKS: usize = 50;
pub const MAX_SECTION_TEXT: usize = 3000;
pub const MAX_SECTION_FIELDS: usize = 10;

pub const DEFAULT_MAX_LENGTH: usize = 2000;

const KNOWN_BLOCK_TYPES: [&str; 5] = ["header", "section", "context", "actions", "divider"];

/// Text object; `type` is either `plain_text` or `mrkdwn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Text::PlainText { text } | Text::Mrkdwn { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: Text,
    },
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<Text>>,
    },
    Context {
        elements: Vec<Text>,
    },
    Actions {
        elements: Vec<Value>,
    },
    Divider {},
}

impl Block {
    pub fn header(text: impl Into<String>) -> Self {
        Block::Header {
            text: Text::plain(text),
        }
    }

    pub fn section(text: impl Into<String>) -> Self {
        Block::Section {
            text: Some(Text::mrkdwn(text)),
            fields: None,
        }
    }

    pub fn fields(fields: Vec<Text>) -> Self {
        Block::Section {
            text: None,
            fields: Some(fields),
        }
    }

    pub fn context(text: impl Into<String>) -> Self {
        Block::Context {
            elements: vec![Text::mrkdwn(text)],
        }
    }

    /// All human-readable text carried by the block.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Block::Header { text } => vec![text.as_str()],
            Block::Section { text, fields } => text
                .iter()
                .chain(fields.iter().flatten())
                .map(Text::as_str)
                .collect(),
            Block::Context { elements } => elements.iter().map(Text::as_str).collect(),
            Block::Actions { .. } | Block::Divider {} => Vec::new(),
        }
    }
}

/// `*Label:*\nvalue` field used throughout the notifications.
pub fn field(label: &str, value: impl std::fmt::Display) -> Text {
    Text::mrkdwn(format!("*{}:*\n{}", label, value))
}

/// An incoming-webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    /// Fallback text shown in notifications
    pub text: String,
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl SlackMessage {
    pub fn new(text: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            text: text.into(),
            blocks,
            thread_ts: None,
        }
    }

    pub fn in_thread(mut self, thread_ts: Option<String>) -> Self {
        self.thread_ts = thread_ts;
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Every text fragment in the message, fallback text first.
    pub fn all_text(&self) -> String {
        let mut parts = vec![self.text.as_str()];
        for block in &self.blocks {
            parts.extend(block.texts());
        }
        parts.join("\n")
    }
}

/// Check a raw payload against the Block Kit limits the notifications rely on.
pub fn validate_block_kit(payload: &Value) -> bool {
    let Some(obj) = payload.as_object() else {
        return false;
    };
    if !obj.get("text").is_some_and(Value::is_string) {
        return false;
    }
    let Some(blocks) = obj.get("blocks").and_then(Value::as_array) else {
        return false;
    };
    if blocks.len() > MAX_BLOCKS {
        return false;
    }

    blocks.iter().all(|block| {
        let Some(block_type) = block.get("type").and_then(Value::as_str) else {
            return false;
        };
        match block_type {
            "header" => block
                .get("text")
                .and_then(|t| t.get("type"))
                .and_then(Value::as_str)
                == Some("plain_text"),
            "section" => {
                let text_ok = block
                    .get("text")
                    .and_then(|t| t.get("text"))
                    .and_then(Value::as_str)
                    .map_or(true, |t| t.chars().count() <= MAX_SECTION_TEXT);
                let fields_ok = block
                    .get("fields")
                    .and_then(Value::as_array)
                    .map_or(true, |f| f.len() <= MAX_SECTION_FIELDS);
                text_ok && fields_ok
            }
            other => KNOWN_BLOCK_TYPES.contains(&other),
        }
    })
}

/// Shorten `content` to at most `max_length` characters, ending in `...`.
///
/// Cuts on the last space when that keeps more than 80% of `max_length`.
pub fn truncate_message_content(content: Option<&str>, max_length: usize) -> String {
    let Some(content) = content else {
        return String::new();
    };

    if content.chars().count() <= max_length {
        return content.to_string();
    }

    let keep = max_length.saturating_sub(3);
    let mut truncated: String = content.chars().take(keep).collect();

    if let Some(last_space) = truncated.rfind(' ') {
        let space_chars = truncated[..last_space].chars().count();
        if space_chars as f64 > max_length as f64 * 0.8 {
            truncated.truncate(last_space);
        }
    }

    truncated.push_str("...");
    truncated
}

/// Shorthand for `truncate_message_content(Some(content), max_length)`.
pub fn truncate(content: &str, max_length: usize) -> String {
    truncate_message_content(Some(content), max_length)
}
