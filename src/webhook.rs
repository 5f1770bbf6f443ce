//! Slack incoming-webhook URL validation and masking.
//!
//! Two URL shapes are accepted:
//! - `https://hooks.slack.com/services/T.../B.../<token>`
//! - `https://hooks.slack.com/workflows/T.../A.../<id>/<token>`

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

static SERVICES_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://hooks\.slack\.com/services/(T[A-Z0-9]+)/(B[A-Z0-9]+)/([a-zA-Z0-9]+)$")
        .unwrap()
});

static WORKFLOWS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https://hooks\.slack\.com/workflows/(T[A-Z0-9]+)/(A[A-Z0-9]+)/([a-zA-Z0-9]+)/([a-zA-Z0-9]+)$",
    )
    .unwrap()
});

/// Returned by [`mask_webhook_url`] for anything that isn't a webhook URL.
pub const INVALID_URL: &str = "Invalid URL";

/// Which of the two webhook families a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    Services,
    Workflows,
}

/// The components of a valid webhook URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookUrl {
    pub kind: WebhookKind,
    /// Workspace id, always starts with `T`
    pub team_id: String,
    /// Bot id (`B...`) for services, app id (`A...`) for workflows
    pub app_id: String,
    /// Secret path segments after the app id
    pub token: Vec<String>,
}

/// True if `url` is exactly one of the two Slack webhook shapes.
pub fn is_valid_webhook_url(url: &str) -> bool {
    SERVICES_URL.is_match(url) || WORKFLOWS_URL.is_match(url)
}

pub fn validate_webhook_url(url: &str) -> Result<(), ValidationError> {
    if is_valid_webhook_url(url) {
        Ok(())
    } else {
        Err(ValidationError::InvalidWebhookUrl)
    }
}

/// Splits a webhook URL into its ids and token segments.
pub fn parse_webhook_url(url: &str) -> Option<WebhookUrl> {
    if let Some(caps) = SERVICES_URL.captures(url) {
        return Some(WebhookUrl {
            kind: WebhookKind::Services,
            team_id: caps[1].to_string(),
            app_id: caps[2].to_string(),
            token: vec![caps[3].to_string()],
        });
    }

    WORKFLOWS_URL.captures(url).map(|caps| WebhookUrl {
        kind: WebhookKind::Workflows,
        team_id: caps[1].to_string(),
        app_id: caps[2].to_string(),
        token: vec![caps[3].to_string(), caps[4].to_string()],
    })
}

/// Replaces the secret part of a webhook URL with `...` for display.
pub fn mask_webhook_url(url: &str) -> String {
    match parse_webhook_url(url) {
        Some(parsed) => {
            let family = match parsed.kind {
                WebhookKind::Services => "services",
                WebhookKind::Workflows => "workflows",
            };
            format!(
                "https://hooks.slack.com/{}/{}/{}/...",
                family, parsed.team_id, parsed.app_id
            )
        }
        None => INVALID_URL.to_string(),
    }
}
