//! Configuration file handling for the Slack integration.
//!
//! The integration keeps its own state in `.claude/slack-config.json`, either
//! in the project directory (`CLAUDE_PROJECT_DIR`, falling back to the current
//! directory) or in the user's home. Missing optional fields fall back to
//! defaults through `#[serde(default)]`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::settings::HookKind;
use crate::webhook::is_valid_webhook_url;

/// Schema version written by `setup`. Also the only supported migration target.
pub const CONFIG_VERSION: &str = "1.0";

pub const CONFIG_FILE_NAME: &str = "slack-config.json";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Tools that trigger PostToolUse notifications when `notify_on` is empty.
pub const DEFAULT_NOTIFY_TOOLS: [&str; 4] = ["Write", "Edit", "MultiEdit", "Bash"];

pub const DEFAULT_AGGREGATE_TIMEOUT_SECS: i64 = 5;

/// Per-notification-class toggles. Absent means enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_needed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_in_progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_notifications: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationSettings {
    /// Toggles in display order, including unknown boolean keys.
    pub fn entries(&self) -> Vec<(String, bool)> {
        let known = [
            ("session_complete", self.session_complete),
            ("input_needed", self.input_needed),
            ("work_in_progress", self.work_in_progress),
            ("error_notifications", self.error_notifications),
        ];

        let mut entries: Vec<(String, bool)> = known
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();
        entries.extend(
            self.extra
                .iter()
                .filter_map(|(key, value)| value.as_bool().map(|v| (key.clone(), v))),
        );
        entries
    }
}

/// PostToolUse filtering and aggregation knobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolFilters {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notify_on: Vec<String>,
    /// Seconds within which tool events are folded into one activity message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_notifications_per_session: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolFilters {
    /// Whether a PostToolUse for `tool_name` should notify at all.
    pub fn allows(&self, tool_name: &str) -> bool {
        if self.notify_on.is_empty() {
            DEFAULT_NOTIFY_TOOLS.contains(&tool_name)
        } else {
            self.notify_on.iter().any(|t| t == tool_name)
        }
    }

    pub fn aggregate_timeout_secs(&self) -> i64 {
        self.aggregate_timeout
            .unwrap_or(DEFAULT_AGGREGATE_TIMEOUT_SECS)
    }
}

/// Delivery counters maintained by the hooks and shown by `status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_notifications_sent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_today: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_notification_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        self.total_notifications_sent.is_none()
            && self.notifications_today.is_none()
            && self.last_notification_time.is_none()
            && self.extra.is_empty()
    }
}

/// The integration's configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub active: bool,
    pub webhook_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
    /// Thread that notifications are posted into, set by `start thread_ts=...`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_settings: Option<NotificationSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_settings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_settings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_filters: Option<ToolFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SlackConfig {
    /// Load a config file.
    ///
    /// - `Ok(None)` if the file doesn't exist or is empty.
    /// - `Err` if it exists but can't be read or doesn't match the schema.
    /// - Legacy documents are migrated in memory.
    pub fn load(path: &Path) -> Result<Option<SlackConfig>> {
        let doc = load_document(path)?;
        if doc.is_empty() {
            return Ok(None);
        }
        Self::from_document(normalize(doc)?, path).map(Some)
    }

    fn from_document(doc: Map<String, Value>, path: &Path) -> Result<SlackConfig> {
        serde_json::from_value(Value::Object(doc)).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_document(self, path)
    }

    /// Checks what a hook needs before it may send anything.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_none() {
            return Err(ConfigError::Invalid(
                "Missing required field: version".to_string(),
            ));
        }
        if self.webhook_url.is_empty() {
            return Err(ConfigError::Invalid(
                "Missing required field: webhook_url".to_string(),
            ));
        }
        if !is_valid_webhook_url(&self.webhook_url) {
            return Err(ConfigError::Invalid(
                "Invalid webhook URL format".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    pub fn project_name_or_default(&self) -> &str {
        self.project_name.as_deref().unwrap_or("Unknown Project")
    }

    pub fn tool_filters(&self) -> ToolFilters {
        self.tool_filters.clone().unwrap_or_default()
    }

    /// Whether the `notification_settings` toggle for a hook is on.
    pub fn allows(&self, hook: HookKind) -> bool {
        let Some(settings) = &self.notification_settings else {
            return true;
        };
        let toggle = match hook {
            HookKind::Notification => settings.input_needed,
            HookKind::PostToolUse => settings.work_in_progress,
            HookKind::Stop => settings.session_complete,
        };
        toggle.unwrap_or(true)
    }

    /// Whether failed tool runs should be reported even when progress updates are off.
    pub fn allows_errors(&self) -> bool {
        self.notification_settings
            .as_ref()
            .and_then(|s| s.error_notifications)
            .unwrap_or(true)
    }
}

/// Where a config or settings file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Project,
    User,
}

/// Which scope currently holds a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installation {
    Project,
    User,
    None,
}

/// A loaded config together with the file that statistics should go to.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub config: SlackConfig,
    pub source: PathBuf,
}

/// The directories the integration reads from, resolved once per process.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub project_dir: PathBuf,
    pub home_dir: PathBuf,
}

impl Workspace {
    pub fn new(project_dir: impl Into<PathBuf>, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            home_dir: home_dir.into(),
        }
    }

    /// Resolve from `CLAUDE_PROJECT_DIR` (or the current directory) and `$HOME`.
    pub fn from_env() -> anyhow::Result<Self> {
        let project_dir = match std::env::var_os("CLAUDE_PROJECT_DIR") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => std::env::current_dir()?,
        };

        let home_dir = match dirs::home_dir() {
            Some(home) => home,
            None => {
                tracing::warn!("could not determine home directory, using project directory");
                project_dir.clone()
            }
        };

        Ok(Self::new(project_dir, home_dir))
    }

    pub fn claude_dir(&self, scope: Scope) -> PathBuf {
        match scope {
            Scope::Project => self.project_dir.join(".claude"),
            Scope::User => self.home_dir.join(".claude"),
        }
    }

    pub fn config_path(&self, scope: Scope) -> PathBuf {
        self.claude_dir(scope).join(CONFIG_FILE_NAME)
    }

    pub fn settings_path(&self, scope: Scope) -> PathBuf {
        self.claude_dir(scope).join(SETTINGS_FILE_NAME)
    }

    pub fn installation(&self) -> Installation {
        if self.config_path(Scope::Project).exists() {
            Installation::Project
        } else if self.config_path(Scope::User).exists() {
            Installation::User
        } else {
            Installation::None
        }
    }

    /// User config with the project config merged over it.
    ///
    /// Returns `Ok(None)` when neither file has any content.
    pub fn load_effective(&self) -> Result<Option<EffectiveConfig>> {
        let project_path = self.config_path(Scope::Project);
        let user_path = self.config_path(Scope::User);

        let project = normalize(load_document(&project_path)?)?;
        let user = if user_path == project_path {
            Map::new()
        } else {
            normalize(load_document(&user_path)?)?
        };

        if project.is_empty() && user.is_empty() {
            return Ok(None);
        }

        let source = if project.is_empty() {
            user_path
        } else {
            project_path
        };

        let merged = match merge_configs(&Value::Object(user), &Value::Object(project)) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let config = SlackConfig::from_document(merged, &source)?;

        Ok(Some(EffectiveConfig { config, source }))
    }
}

/// Read a JSON object from disk.
///
/// A missing or blank file reads as an empty object. Anything that isn't a
/// JSON object is reported as malformed.
pub fn load_document(path: &Path) -> Result<Map<String, Value>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(ConfigError::io(path, e)),
    };

    if contents.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Write pretty-printed JSON, creating the parent directory.
///
/// Writes to a temporary file first, then renames to the final path so a
/// crash never leaves a half-written document behind.
pub fn save_document<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
    }

    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, json).map_err(|e| ConfigError::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::io(path, e))?;

    Ok(())
}

/// Check the required fields and types of a raw config document.
pub fn validate_document(doc: &Map<String, Value>) -> Result<()> {
    for field in ["version", "active", "webhook_url"] {
        if !doc.contains_key(field) {
            return Err(ConfigError::Invalid(format!(
                "Missing required field: {}",
                field
            )));
        }
    }

    if !doc["active"].is_boolean() {
        return Err(ConfigError::Invalid(
            "Field 'active' must be a boolean".to_string(),
        ));
    }

    let Some(url) = doc["webhook_url"].as_str() else {
        return Err(ConfigError::Invalid(
            "Field 'webhook_url' must be a string".to_string(),
        ));
    };
    if !is_valid_webhook_url(url) {
        return Err(ConfigError::Invalid(
            "Invalid webhook URL format".to_string(),
        ));
    }

    if doc.get("project_name").is_some_and(|v| !v.is_string()) {
        return Err(ConfigError::Invalid(
            "Field 'project_name' must be a string".to_string(),
        ));
    }

    if doc
        .get("notification_settings")
        .is_some_and(|v| !v.is_object())
    {
        return Err(ConfigError::Invalid(
            "Field 'notification_settings' must be a dictionary".to_string(),
        ));
    }

    Ok(())
}

/// Deep-merge `project` over `user`. Objects merge key by key, anything else
/// from `project` replaces what `user` had.
pub fn merge_configs(user: &Value, project: &Value) -> Value {
    match (user, project) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                let next = match merged.get(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_configs(existing, value)
                    }
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base.clone(),
        (_, overlay) => overlay.clone(),
    }
}

/// Copy `path` to `<path>.backup.<YYYYMMDD_HHMMSS>`.
///
/// Returns `Ok(None)` when there is nothing to back up.
pub fn backup_config(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut backup_name = path.as_os_str().to_owned();
    backup_name.push(format!(".backup.{}", timestamp));
    let backup_path = PathBuf::from(backup_name);

    fs::copy(path, &backup_path).map_err(|e| ConfigError::io(&backup_path, e))?;
    Ok(Some(backup_path))
}

const LEGACY_FIELDS: [(&str, &str); 2] = [("slack_webhook", "webhook_url"), ("enabled", "active")];

/// True for documents written before the versioned schema existed.
pub fn needs_migration(doc: &Map<String, Value>) -> bool {
    !doc.contains_key("version")
        && (doc.contains_key("notifications")
            || LEGACY_FIELDS.iter().any(|(old, _)| doc.contains_key(*old)))
}

/// Rewrite a legacy config into the `target_version` layout.
pub fn migrate_config(old: &Map<String, Value>, target_version: &str) -> Result<Map<String, Value>> {
    if old.get("version").and_then(Value::as_str) == Some(target_version) {
        return Ok(old.clone());
    }

    if target_version != CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(target_version.to_string()));
    }

    let mut migrated = Map::new();

    for (old_key, new_key) in LEGACY_FIELDS {
        if let Some(value) = old.get(old_key) {
            migrated.insert(new_key.to_string(), value.clone());
        }
    }

    for (key, value) in old {
        let renamed = LEGACY_FIELDS.iter().any(|(old_key, _)| old_key == key);
        if !renamed && key != "notifications" && !migrated.contains_key(key) {
            migrated.insert(key.clone(), value.clone());
        }
    }

    if let Some(notifications) = old.get("notifications") {
        let mut settings = Map::new();
        if let Some(on_complete) = notifications.get("on_complete") {
            settings.insert("session_complete".to_string(), on_complete.clone());
        }
        if let Some(on_error) = notifications.get("on_error") {
            settings.insert("error_notifications".to_string(), on_error.clone());
        }
        migrated.insert("notification_settings".to_string(), Value::Object(settings));
    }

    migrated.insert(
        "version".to_string(),
        Value::String(target_version.to_string()),
    );

    Ok(migrated)
}

fn normalize(doc: Map<String, Value>) -> Result<Map<String, Value>> {
    if needs_migration(&doc) {
        tracing::info!("migrating legacy slack configuration to version {}", CONFIG_VERSION);
        migrate_config(&doc, CONFIG_VERSION)
    } else {
        Ok(doc)
    }
}

/// Bump the delivery counters in the config file at `path`.
///
/// Does nothing if the file is absent. `notifications_today` restarts at 1
/// when the previous delivery happened on another day.
pub fn record_delivery(path: &Path, now: DateTime<Local>) -> Result<()> {
    let mut doc = load_document(path)?;
    if doc.is_empty() {
        return Ok(());
    }

    let stats = doc
        .entry("statistics")
        .or_insert_with(|| Value::Object(Map::new()));
    if !stats.is_object() {
        *stats = Value::Object(Map::new());
    }
    let Value::Object(stats) = stats else {
        return Ok(());
    };

    let total = stats
        .get("total_notifications_sent")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let same_day = stats
        .get("last_notification_time")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .is_some_and(|last| last.with_timezone(&Local).date_naive() == now.date_naive());
    let today = if same_day {
        stats
            .get("notifications_today")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            + 1
    } else {
        1
    };

    stats.insert("total_notifications_sent".to_string(), Value::from(total + 1));
    stats.insert("notifications_today".to_string(), Value::from(today));
    stats.insert(
        "last_notification_time".to_string(),
        Value::String(now.to_rfc3339()),
    );

    save_document(&doc, path)
}
