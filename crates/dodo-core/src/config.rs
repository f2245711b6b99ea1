//! Settings loaded once at start-up and injected into every component.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::Urgency;
use crate::error::DodoError;
use crate::impls::gemini::DEFAULT_ENDPOINT;
use crate::impls::mailbox::DEFAULT_LINK_TEMPLATE;
use crate::seen::DEFAULT_CAPACITY;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    /// Whose actions the extractor looks for.
    pub user_name: String,

    /// Most recent inbox threads inspected per run.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Capacity of the processed-id set.
    #[serde(default = "default_max_remembered_ids")]
    pub max_remembered_ids: usize,

    /// Archive the source message when its task reaches done.
    #[serde(default)]
    pub auto_archive: bool,

    /// Narrows classification to these labels, as far as the mailbox knows
    /// them. When absent every label the mailbox knows is allowed (marker
    /// labels excepted).
    #[serde(default)]
    pub allowed_labels: Option<Vec<String>>,

    /// Urgency recorded when the model answers outside low / medium / high.
    #[serde(default = "default_unknown_urgency")]
    pub unknown_urgency: Urgency,

    #[serde(default = "default_hours_between_checks")]
    pub hours_between_checks: u64,

    #[serde(default)]
    pub labels: LabelSettings,

    #[serde(default)]
    pub completion: CompletionSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

/// Marker labels applied by the triage run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelSettings {
    #[serde(default = "default_seen_label")]
    pub seen: String,
    #[serde(default = "default_action_label")]
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the API key. The key itself never lives
    /// in the file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_mailbox_path")]
    pub mailbox: PathBuf,
    #[serde(default = "default_board_path")]
    pub board: PathBuf,
    #[serde(default = "default_properties_path")]
    pub properties: PathBuf,
    #[serde(default = "default_link_template")]
    pub link_template: String,
}

fn default_batch_size() -> usize {
    10
}

fn default_max_remembered_ids() -> usize {
    DEFAULT_CAPACITY
}

fn default_unknown_urgency() -> Urgency {
    Urgency::Low
}

fn default_hours_between_checks() -> u64 {
    6
}

fn default_seen_label() -> String {
    "AI".into()
}

fn default_action_label() -> String {
    "Action Needed".into()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_mailbox_path() -> PathBuf {
    PathBuf::from("dodo-data/mailbox.json")
}

fn default_board_path() -> PathBuf {
    PathBuf::from("dodo-data/board.json")
}

fn default_properties_path() -> PathBuf {
    PathBuf::from("dodo-data/properties.json")
}

fn default_link_template() -> String {
    DEFAULT_LINK_TEMPLATE.into()
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            seen: default_seen_label(),
            action: default_action_label(),
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            mailbox: default_mailbox_path(),
            board: default_board_path(),
            properties: default_properties_path(),
            link_template: default_link_template(),
        }
    }
}

impl Settings {
    /// Defaults for everything but the user name.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            batch_size: default_batch_size(),
            max_remembered_ids: default_max_remembered_ids(),
            auto_archive: false,
            allowed_labels: None,
            unknown_urgency: default_unknown_urgency(),
            hours_between_checks: default_hours_between_checks(),
            labels: LabelSettings::default(),
            completion: CompletionSettings::default(),
            storage: StorageSettings::default(),
        }
    }

    /// Loads and validates a TOML file. Relative storage paths are resolved
    /// against the file's directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DodoError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            DodoError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        let mut settings = Self::from_toml_str(&raw)?;
        if let Some(base) = path.parent() {
            settings.storage.resolve_against(base);
        }
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, DodoError> {
        let settings: Self = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), DodoError> {
        let fail = |msg: &str| -> Result<(), DodoError> { Err(DodoError::Config(msg.into())) };
        if self.user_name.trim().is_empty() {
            return fail("user_name must not be empty");
        }
        if self.batch_size == 0 {
            return fail("batch_size must be greater than zero");
        }
        if self.max_remembered_ids == 0 {
            return fail("max_remembered_ids must be greater than zero");
        }
        if self.hours_between_checks == 0 {
            return fail("hours_between_checks must be greater than zero");
        }
        if self.labels.seen.trim().is_empty() || self.labels.action.trim().is_empty() {
            return fail("marker labels must not be empty");
        }
        if self.labels.seen == self.labels.action {
            return fail("labels.seen and labels.action must differ");
        }
        if self.completion.endpoint.trim().is_empty() {
            return fail("completion.endpoint must not be empty");
        }
        if self.completion.request_timeout_secs == 0 {
            return fail("completion.request_timeout_secs must be greater than zero");
        }
        if !self.storage.link_template.contains("{id}") {
            return fail("storage.link_template must contain {id}");
        }
        Ok(())
    }

    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, DodoError> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    pub fn api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String, DodoError> {
        let name = &self.completion.api_key_env;
        match lookup(name) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(DodoError::Config(format!(
                "missing API key: set the {name} environment variable"
            ))),
        }
    }

    pub fn marker_labels(&self) -> [&str; 2] {
        [&self.labels.seen, &self.labels.action]
    }
}

impl StorageSettings {
    fn resolve_against(&mut self, base: &Path) {
        for path in [&mut self.mailbox, &mut self.board, &mut self.properties] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
