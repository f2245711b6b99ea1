//! Inbound messages as seen by the core.
//!
//! Messages are owned by the external message store; the core only reads
//! them and asks the store for label changes.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    /// Messages sharing a thread are collapsed to the latest one per run.
    pub thread_id: String,

    #[serde(default)]
    pub subject: String,

    /// Plain-text body. May be blank when only `html_body` is present.
    #[serde(default)]
    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,

    pub received_at: DateTime<Utc>,

    /// Dereferenceable locator back to the original message.
    pub link: String,

    #[serde(default)]
    pub labels: BTreeSet<String>,
}

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

impl Message {
    /// Text to analyse: the plain body, or the HTML body with tags removed
    /// when the plain body is blank.
    pub fn plain_text(&self) -> String {
        if !self.body.trim().is_empty() {
            return self.body.trim().to_string();
        }
        let Some(html) = self.html_body.as_deref() else {
            return String::new();
        };
        let without_tags = HTML_TAG.replace_all(html, " ");
        WHITESPACE_RUN
            .replace_all(&without_tags, " ")
            .trim()
            .to_string()
    }
}
