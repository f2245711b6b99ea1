//! Shapes recovered from model output.
//!
//! The model is asked for `{"actions": [{"task", "due_date", "urgency"}]}`
//! and `{"label": "..."}`. Nothing here trusts that shape: every field is
//! read defensively and degrades to "absent" instead of failing.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// One action the model extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedAction {
    pub task: String,

    /// Only ever a real calendar date; anything else is dropped.
    pub due_date: Option<NaiveDate>,

    /// Passed through as the model wrote it (trimmed). The orchestrator
    /// decides what to do with values outside low / medium / high.
    pub urgency: String,
}

impl ExtractedAction {
    /// Reads one element of the `actions` array. Elements without a task
    /// description are not actions.
    pub fn from_value(value: &Value) -> Option<ExtractedAction> {
        let obj = value.as_object()?;
        let task = obj.get("task")?.as_str()?.trim();
        if task.is_empty() {
            return None;
        }
        let due_date = obj
            .get("due_date")
            .or_else(|| obj.get("dueDate"))
            .and_then(Value::as_str)
            .and_then(parse_due_date);
        let urgency = obj
            .get("urgency")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        Some(ExtractedAction {
            task: task.to_string(),
            due_date,
            urgency,
        })
    }
}

/// Reads the `actions` array of an extraction payload.
///
/// Returns `None` when the payload has no `actions` array at all.
pub fn actions_from(payload: &Value) -> Option<Vec<ExtractedAction>> {
    let actions = payload.get("actions")?.as_array()?;
    Some(actions.iter().filter_map(ExtractedAction::from_value).collect())
}

/// Reads the `label` field of a classification payload.
///
/// Blank labels and the literal "none" (any casing) mean no label.
pub fn label_from(payload: &Value) -> Option<&str> {
    let label = payload.get("label")?.as_str()?.trim();
    if label.is_empty() || label.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(label)
    }
}

/// Strict `YYYY-MM-DD` calendar date.
///
/// chrono alone would accept unpadded fields such as `2024-3-5`, so the
/// shape is checked before the calendar is.
pub fn parse_due_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
