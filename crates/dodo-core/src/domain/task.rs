//! Task records: one actionable unit of work extracted from a message.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TaskId;
use super::message::MessageId;
use super::state::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    /// Case-insensitive match against low / medium / high.
    pub fn parse(s: &str) -> Option<Urgency> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Urgency::parse(s).ok_or_else(|| format!("unknown urgency: {s}"))
    }
}

/// Position of a record inside one stage (0-based).
///
/// Row references are only meaningful against the current contents of a
/// stage: moving a record out of a stage shifts the rows below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRef(usize);

impl RowRef {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything the orchestrator knows about a task before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub subject: String,
    pub description: String,
    pub urgency: Urgency,
    pub due_date: Option<NaiveDate>,
    pub source_link: String,
    pub message_id: MessageId,
}

/// A task tracked through pending -> in-progress -> done.
///
/// Records are never edited in place: a stage change produces a new record
/// (see [`TaskRecord::moved_to`]) that the task store appends to the next
/// stage after removing the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub stage: Stage,
    pub created_at: DateTime<Utc>,

    /// Set every time the record changes stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_at: Option<DateTime<Utc>>,

    /// Redacted subject of the source message.
    pub subject: String,
    pub description: String,
    pub urgency: Urgency,

    /// Serialized as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    pub source_link: String,
    pub message_id: MessageId,
}

impl TaskRecord {
    pub fn pending(id: TaskId, created_at: DateTime<Utc>, draft: TaskDraft) -> Self {
        Self {
            id,
            stage: Stage::Pending,
            created_at,
            moved_at: None,
            subject: draft.subject,
            description: draft.description,
            urgency: draft.urgency,
            due_date: draft.due_date,
            source_link: draft.source_link,
            message_id: draft.message_id,
        }
    }

    /// The same task as it should appear in `stage`.
    pub fn moved_to(self, stage: Stage, now: DateTime<Utc>) -> TaskRecord {
        TaskRecord {
            stage,
            moved_at: Some(now),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use ulid::Ulid;

    fn draft() -> TaskDraft {
        TaskDraft {
            subject: "Q3 report".into(),
            description: "Send Q3 report".into(),
            urgency: Urgency::High,
            due_date: NaiveDate::from_ymd_opt(2025, 9, 12),
            source_link: "https://mail.example/#inbox/m1".into(),
            message_id: MessageId::new("m1"),
        }
    }

    #[rstest]
    #[case::lower("low", Some(Urgency::Low))]
    #[case::mixed("Medium", Some(Urgency::Medium))]
    #[case::padded(" HIGH ", Some(Urgency::High))]
    #[case::unknown("urgent", None)]
    #[case::empty("", None)]
    fn urgency_parse(#[case] input: &str, #[case] expected: Option<Urgency>) {
        assert_eq!(Urgency::parse(input), expected);
    }

    #[test]
    fn new_record_starts_pending() {
        let now = Utc.with_ymd_and_hms(2025, 9, 8, 9, 0, 0).unwrap();
        let record = TaskRecord::pending(TaskId::from_ulid(Ulid::new()), now, draft());
        assert_eq!(record.stage, Stage::Pending);
        assert_eq!(record.moved_at, None);
        assert_eq!(record.created_at, now);
    }

    #[test]
    fn advancing_keeps_identity_and_stamps_move_time() {
        let created = Utc.with_ymd_and_hms(2025, 9, 8, 9, 0, 0).unwrap();
        let moved = Utc.with_ymd_and_hms(2025, 9, 9, 10, 0, 0).unwrap();
        let record = TaskRecord::pending(TaskId::from_ulid(Ulid::new()), created, draft());
        let id = record.id;

        let doing = record.moved_to(Stage::InProgress, moved);
        assert_eq!(doing.stage, Stage::InProgress);
        assert_eq!(doing.id, id);
        assert_eq!(doing.moved_at, Some(moved));
        assert_eq!(doing.created_at, created);
        assert_eq!(doing.description, "Send Q3 report");
    }

    #[test]
    fn due_date_serializes_as_iso_date() {
        let now = Utc.with_ymd_and_hms(2025, 9, 8, 9, 0, 0).unwrap();
        let record = TaskRecord::pending(TaskId::from_ulid(Ulid::new()), now, draft());
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["due_date"], "2025-09-12");
        assert_eq!(v["urgency"], "high");
        assert_eq!(v["stage"], "pending");
    }
}
