//! Triage run report.

use serde::Serialize;

use super::errors::{CompletionError, StoreError};
use super::ids::RunId;
use super::message::MessageId;

/// A recoverable problem met while triaging one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "error", rename_all = "snake_case")]
pub enum IssueKind {
    Completion(CompletionError),
    Store(StoreError),
}

impl From<&CompletionError> for IssueKind {
    fn from(err: &CompletionError) -> Self {
        IssueKind::Completion(err.clone())
    }
}

impl From<&StoreError> for IssueKind {
    fn from(err: &StoreError) -> Self {
        IssueKind::Store(err.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageIssue {
    pub message_id: MessageId,
    #[serde(flatten)]
    pub kind: IssueKind,
}

/// What one `run_triage` call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageReport {
    pub run_id: RunId,

    /// Messages marked processed during this run.
    pub processed_count: usize,
    pub tasks_created: usize,

    /// Candidates skipped because they were already processed.
    pub skipped_count: usize,

    pub errors: Vec<TriageIssue>,
}

impl TriageReport {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            processed_count: 0,
            tasks_created: 0,
            skipped_count: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_issue(&mut self, message_id: &MessageId, kind: IssueKind) {
        self.errors.push(TriageIssue {
            message_id: message_id.clone(),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn issues_serialize_flat() {
        let mut report = TriageReport::new(RunId::from_ulid(Ulid::new()));
        report.record_issue(
            &MessageId::new("m1"),
            IssueKind::from(&CompletionError::EmptyResponse),
        );

        report.record_issue(
            &MessageId::new("m2"),
            IssueKind::from(&StoreError::WriteFailed("mailbox is read-only".into())),
        );

        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["errors"][0]["message_id"], "m1");
        assert_eq!(v["errors"][0]["kind"], "completion");
        assert_eq!(v["errors"][0]["error"]["type"], "empty_response");

        assert_eq!(v["errors"][1]["kind"], "store");
        assert_eq!(v["errors"][1]["error"]["type"], "write_failed");
        assert_eq!(v["errors"][1]["error"]["detail"], "mailbox is read-only");
    }

    #[test]
    fn issues_keep_the_typed_error() {
        let err = CompletionError::Unreachable("status 503".into());
        assert_eq!(IssueKind::from(&err), IssueKind::Completion(err));
    }
}
