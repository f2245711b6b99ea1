//! Domain model (messages, task records, stages, model output shapes, errors).

pub mod errors;
pub mod extraction;
pub mod ids;
pub mod message;
pub mod report;
pub mod state;
pub mod task;

pub use errors::{CompletionError, StoreError, TransitionError};
pub use extraction::{ExtractedAction, parse_due_date};
pub use ids::{RunId, TaskId};
pub use message::{Message, MessageId};
pub use report::{IssueKind, TriageIssue, TriageReport};
pub use state::Stage;
pub use task::{RowRef, TaskDraft, TaskRecord, Urgency};
