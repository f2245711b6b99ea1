//! Task stage state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::TransitionError;

/// Workflow stage of a task record.
///
/// State transitions:
/// - Pending -> InProgress
/// - InProgress -> Done
///
/// Done is terminal. Pending -> Done is not a transition; a record has to
/// pass through InProgress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Pending,
    InProgress,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Pending, Stage::InProgress, Stage::Done];

    /// The stage a completion signal moves a record to, if any.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Pending => Some(Stage::InProgress),
            Stage::InProgress => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::InProgress => "in-progress",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = TransitionError;

    /// Accepts the canonical names plus the board's "do / doing" aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "do" => Ok(Stage::Pending),
            "in-progress" | "in_progress" | "inprogress" | "doing" => Ok(Stage::InProgress),
            "done" => Ok(Stage::Done),
            other => Err(TransitionError::InvalidStage(other.to_string())),
        }
    }
}
