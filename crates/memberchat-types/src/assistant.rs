//! Remote assistant (threads / runs) types.
//!
//! These model the subset of the hosted assistant API the orchestrator
//! relies on: a run's lifecycle status and the messages of a thread.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chat::Sender;

/// Lifecycle status of a remote assistant run.
///
/// Unrecognized statuses deserialize to `Unknown` and are treated as
/// still running until the poll deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run will not change state again on its own.
    ///
    /// `RequiresAction` counts as terminal: no tools are registered, so
    /// nothing would ever submit the outputs the run is waiting for.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::RequiresAction
                | RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Error reported by the remote API for a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub code: String,
    pub message: String,
}

/// Snapshot of a remote run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunFailure>,
}

/// A message read back from a remote thread, reduced to its first text block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: Sender,
    /// First text content block, if the message has one.
    pub text: Option<String>,
    /// Run that produced the message (assistant messages only).
    #[serde(default)]
    pub run_id: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
}
