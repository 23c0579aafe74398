use std::fmt;

use thiserror::Error;

use super::task::{TaskId, TaskStatus};

#[derive(Debug, Error)]
pub enum Error {
	#[error("task not found: {0}")]
	TaskNotFound(TaskId),
	#[error("task <id='{id}'> is {status}, only finished tasks can be cleared")]
	TaskNotTerminal { id: TaskId, status: TaskStatus },
	#[error("no tokio runtime available to drive task workers")]
	NoRuntime,
	#[error("invalid task engine configuration: {0}")]
	Config(String),
}

/// What a callable running under the engine can fail with.
///
/// Returning [`ActionError::Canceled`] is how a worker acknowledges a cancellation request,
/// anything else ends the task in the `error` state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
	#[error("action was canceled")]
	Canceled,
	#[error("{0}")]
	Failed(String),
}

impl ActionError {
	pub fn failed(reason: impl fmt::Display) -> Self {
		Self::Failed(reason.to_string())
	}
}
