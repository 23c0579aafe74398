use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{
	interrupter::Interrupter,
	task::{LogLevel, Progress, TaskId, TaskRecord},
};

/// Handle given to a running callable to report on its task.
///
/// Progress, data and log writes land on the task record right away, so concurrent
/// readers see them mid-flight. Every log entry is mirrored as a `tracing` event.
#[derive(Debug)]
pub struct TaskContext {
	record: Option<Arc<TaskRecord>>,
	interrupter: Interrupter,
}

impl TaskContext {
	pub(crate) const fn new(record: Arc<TaskRecord>, interrupter: Interrupter) -> Self {
		Self {
			record: Some(record),
			interrupter,
		}
	}

	/// A context for callables invoked inline, outside of any task: reports only reach
	/// the tracing output and cancellation is never requested.
	#[must_use]
	pub fn detached() -> Self {
		Self {
			record: None,
			interrupter: Interrupter::detached(),
		}
	}

	#[must_use]
	pub fn task_id(&self) -> Option<TaskId> {
		self.record.as_ref().map(|record| record.id())
	}

	#[must_use]
	pub const fn interrupter(&self) -> &Interrupter {
		&self.interrupter
	}

	#[must_use]
	pub fn is_canceled(&self) -> bool {
		self.interrupter.is_interrupted()
	}

	pub fn update_progress(&self, progress: impl Into<Progress>) {
		if let Some(record) = &self.record {
			record.set_progress(progress.into());
		}
	}

	/// Merges the given entries into the task's data mapping, overwriting existing keys.
	pub fn update_data<K: Into<String>>(&self, data: impl IntoIterator<Item = (K, Value)>) {
		if let Some(record) = &self.record {
			record.merge_data(data.into_iter().map(|(key, value)| (key.into(), value)));
		}
	}

	pub fn log(&self, level: LogLevel, message: impl Into<String>) {
		let message = message.into();
		let task_id = self.task_id().map(|id| id.to_string());

		match level {
			LogLevel::Debug => debug!(?task_id, "{message}"),
			LogLevel::Info => info!(?task_id, "{message}"),
			LogLevel::Warning => warn!(?task_id, "{message}"),
			LogLevel::Error => error!(?task_id, "{message}"),
		}

		if let Some(record) = &self.record {
			record.append_log(level, message);
		}
	}

	pub fn info(&self, message: impl Into<String>) {
		self.log(LogLevel::Info, message);
	}

	pub fn warn(&self, message: impl Into<String>) {
		self.log(LogLevel::Warning, message);
	}

	pub fn error(&self, message: impl Into<String>) {
		self.log(LogLevel::Error, message);
	}
}
