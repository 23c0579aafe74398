use std::{any::Any, collections::VecDeque};

use async_channel as chan;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tokio::sync::watch;
use tracing::{error, trace};
use uuid::Uuid;

use super::interrupter::{InterruptionKind, Interrupter};

/// A unique identifier for a task using the [`uuid`](https://docs.rs/uuid) crate.
pub type TaskId = Uuid;

/// Lifecycle of a task: `pending -> running -> {success | error | cancelled}`.
///
/// No transition ever leaves a terminal state.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
	Pending,
	Running,
	Success,
	Error,
	Cancelled,
}

impl TaskStatus {
	#[must_use]
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Success | Self::Error | Self::Cancelled)
	}
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
	Debug,
	Info,
	Warning,
	Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
	pub level: LogLevel,
	pub message: String,
	pub timestamp: DateTime<Utc>,
}

/// Latest progress reported by a worker, either a number (usually a percentage) or a
/// free-form status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Progress {
	Number(Number),
	Text(String),
}

impl From<i64> for Progress {
	fn from(value: i64) -> Self {
		Self::Number(value.into())
	}
}

impl From<u64> for Progress {
	fn from(value: u64) -> Self {
		Self::Number(value.into())
	}
}

impl From<i32> for Progress {
	fn from(value: i32) -> Self {
		Self::Number(value.into())
	}
}

impl From<f64> for Progress {
	fn from(value: f64) -> Self {
		Number::from_f64(value).map_or_else(|| Self::Text(value.to_string()), Self::Number)
	}
}

impl From<String> for Progress {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<&str> for Progress {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

/// A consistent, read-only copy of a task record.
///
/// Serializes to the task wire shape, minus the links which are computed by whoever
/// exposes the task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
	pub id: TaskId,
	#[serde(rename = "function")]
	pub target: String,
	pub status: TaskStatus,
	pub progress: Option<Progress>,
	pub data: Map<String, Value>,
	#[serde(rename = "return", skip_serializing_if = "Option::is_none")]
	pub return_value: Option<Value>,
	#[serde(skip_serializing)]
	pub request_time: DateTime<Utc>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub start_time: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub end_time: Option<DateTime<Utc>>,
	pub log: Vec<LogEntry>,
}

/// How a worker run ended
#[derive(Debug)]
pub(crate) enum Outcome {
	Returned(Value),
	Canceled,
	Failed(String),
}

impl Outcome {
	pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|message| (*message).to_string())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "callable panicked".to_string());

		Self::Failed(format!("panicked: {message}"))
	}
}

#[derive(Debug)]
struct TaskState {
	status: TaskStatus,
	progress: Option<Progress>,
	data: Map<String, Value>,
	return_value: Option<Value>,
	start_time: Option<DateTime<Utc>>,
	end_time: Option<DateTime<Utc>>,
	log: VecDeque<LogEntry>,
}

/// The canonical, engine owned record of one task.
///
/// Every mutation happens under the state lock, so readers always observe a snapshot
/// that was true at some instant.
#[derive(Debug)]
pub(crate) struct TaskRecord {
	id: TaskId,
	target: String,
	request_time: DateTime<Utc>,
	log_capacity: Option<usize>,
	state: Mutex<TaskState>,
	status_tx: watch::Sender<TaskStatus>,
	interrupt_tx: chan::Sender<InterruptionKind>,
}

impl TaskRecord {
	pub(crate) fn new(target: String, log_capacity: Option<usize>) -> (Self, Interrupter) {
		let (interrupt_tx, interrupt_rx) = chan::bounded(1);
		let (status_tx, _) = watch::channel(TaskStatus::Pending);

		(
			Self {
				id: TaskId::new_v4(),
				target,
				request_time: Utc::now(),
				log_capacity,
				state: Mutex::new(TaskState {
					status: TaskStatus::Pending,
					progress: None,
					data: Map::new(),
					return_value: None,
					start_time: None,
					end_time: None,
					log: VecDeque::new(),
				}),
				status_tx,
				interrupt_tx,
			},
			Interrupter::new(interrupt_rx),
		)
	}

	pub(crate) const fn id(&self) -> TaskId {
		self.id
	}

	pub(crate) fn status(&self) -> TaskStatus {
		self.state.lock().status
	}

	pub(crate) fn end_time(&self) -> Option<DateTime<Utc>> {
		self.state.lock().end_time
	}

	pub(crate) fn subscribe(&self) -> watch::Receiver<TaskStatus> {
		self.status_tx.subscribe()
	}

	pub(crate) fn snapshot(&self) -> TaskSnapshot {
		let state = self.state.lock();

		TaskSnapshot {
			id: self.id,
			target: self.target.clone(),
			status: state.status,
			progress: state.progress.clone(),
			data: state.data.clone(),
			return_value: state.return_value.clone(),
			request_time: self.request_time,
			start_time: state.start_time,
			end_time: state.end_time,
			log: state.log.iter().cloned().collect(),
		}
	}

	/// Moves a pending task to running, returns `false` if it was cancelled meanwhile.
	pub(crate) fn start(&self) -> bool {
		let mut state = self.state.lock();
		if state.status != TaskStatus::Pending {
			return false;
		}

		state.status = TaskStatus::Running;
		state.start_time = Some(Utc::now());
		self.status_tx.send_replace(TaskStatus::Running);
		trace!(task_id = %self.id, "Task started running");

		true
	}

	/// Records how the worker run ended. Only a running task can finish, a task that
	/// reached a terminal state first keeps it.
	pub(crate) fn finish(&self, outcome: Outcome) -> TaskStatus {
		let mut state = self.state.lock();
		if state.status != TaskStatus::Running {
			trace!(task_id = %self.id, status = %state.status, "Ignoring outcome of a task that is not running");
			return state.status;
		}

		let status = match outcome {
			Outcome::Returned(value) => {
				state.return_value = Some(value);
				TaskStatus::Success
			}
			Outcome::Canceled => {
				self.push_log(&mut state, LogLevel::Info, "Task was cancelled".to_string());
				TaskStatus::Cancelled
			}
			Outcome::Failed(reason) => {
				error!(task_id = %self.id, %reason, "Task failed;");
				self.push_log(&mut state, LogLevel::Error, reason);
				TaskStatus::Error
			}
		};

		state.status = status;
		state.end_time = Some(Utc::now());
		self.status_tx.send_replace(status);
		trace!(task_id = %self.id, %status, "Task finished");

		status
	}

	/// Cancels a pending task right away, or asks a running one to stop.
	///
	/// Returns the status observed under the lock: `cancelled` for a task that never
	/// started, `running` if the worker was signaled, or the terminal status left as is.
	/// The task log is left alone, only a running worker writes to it.
	pub(crate) fn cancel(&self, kind: InterruptionKind) -> TaskStatus {
		let mut state = self.state.lock();
		let status = state.status;

		match status {
			TaskStatus::Pending => {
				state.status = TaskStatus::Cancelled;
				state.end_time = Some(Utc::now());
				self.status_tx.send_replace(TaskStatus::Cancelled);
				trace!(task_id = %self.id, %kind, "Pending task cancelled");
			}

			TaskStatus::Running => {
				if self.interrupt_tx.try_send(kind).is_ok() {
					trace!(task_id = %self.id, %kind, "Sent interruption request to running task");
				} else {
					trace!(task_id = %self.id, "Running task already has an interruption request");
				}
			}

			_ => {
				trace!(task_id = %self.id, %status, "Ignoring cancel request for finished task");
			}
		}

		state.status
	}

	pub(crate) fn set_progress(&self, progress: Progress) {
		self.state.lock().progress = Some(progress);
	}

	pub(crate) fn merge_data(&self, data: impl IntoIterator<Item = (String, Value)>) {
		self.state.lock().data.extend(data);
	}

	pub(crate) fn append_log(&self, level: LogLevel, message: String) {
		let mut state = self.state.lock();
		self.push_log(&mut state, level, message);
	}

	fn push_log(&self, state: &mut TaskState, level: LogLevel, message: String) {
		state.log.push_back(LogEntry {
			level,
			message,
			timestamp: Utc::now(),
		});

		if let Some(capacity) = self.log_capacity {
			while state.log.len() > capacity {
				state.log.pop_front();
			}
		}
	}
}
