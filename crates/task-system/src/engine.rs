use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::{
	runtime::Handle,
	sync::Semaphore,
	task::{spawn_blocking, JoinHandle},
	time::{interval_at, Instant},
};
use tracing::{debug, error, field, instrument, trace, warn, Instrument, Span};

use super::{
	config::TaskEngineConfig,
	context::TaskContext,
	error::{ActionError, Error},
	interrupter::{InterruptionKind, Interrupter},
	registry::TaskRegistry,
	task::{Outcome, TaskId, TaskRecord, TaskSnapshot, TaskStatus},
};

/// Runs callables as tracked background tasks.
///
/// Every task gets its own blocking worker on the tokio runtime the engine was built
/// with, so `spawn` never blocks and can be called from any thread. Cloning the engine is
/// cheap, all clones share the same registry.
#[derive(Debug, Clone)]
pub struct TaskEngine {
	inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
	handle: Handle,
	config: TaskEngineConfig,
	registry: TaskRegistry,
	permits: Option<Arc<Semaphore>>,
	sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
	fn drop(&mut self) {
		if let Some(sweeper) = self.sweeper.get_mut().take() {
			sweeper.abort();
		}
	}
}

impl TaskEngine {
	/// Builds an engine on the runtime we're currently running on.
	pub fn new(config: TaskEngineConfig) -> Result<Self, Error> {
		let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
		Self::with_runtime(handle, config)
	}

	pub fn with_runtime(handle: Handle, config: TaskEngineConfig) -> Result<Self, Error> {
		config.validate()?;

		let sweep_interval = config.sweep_interval();

		let inner = Arc::new(Inner {
			permits: config
				.max_concurrent_tasks
				.map(|limit| Arc::new(Semaphore::new(limit))),
			handle,
			config,
			registry: TaskRegistry::default(),
			sweeper: Mutex::new(None),
		});

		if let Some(period) = sweep_interval {
			let weak = Arc::downgrade(&inner);
			*inner.sweeper.lock() = Some(inner.handle.spawn(sweep_periodically(weak, period)));
		}

		Ok(Self { inner })
	}

	#[must_use]
	pub fn config(&self) -> &TaskEngineConfig {
		&self.inner.config
	}

	#[must_use]
	pub fn registry(&self) -> &TaskRegistry {
		&self.inner.registry
	}

	/// Registers a new `pending` task and schedules `callable` on a worker, returning
	/// right away with the task's first snapshot.
	#[instrument(skip_all, fields(task_id, target))]
	pub fn spawn<F>(&self, target: impl Into<String>, callable: F) -> TaskSnapshot
	where
		F: FnOnce(&TaskContext) -> Result<Value, ActionError> + Send + 'static,
	{
		let target = target.into();
		let span = Span::current();
		span.record("target", target.as_str());

		let (record, interrupter) = TaskRecord::new(target, self.inner.config.log_capacity);
		let record = self.inner.registry.insert(record);

		span.record("task_id", field::display(record.id()));
		trace!("Task registered as pending");

		let snapshot = record.snapshot();

		self.inner.handle.spawn(
			run_task(
				record,
				interrupter,
				self.inner.permits.clone(),
				callable,
			)
			.in_current_span(),
		);

		snapshot
	}

	pub fn get(&self, id: TaskId) -> Result<TaskSnapshot, Error> {
		self.inner.registry.get(id).map(|record| record.snapshot())
	}

	/// Snapshots of every tracked task, oldest first.
	#[must_use]
	pub fn list(&self) -> Vec<TaskSnapshot> {
		self.inner
			.registry
			.records()
			.iter()
			.map(|record| record.snapshot())
			.collect()
	}

	/// Cancels a pending task immediately or asks a running one to stop.
	///
	/// A running task only becomes `cancelled` once its callable observes the request
	/// and returns [`ActionError::Canceled`]; if it finishes first, its outcome stands.
	/// Cancelling a finished task does nothing. Returns the status right after the request.
	#[instrument(skip(self), fields(task_id = %id))]
	pub fn cancel(&self, id: TaskId) -> Result<TaskStatus, Error> {
		let status = self
			.inner
			.registry
			.get(id)?
			.cancel(InterruptionKind::Cancel);

		debug!(%status, "Cancel requested");

		Ok(status)
	}

	/// Waits until the task reaches a terminal state, returning its final snapshot.
	pub async fn wait(&self, id: TaskId) -> Result<TaskSnapshot, Error> {
		let record = self.inner.registry.get(id)?;
		let mut status_rx = record.subscribe();

		if status_rx.wait_for(|status| status.is_terminal()).await.is_err() {
			warn!(task_id = %id, "Task status channel closed while waiting");
		}

		Ok(record.snapshot())
	}

	/// Removes a finished task from the registry.
	#[instrument(skip(self), fields(task_id = %id))]
	pub fn clear(&self, id: TaskId) -> Result<TaskSnapshot, Error> {
		self.inner.registry.clear(id)
	}

	pub fn clear_finished(&self) -> usize {
		self.inner.registry.clear_finished()
	}

	/// Applies the configured retention policy now.
	pub fn sweep(&self) -> usize {
		self.inner
			.registry
			.sweep(self.inner.config.retention, Utc::now())
	}

	/// Cancels every pending task, asks running ones to stop and halts the periodic sweep.
	/// Tasks spawned afterwards still run.
	#[instrument(skip(self))]
	pub fn shutdown(&self) {
		if let Some(sweeper) = self.inner.sweeper.lock().take() {
			sweeper.abort();
		}

		for record in self.inner.registry.records() {
			record.cancel(InterruptionKind::Shutdown);
		}

		debug!("Task engine shut down");
	}
}

async fn run_task<F>(
	record: Arc<TaskRecord>,
	interrupter: Interrupter,
	permits: Option<Arc<Semaphore>>,
	callable: F,
) where
	F: FnOnce(&TaskContext) -> Result<Value, ActionError> + Send + 'static,
{
	let _permit = match permits {
		Some(permits) => match permits.acquire_owned().await {
			Ok(permit) => Some(permit),
			Err(e) => {
				error!(?e, "Task slots are gone, dropping task;");
				record.cancel(InterruptionKind::Shutdown);
				return;
			}
		},
		None => None,
	};

	if !record.start() {
		trace!("Task was cancelled before it could start");
		return;
	}

	let ctx = TaskContext::new(Arc::clone(&record), interrupter);

	let outcome = match spawn_blocking(move || callable(&ctx)).await {
		Ok(Ok(value)) => Outcome::Returned(value),
		Ok(Err(ActionError::Canceled)) => Outcome::Canceled,
		Ok(Err(e)) => Outcome::Failed(e.to_string()),
		Err(e) if e.is_panic() => {
			error!("Task worker panicked;");
			Outcome::from_panic(&*e.into_panic())
		}
		Err(e) => Outcome::Failed(format!("task worker was aborted: {e}")),
	};

	record.finish(outcome);
}

async fn sweep_periodically(engine: Weak<Inner>, period: std::time::Duration) {
	let mut interval = interval_at(Instant::now() + period, period);

	loop {
		interval.tick().await;

		let Some(inner) = engine.upgrade() else {
			trace!("Task engine dropped, stopping sweeper");
			break;
		};

		let dropped = inner.registry.sweep(inner.config.retention, Utc::now());
		if dropped > 0 {
			debug!(dropped, "Swept expired tasks");
		}
	}
}
