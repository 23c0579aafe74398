#![allow(dead_code)]

use std::{
	sync::mpsc,
	thread,
	time::{Duration, Instant},
};

use serde_json::{json, Value};
use thing_task_system::{
	check_interruption, ActionError, TaskContext, TaskEngine, TaskId, TaskStatus,
};

/// A callable that blocks until the returned sender fires, then returns `value`.
pub fn gated(
	value: Value,
) -> (
	mpsc::Sender<()>,
	impl FnOnce(&TaskContext) -> Result<Value, ActionError> + Send + 'static,
) {
	let (tx, rx) = mpsc::channel::<()>();

	(tx, move |_: &TaskContext| {
		rx.recv()
			.map_err(|e| ActionError::failed(format!("gate dropped: {e}")))?;
		Ok(value)
	})
}

/// Loops until canceled, reporting progress on every step.
pub fn until_canceled(ctx: &TaskContext) -> Result<Value, ActionError> {
	let mut step = 0_i64;

	loop {
		check_interruption!(ctx);

		step += 1;
		ctx.update_progress(step);
		thread::sleep(Duration::from_millis(5));

		if step > 10_000 {
			return Ok(json!("never canceled"));
		}
	}
}

pub async fn wait_for_status(engine: &TaskEngine, id: TaskId, expected: TaskStatus) {
	let deadline = Instant::now() + Duration::from_secs(10);

	loop {
		let status = engine.get(id).unwrap().status;
		if status == expected {
			return;
		}

		assert!(
			Instant::now() < deadline,
			"task {id} stuck in {status}, expected {expected}"
		);
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
}
