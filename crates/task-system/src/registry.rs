use std::{
	collections::{BTreeMap, HashMap},
	sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{
	config::RetentionPolicy,
	error::Error,
	task::{TaskId, TaskRecord, TaskSnapshot},
};

#[derive(Debug, Default)]
struct Entries {
	next_seq: u64,
	by_seq: BTreeMap<u64, Arc<TaskRecord>>,
	seq_by_id: HashMap<TaskId, u64>,
}

impl Entries {
	fn remove(&mut self, id: TaskId) -> Option<Arc<TaskRecord>> {
		self.seq_by_id
			.remove(&id)
			.and_then(|seq| self.by_seq.remove(&seq))
	}
}

/// Every task the engine tracks, in creation order.
#[derive(Debug, Default)]
pub struct TaskRegistry {
	entries: RwLock<Entries>,
}

impl TaskRegistry {
	pub(crate) fn insert(&self, record: TaskRecord) -> Arc<TaskRecord> {
		let record = Arc::new(record);
		let mut entries = self.entries.write();

		let seq = entries.next_seq;
		entries.next_seq += 1;
		entries.seq_by_id.insert(record.id(), seq);
		entries.by_seq.insert(seq, Arc::clone(&record));

		record
	}

	pub(crate) fn get(&self, id: TaskId) -> Result<Arc<TaskRecord>, Error> {
		let entries = self.entries.read();

		entries
			.seq_by_id
			.get(&id)
			.and_then(|seq| entries.by_seq.get(seq))
			.cloned()
			.ok_or(Error::TaskNotFound(id))
	}

	pub(crate) fn records(&self) -> Vec<Arc<TaskRecord>> {
		self.entries.read().by_seq.values().cloned().collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.read().by_seq.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Removes a finished task, returning its last snapshot.
	pub fn clear(&self, id: TaskId) -> Result<TaskSnapshot, Error> {
		let mut entries = self.entries.write();

		let status = entries
			.seq_by_id
			.get(&id)
			.and_then(|seq| entries.by_seq.get(seq))
			.map(|record| record.status())
			.ok_or(Error::TaskNotFound(id))?;

		if !status.is_terminal() {
			warn!(task_id = %id, %status, "Refusing to clear a task that didn't finish yet");
			return Err(Error::TaskNotTerminal { id, status });
		}

		entries
			.remove(id)
			.map(|record| record.snapshot())
			.ok_or(Error::TaskNotFound(id))
	}

	/// Removes every finished task, returning how many were dropped.
	pub fn clear_finished(&self) -> usize {
		self.retain(|record| !record.status().is_terminal())
	}

	/// Applies a retention policy as of `now`, returning how many tasks were dropped.
	pub fn sweep(&self, policy: RetentionPolicy, now: DateTime<Utc>) -> usize {
		match policy {
			RetentionPolicy::KeepAll => 0,
			RetentionPolicy::Ttl { seconds } => {
				// A ttl too large to represent never expires
				let ttl = i64::try_from(seconds).ok().and_then(Duration::try_seconds);

				self.retain(|record| match (record.end_time(), ttl) {
					(Some(end_time), Some(ttl)) => end_time
						.checked_add_signed(ttl)
						.map_or(true, |expires_at| expires_at > now),
					_ => true,
				})
			}
		}
	}

	fn retain(&self, mut keep: impl FnMut(&TaskRecord) -> bool) -> usize {
		let mut entries = self.entries.write();

		let dropped = entries
			.by_seq
			.values()
			.filter(|record| !keep(record))
			.map(|record| record.id())
			.collect::<Vec<_>>();

		for id in &dropped {
			entries.remove(*id);
		}

		if !dropped.is_empty() {
			debug!(count = dropped.len(), "Dropped finished tasks from registry");
		}

		dropped.len()
	}
}
