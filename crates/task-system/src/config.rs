use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::error::Error;

/// How long finished tasks stay in the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetentionPolicy {
	/// Finished tasks are only dropped by an explicit clear. The registry grows with every
	/// spawned task, so long running processes should pick [`RetentionPolicy::Ttl`].
	#[default]
	KeepAll,
	/// Finished tasks are swept once they have been terminal for this many seconds
	Ttl { seconds: u64 },
}

/// Task engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskEngineConfig {
	/// Upper bound on tasks running at once, `None` runs every task as soon as it is spawned
	pub max_concurrent_tasks: Option<usize>,

	/// Retention of finished tasks
	pub retention: RetentionPolicy,

	/// Period of the background sweep, only used with a TTL retention (0 = never sweep)
	pub sweep_interval_secs: u64,

	/// Maximum number of log entries kept per task, oldest dropped first (`None` = unlimited)
	pub log_capacity: Option<usize>,
}

impl Default for TaskEngineConfig {
	fn default() -> Self {
		Self {
			max_concurrent_tasks: None,
			retention: RetentionPolicy::KeepAll,
			sweep_interval_secs: 60,
			log_capacity: None,
		}
	}
}

impl TaskEngineConfig {
	pub fn validate(&self) -> Result<(), Error> {
		match self.max_concurrent_tasks {
			Some(0) => {
				return Err(Error::Config(
					"max_concurrent_tasks must allow at least one task".to_string(),
				));
			}
			Some(limit) if limit > Semaphore::MAX_PERMITS => {
				return Err(Error::Config(format!(
					"max_concurrent_tasks can't exceed {}",
					Semaphore::MAX_PERMITS
				)));
			}
			_ => {}
		}

		if self.log_capacity == Some(0) {
			return Err(Error::Config(
				"log_capacity must keep at least one entry".to_string(),
			));
		}

		Ok(())
	}

	pub(crate) fn sweep_interval(&self) -> Option<Duration> {
		match self.retention {
			RetentionPolicy::Ttl { .. } if self.sweep_interval_secs > 0 => {
				Some(Duration::from_secs(self.sweep_interval_secs))
			}
			_ => None,
		}
	}
}
