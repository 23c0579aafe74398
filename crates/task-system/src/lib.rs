//!
//! # Task System
//!
//! Runs blocking callables as tracked background tasks and keeps a consistent record of
//! each one: status, progress, scratch data, return value, timestamps and log.
//!
//! Hand the engine a closure and it takes care of the rest:
//! - Every task moves through `pending -> running -> {success | error | cancelled}`;
//! - Failures and panics inside the callable end up in the task log with status `error`, never
//!   in the caller;
//! - Cancellation is cooperative, the callable polls its [`TaskContext`] (or uses
//!   [`check_interruption!`]) and returns [`ActionError::Canceled`] when asked to stop;
//! - Finished tasks are kept until cleared, or swept after a TTL with [`RetentionPolicy::Ttl`].
//!
//! ## Basic example
//!
//! ```
//! use serde_json::json;
//! use thing_task_system::{TaskEngine, TaskEngineConfig, TaskStatus};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = TaskEngine::new(TaskEngineConfig::default()).unwrap();
//!
//!     let task = engine.spawn("sample.add", |ctx| {
//!         ctx.update_progress(50);
//!         Ok(json!(1 + 2))
//!     });
//!
//!     let done = engine.wait(task.id).await.unwrap();
//!     assert_eq!(done.status, TaskStatus::Success);
//!     assert_eq!(done.return_value, Some(json!(3)));
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod config;
mod context;
mod engine;
mod error;
mod interrupter;
mod registry;
mod task;

pub use config::{RetentionPolicy, TaskEngineConfig};
pub use context::TaskContext;
pub use engine::TaskEngine;
pub use error::{ActionError, Error as TaskSystemError};
pub use interrupter::{InterrupterFuture, InterruptionKind, Interrupter};
pub use registry::TaskRegistry;
pub use task::{LogEntry, LogLevel, Progress, TaskId, TaskSnapshot, TaskStatus};
