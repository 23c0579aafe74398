use std::{fmt, io, path::Path};

use thing_schema::{SchemaError, ValidationErrors};
use thing_task_system::{ActionError, TaskSystemError};
use thiserror::Error;

use super::descriptor::Method;

#[derive(Debug, Error)]
pub enum ResourceError {
	#[error("not found: {0}")]
	NotFound(String),
	#[error("method {method} not supported by resource <name='{resource}'>")]
	MethodNotSupported { method: Method, resource: String },
	#[error("validation failed: {0}")]
	Validation(#[from] ValidationErrors),
	#[error("action failed: {0}")]
	Action(#[from] ActionError),
	#[error(transparent)]
	Task(#[from] TaskSystemError),
	#[error(transparent)]
	Schema(#[from] SchemaError),
	#[error("attribute not found: {0}")]
	AttributeNotFound(String),
	#[error("attribute <name='{0}'> is read-only")]
	ReadOnlyAttribute(String),
	#[error("failed to (de)serialize configuration: {0}")]
	Config(#[from] serde_json::Error),

	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

/// File I/O error that includes the path that caused the error
#[derive(Error, Debug)]
pub struct FileIOError {
	pub path: Box<Path>,
	#[source]
	pub source: io::Error,
	pub maybe_context: Option<&'static str>,
}

impl fmt::Display for FileIOError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"file I/O error{}: {}; path: '{}'",
			self.maybe_context
				.map(|ctx| format!(" ({ctx})"))
				.unwrap_or_default(),
			self.source,
			self.path.display()
		)
	}
}

impl<P: AsRef<Path>> From<(P, io::Error)> for FileIOError {
	fn from((path, source): (P, io::Error)) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: None,
		}
	}
}

impl<P: AsRef<Path>> From<(P, io::Error, &'static str)> for FileIOError {
	fn from((path, source, context): (P, io::Error, &'static str)) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: Some(context),
		}
	}
}
