use std::{path::Path, sync::Arc};

use serde_json::Value;
use thing_task_system::{TaskEngine, TaskSnapshot};

use super::{
	action::{action_from, ActionOptions, ActionOutput, ActionResource, Callable},
	attributes::Attributes,
	descriptor::{Method, ResourceDescriptor},
	error::ResourceError,
	property::{property_of, PropertyOptions, PropertyResource},
	static_files::{static_from, StaticFile, StaticResource},
};

/// What an external router hands to [`Resource::dispatch`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
	/// Decoded request payload, `null` when there is none
	pub body: Value,
	/// Path captured after the resource's own route, used by static resources
	pub path: String,
}

impl Request {
	#[must_use]
	pub fn body(body: Value) -> Self {
		Self {
			body,
			..Default::default()
		}
	}

	#[must_use]
	pub fn path(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			..Default::default()
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
	Value(Value),
	Task(TaskSnapshot),
	Tasks(Vec<TaskSnapshot>),
	File(StaticFile),
}

/// Any generated resource
#[derive(Debug)]
pub enum Resource {
	Property(PropertyResource),
	Action(ActionResource),
	Static(StaticResource),
}

impl Resource {
	#[must_use]
	pub const fn descriptor(&self) -> &ResourceDescriptor {
		match self {
			Self::Property(property) => property.descriptor(),
			Self::Action(action) => action.descriptor(),
			Self::Static(files) => files.descriptor(),
		}
	}

	/// Routes a verb to the matching operation, for routers that don't want to match on
	/// the resource kind themselves. Verbs a resource doesn't expose are reported as
	/// [`ResourceError::MethodNotSupported`].
	pub fn dispatch(&self, method: Method, request: &Request) -> Result<Response, ResourceError> {
		match (self, method) {
			(Self::Property(property), Method::Get) => property.read().map(Response::Value),
			(Self::Property(property), Method::Put | Method::Post) => {
				let writer = property.writer().ok_or_else(|| self.unsupported(method))?;

				if method == Method::Put {
					writer.replace(&request.body)
				} else {
					writer.update(&request.body)
				}
				.map(Response::Value)
			}

			(Self::Action(action), Method::Post) => {
				action.invoke(&request.body).map(|output| match output {
					ActionOutput::Value(value) => Response::Value(value),
					ActionOutput::Task(task) => Response::Task(task),
				})
			}
			(Self::Action(action), Method::Get) if self.descriptor().allows(Method::Get) => {
				Ok(Response::Tasks(action.tasks()))
			}

			(Self::Static(files), Method::Get) => files.read(&request.path).map(Response::File),

			_ => Err(self.unsupported(method)),
		}
	}

	fn unsupported(&self, method: Method) -> ResourceError {
		let docs = &self.descriptor().docs;

		ResourceError::MethodNotSupported {
			method,
			resource: docs
				.name
				.clone()
				.unwrap_or_else(|| self.descriptor().target.clone()),
		}
	}
}

/// Builds resources, handing task-backed actions to a shared [`TaskEngine`].
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
	engine: TaskEngine,
}

impl ResourceBuilder {
	#[must_use]
	pub const fn new(engine: TaskEngine) -> Self {
		Self { engine }
	}

	#[must_use]
	pub const fn engine(&self) -> &TaskEngine {
		&self.engine
	}

	pub fn property_of(
		&self,
		target: Arc<dyn Attributes>,
		attribute: &str,
		options: PropertyOptions,
	) -> Result<Resource, ResourceError> {
		property_of(target, attribute, options).map(Resource::Property)
	}

	pub fn action_from(
		&self,
		callable: Callable,
		options: ActionOptions,
	) -> Result<Resource, ResourceError> {
		action_from(callable, options, &self.engine).map(Resource::Action)
	}

	pub fn static_from(
		&self,
		base_dir: impl AsRef<Path>,
		name: Option<String>,
	) -> Result<Resource, ResourceError> {
		static_from(base_dir, name).map(Resource::Static)
	}
}
