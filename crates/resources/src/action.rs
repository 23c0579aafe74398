use std::{fmt, sync::Arc};

use serde_json::{Map, Value};
use thing_schema::{
	field_to_schema, normalize_to_schema, Field, Schema, SchemaInput, SchemaNode, WireType,
};
use thing_task_system::{ActionError, TaskContext, TaskEngine, TaskSnapshot};
use tracing::{debug, instrument, trace};

use super::{
	descriptor::{Method, ResourceDescriptor, ResourceDocs, ResourceKind},
	error::ResourceError,
};

/// Declared type of a callable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
	Integer,
	String,
	Float,
	Boolean,
	List,
	Dict,
	/// No annotation, treated as a string
	Any,
}

impl TypeHint {
	fn field(self) -> Field {
		match self {
			Self::Integer => Field::integer(),
			Self::String | Self::Any => Field::string(),
			Self::Float => Field::float(),
			Self::Boolean => Field::boolean(),
			Self::List => Field::list(Field::raw()),
			Self::Dict => Field::dict(),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Param {
	name: String,
	hint: TypeHint,
	default: Option<Value>,
}

type ActionFn = dyn Fn(&TaskContext, Map<String, Value>) -> Result<Value, ActionError> + Send + Sync;

/// A named function together with its declared signature.
///
/// The function receives the decoded keyword arguments, already validated against the
/// declared parameters with defaults filled in.
#[derive(Clone)]
pub struct Callable {
	name: String,
	doc: Option<String>,
	params: Vec<Param>,
	func: Arc<ActionFn>,
}

impl fmt::Debug for Callable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Callable")
			.field("name", &self.name)
			.field("params", &self.params)
			.finish_non_exhaustive()
	}
}

impl Callable {
	pub fn new<F>(name: impl Into<String>, func: F) -> Self
	where
		F: Fn(&TaskContext, Map<String, Value>) -> Result<Value, ActionError>
			+ Send
			+ Sync
			+ 'static,
	{
		Self {
			name: name.into(),
			doc: None,
			params: Vec::new(),
			func: Arc::new(func),
		}
	}

	/// Declares a required parameter
	#[must_use]
	pub fn param(mut self, name: impl Into<String>, hint: TypeHint) -> Self {
		self.params.push(Param {
			name: name.into(),
			hint,
			default: None,
		});
		self
	}

	/// Declares an optional parameter
	#[must_use]
	pub fn param_with_default(
		mut self,
		name: impl Into<String>,
		hint: TypeHint,
		default: impl Into<Value>,
	) -> Self {
		self.params.push(Param {
			name: name.into(),
			hint,
			default: Some(default.into()),
		});
		self
	}

	/// Documentation used as the action description when none is given explicitly
	#[must_use]
	pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
		self.doc = Some(doc.into());
		self
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Input schema synthesized from the declared parameters
	#[must_use]
	pub fn input_schema(&self) -> Schema {
		self.params
			.iter()
			.map(|param| {
				let field = match &param.default {
					Some(default) => param.hint.field().with_default(default.clone()),
					None => param.hint.field().required(),
				};

				(param.name.clone(), field)
			})
			.collect()
	}

	pub fn call(&self, ctx: &TaskContext, kwargs: Map<String, Value>) -> Result<Value, ActionError> {
		(self.func)(ctx, kwargs)
	}
}

#[derive(Debug, Clone, Default)]
pub struct ActionOptions {
	pub name: Option<String>,
	pub description: Option<String>,
	pub safe: bool,
	pub idempotent: bool,
	/// Run as a background task instead of inline
	pub task: bool,
	/// Schema the return value is encoded with, only for inline actions
	pub output: Option<SchemaInput>,
}

/// What invoking an action produced
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutput {
	Value(Value),
	/// The action was handed to the task engine, here is the task as it was spawned
	Task(TaskSnapshot),
}

/// A resource invoking a [`Callable`], inline or as a background task.
#[derive(Debug)]
pub struct ActionResource {
	callable: Callable,
	input: Schema,
	output: Option<Field>,
	engine: Option<TaskEngine>,
	descriptor: ResourceDescriptor,
}

/// Builds an action resource over `callable`.
///
/// With `options.task` set every invocation is spawned on `engine`, without it the
/// callable runs on the caller's thread and `engine` is left untouched.
#[instrument(skip_all, fields(resource = %callable.name()), err)]
pub fn action_from(
	callable: Callable,
	options: ActionOptions,
	engine: &TaskEngine,
) -> Result<ActionResource, ResourceError> {
	let input = callable.input_schema();

	let output = match (&options.output, options.task) {
		(Some(output), false) => Some(normalize_to_schema(output)?),
		_ => None,
	};

	let output_schema = if options.task {
		Some(task_wire_schema())
	} else {
		output.as_ref().map(field_to_schema)
	};

	let mut docs = ResourceDocs::new(
		options.name,
		options.description.or_else(|| callable.doc.clone()),
	);
	docs.safe = options.safe;
	docs.idempotent = options.idempotent;
	docs.tags = vec!["actions".to_string()];
	docs.methods = if options.task {
		vec![Method::Get, Method::Post]
	} else {
		vec![Method::Post]
	};

	debug!(task = options.task, "Built action resource");

	Ok(ActionResource {
		descriptor: ResourceDescriptor {
			kind: ResourceKind::Action,
			target: callable.name().to_string(),
			input_schema: Some(field_to_schema(&Field::nested(input.clone()))),
			output_schema,
			docs,
		},
		engine: options.task.then(|| engine.clone()),
		callable,
		input,
		output,
	})
}

impl ActionResource {
	#[must_use]
	pub const fn descriptor(&self) -> &ResourceDescriptor {
		&self.descriptor
	}

	/// Decodes `payload` into keyword arguments and runs the callable, inline or as a
	/// task. An empty (`null`) payload stands for no arguments at all.
	#[instrument(skip_all, fields(resource = %self.callable.name()), err)]
	pub fn invoke(&self, payload: &Value) -> Result<ActionOutput, ResourceError> {
		let kwargs = match payload {
			Value::Null => self.input.load(&Value::Object(Map::new()), false)?,
			payload => self.input.load(payload, false)?,
		};

		if let Some(engine) = &self.engine {
			let callable = self.callable.clone();
			let task = engine.spawn(self.callable.name(), move |ctx| callable.call(ctx, kwargs));
			trace!(task_id = %task.id, "Action spawned as task");

			return Ok(ActionOutput::Task(task));
		}

		let value = self.callable.call(&TaskContext::detached(), kwargs)?;

		Ok(ActionOutput::Value(match &self.output {
			Some(field) => field.serialize(&value),
			None => value,
		}))
	}

	/// Tasks spawned for this action that are still tracked, oldest first. Always empty
	/// for inline actions.
	#[must_use]
	pub fn tasks(&self) -> Vec<TaskSnapshot> {
		self.engine
			.as_ref()
			.map(|engine| {
				engine
					.list()
					.into_iter()
					.filter(|task| task.target == self.callable.name())
					.collect()
			})
			.unwrap_or_default()
	}
}

/// Wire schema of a serialized task
fn task_wire_schema() -> SchemaNode {
	let string = || SchemaNode::of(WireType::String);
	let timestamp = || SchemaNode {
		nullable: true,
		..string().with_format("date-time")
	};

	let log_entry = SchemaNode::of(WireType::Object)
		.with_property("level", string(), true)
		.with_property("message", string(), true)
		.with_property("timestamp", string().with_format("date-time"), true);

	SchemaNode::of(WireType::Object)
		.with_property("id", string().with_format("uuid"), true)
		.with_property("function", string(), true)
		.with_property("status", string(), true)
		.with_property("progress", SchemaNode { nullable: true, ..SchemaNode::default() }, false)
		.with_property("data", SchemaNode::of(WireType::Object), false)
		.with_property("return", SchemaNode::default(), false)
		.with_property("start_time", timestamp(), false)
		.with_property("end_time", timestamp(), false)
		.with_property(
			"log",
			SchemaNode {
				items: Some(Box::new(log_entry)),
				..SchemaNode::of(WireType::Array)
			},
			false,
		)
		.with_property("links", SchemaNode::of(WireType::Object), false)
}
