use std::{sync::mpsc, sync::Mutex, time::Duration};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use thing_resources::{
	ActionOptions, ActionOutput, Callable, Method, Request, ResourceBuilder, ResourceError,
	ResourceKind, Response, TypeHint,
};
use thing_schema::{Field, SchemaInput};
use thing_task_system::{ActionError, TaskEngine, TaskEngineConfig, TaskStatus};
use tracing_test::traced_test;

fn echo() -> Callable {
	Callable::new("sample.echo", |_, kwargs| Ok(Value::Object(kwargs)))
		.param("arg", TypeHint::Integer)
		.param_with_default("kwarg", TypeHint::String, "default")
		.with_doc("Echo the arguments back.\n\nUseful for testing.")
}

fn builder() -> ResourceBuilder {
	ResourceBuilder::new(TaskEngine::new(TaskEngineConfig::default()).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
#[traced_test]
async fn inline_action_returns_result() {
	let resource = builder().action_from(echo(), ActionOptions::default()).unwrap();

	assert_eq!(
		resource
			.dispatch(Method::Post, &Request::body(json!({"arg": 5})))
			.unwrap(),
		Response::Value(json!({"arg": 5, "kwarg": "default"}))
	);

	assert!(matches!(
		resource.dispatch(Method::Post, &Request::body(json!({"kwarg": "x"}))),
		Err(ResourceError::Validation(_))
	));
	assert!(matches!(
		resource.dispatch(Method::Get, &Request::default()),
		Err(ResourceError::MethodNotSupported { .. })
	));
}

#[tokio::test(flavor = "multi_thread")]
#[traced_test]
async fn task_action_returns_before_completion() {
	let builder = builder();
	let (release, gate) = mpsc::channel::<()>();
	let gate = Mutex::new(gate);

	let callable = Callable::new("sample.slow_echo", move |ctx, kwargs| {
		ctx.info("waiting for release");
		gate.lock()
			.map_err(ActionError::failed)?
			.recv_timeout(Duration::from_secs(10))
			.map_err(ActionError::failed)?;
		Ok(Value::Object(kwargs))
	})
	.param("arg", TypeHint::Integer)
	.param_with_default("kwarg", TypeHint::String, "default");

	let resource = builder
		.action_from(
			callable,
			ActionOptions {
				task: true,
				..Default::default()
			},
		)
		.unwrap();

	let Response::Task(task) = resource
		.dispatch(Method::Post, &Request::body(json!({"arg": 5})))
		.unwrap()
	else {
		panic!("expected a task");
	};

	let wire = serde_json::to_value(&task).unwrap();
	assert!(wire["id"].is_string());
	assert_eq!(wire["function"], json!("sample.slow_echo"));
	assert!(!task.status.is_terminal());

	let Response::Tasks(tasks) = resource.dispatch(Method::Get, &Request::default()).unwrap()
	else {
		panic!("expected the action's tasks");
	};
	assert_eq!(tasks.len(), 1);
	assert_eq!(tasks[0].id, task.id);

	release.send(()).unwrap();

	let done = builder.engine().wait(task.id).await.unwrap();
	assert_eq!(done.status, TaskStatus::Success);
	assert_eq!(done.return_value, Some(json!({"arg": 5, "kwarg": "default"})));
}

#[tokio::test(flavor = "multi_thread")]
#[traced_test]
async fn inline_failures_surface_to_caller() {
	let callable = Callable::new("sample.broken", |_, _| Err(ActionError::failed("no light source")));

	let resource = builder().action_from(callable, ActionOptions::default()).unwrap();

	assert!(matches!(
		resource.dispatch(Method::Post, &Request::default()),
		Err(ResourceError::Action(ActionError::Failed(reason))) if reason == "no light source"
	));
}

#[tokio::test(flavor = "multi_thread")]
#[traced_test]
async fn task_failures_stay_in_the_task() {
	let builder = builder();
	let callable = Callable::new("sample.broken", |_, _| Err(ActionError::failed("no light source")));

	let resource = builder
		.action_from(
			callable,
			ActionOptions {
				task: true,
				..Default::default()
			},
		)
		.unwrap();

	let Ok(Response::Task(task)) = resource.dispatch(Method::Post, &Request::default()) else {
		panic!("expected a task");
	};

	let done = builder.engine().wait(task.id).await.unwrap();
	assert_eq!(done.status, TaskStatus::Error);
	assert_eq!(done.log.last().unwrap().message, "no light source");
}

#[tokio::test(flavor = "multi_thread")]
async fn descriptor_describes_signature() {
	let resource = builder()
		.action_from(
			echo(),
			ActionOptions {
				safe: true,
				idempotent: true,
				output: Some(SchemaInput::Field(Field::dict())),
				..Default::default()
			},
		)
		.unwrap();

	let descriptor = resource.descriptor();

	assert_eq!(descriptor.kind, ResourceKind::Action);
	assert_eq!(descriptor.target, "sample.echo");
	assert_eq!(descriptor.docs.summary.as_deref(), Some("Echo the arguments back."));
	assert!(descriptor.docs.safe && descriptor.docs.idempotent);
	assert_eq!(descriptor.docs.methods, vec![Method::Post]);
	assert_eq!(
		serde_json::to_value(&descriptor.input_schema).unwrap(),
		json!({
			"type": "object",
			"properties": {
				"arg": {"type": "integer"},
				"kwarg": {"type": "string", "default": "default", "nullable": true}
			},
			"required": ["arg"]
		})
	);
	assert_eq!(
		serde_json::to_value(&descriptor.output_schema).unwrap(),
		json!({"type": "object"})
	);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_descriptor_outputs_task_schema() {
	let resource = builder()
		.action_from(
			echo(),
			ActionOptions {
				task: true,
				..Default::default()
			},
		)
		.unwrap();

	let output = resource.descriptor().output_schema.clone().unwrap();
	let properties = output.properties.unwrap();

	assert!(properties.contains_key("id"));
	assert!(properties.contains_key("function"));
	assert!(properties.contains_key("links"));
	assert_eq!(output.required, vec!["id", "function", "status"]);
	assert_eq!(resource.descriptor().docs.methods, vec![Method::Get, Method::Post]);
}

#[test]
fn inline_invocation_yields_value() {
	let runtime = tokio::runtime::Runtime::new().unwrap();
	let engine =
		TaskEngine::with_runtime(runtime.handle().clone(), TaskEngineConfig::default()).unwrap();

	let resource = thing_resources::action_from(
		Callable::new("sample.sum", |ctx, kwargs| {
			assert!(ctx.task_id().is_none());
			let total = kwargs
				.values()
				.filter_map(Value::as_f64)
				.sum::<f64>();
			Ok(json!(total))
		})
		.param("a", TypeHint::Float)
		.param_with_default("b", TypeHint::Float, 1.5),
		ActionOptions::default(),
		&engine,
	)
	.unwrap();

	assert_eq!(
		resource.invoke(&json!({"a": "2"})).unwrap(),
		ActionOutput::Value(json!(3.5))
	);
	assert!(engine.list().is_empty());
}
