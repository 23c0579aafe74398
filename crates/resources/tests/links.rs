use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use tempfile::tempdir;
use thing_resources::{Extension, LinkConfig, LinkGenerator, ThingConfig, UrlResolver};
use thing_task_system::{RetentionPolicy, TaskEngine, TaskEngineConfig};

struct Routes;

impl UrlResolver for Routes {
	fn url_for(&self, endpoint: &str, params: &Map<String, Value>) -> Option<String> {
		match endpoint {
			"task_detail" => params
				.get("task_id")
				.and_then(Value::as_str)
				.map(|id| format!("/tasks/{id}")),
			"extension_list" => Some("/extensions".to_string()),
			_ => None,
		}
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn task_links_resolve_self() {
	let engine = TaskEngine::new(TaskEngineConfig::default()).unwrap();
	let task = engine.spawn("sample.noop", |_| Ok(json!(null)));

	let links = LinkGenerator::new(Arc::new(Routes), LinkConfig::default());
	let wire = serde_json::to_value(links.task(task.clone())).unwrap();

	assert_eq!(wire["id"], json!(task.id.to_string()));
	assert_eq!(wire["function"], json!("sample.noop"));
	assert_eq!(
		wire["links"],
		json!({"self": {"href": format!("/tasks/{}", task.id), "mimetype": "application/json"}})
	);
}

#[tokio::test(flavor = "multi_thread")]
async fn unresolvable_task_link_is_null() {
	let engine = TaskEngine::new(TaskEngineConfig::default()).unwrap();
	let task = engine.spawn("sample.noop", |_| Ok(json!(null)));

	let links = LinkGenerator::new(
		Arc::new(Routes),
		LinkConfig {
			task_endpoint: "unknown".into(),
			..Default::default()
		},
	);

	let wire = serde_json::to_value(links.task(task)).unwrap();
	assert_eq!(
		wire["links"]["self"],
		json!({"href": null, "mimetype": "application/json"})
	);
}

#[test]
fn extension_sub_views() {
	let mut extension = Extension::new("org.example.stage")
		.with_view("position", "/stage/position")
		.with_view("home", "stage/home");
	extension.title = Some("Stage".into());
	extension
		.views
		.get_mut("position")
		.unwrap()
		.meta
		.insert("description".into(), json!("Current stage position"));

	let links = LinkGenerator::new(Arc::new(Routes), LinkConfig::default());

	assert_eq!(
		serde_json::to_value(links.extension(extension)).unwrap(),
		json!({
			"name": "org.example.stage",
			"title": "Stage",
			"meta": {},
			"links": {
				"position": {
					"href": "/extensions/stage/position",
					"description": "Current stage position"
				},
				"home": {"href": "/extensions/stage/home"}
			}
		})
	);
}

#[test]
fn config_round_trips_through_disk() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("nested/thing.json");

	assert_eq!(ThingConfig::load_from(&path).unwrap(), ThingConfig::default());

	let config = ThingConfig {
		tasks: TaskEngineConfig {
			max_concurrent_tasks: Some(4),
			retention: RetentionPolicy::Ttl { seconds: 600 },
			..Default::default()
		},
		links: LinkConfig {
			task_endpoint: "tasks.detail".into(),
			..Default::default()
		},
	};

	config.save_to(&path).unwrap();
	assert_eq!(ThingConfig::load_from(&path).unwrap(), config);
}

#[test]
fn invalid_config_is_rejected() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("thing.json");
	std::fs::write(&path, r#"{"tasks": {"max_concurrent_tasks": 0}}"#).unwrap();

	assert!(ThingConfig::load_from(&path).is_err());

	std::fs::write(&path, "not json").unwrap();
	assert!(ThingConfig::load_from(&path).is_err());
}
