use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use thing_task_system::TaskSnapshot;
use tracing::debug;

use super::config::LinkConfig;

/// Maps an endpoint identifier plus its parameters to a URL, or `None` if it can't.
pub trait UrlResolver: Send + Sync {
	fn url_for(&self, endpoint: &str, params: &Map<String, Value>) -> Option<String>;
}

impl<F> UrlResolver for F
where
	F: Fn(&str, &Map<String, Value>) -> Option<String> + Send + Sync,
{
	fn url_for(&self, endpoint: &str, params: &Map<String, Value>) -> Option<String> {
		self(endpoint, params)
	}
}

/// Hyperlink metadata for one relation. A `None` href means the URL couldn't be
/// resolved, which is a valid outcome and serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
	pub href: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mimetype: Option<String>,
	#[serde(flatten)]
	pub meta: Map<String, Value>,
}

pub type Links = IndexMap<String, Link>;

/// A named sub-view of an [`Extension`], mounted below the extension list endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionView {
	pub rule: String,
	#[serde(skip_serializing_if = "Map::is_empty")]
	pub meta: Map<String, Value>,
}

/// A bundle of extra views grouped under one name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extension {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	pub meta: Map<String, Value>,
	#[serde(skip)]
	pub views: IndexMap<String, ExtensionView>,
}

impl Extension {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			title: None,
			description: None,
			meta: Map::new(),
			views: IndexMap::new(),
		}
	}

	#[must_use]
	pub fn with_view(mut self, name: impl Into<String>, rule: impl Into<String>) -> Self {
		self.views.insert(
			name.into(),
			ExtensionView {
				rule: rule.into(),
				meta: Map::new(),
			},
		);
		self
	}
}

/// A serialized entity together with its links
#[derive(Debug, Clone, Serialize)]
pub struct WithLinks<T> {
	#[serde(flatten)]
	pub entity: T,
	pub links: Links,
}

/// Computes links right before an entity is serialized. Never fails: whatever can't be
/// resolved gets a `null` href.
#[derive(Clone)]
pub struct LinkGenerator {
	resolver: Arc<dyn UrlResolver>,
	config: LinkConfig,
}

impl fmt::Debug for LinkGenerator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LinkGenerator")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl LinkGenerator {
	pub fn new(resolver: Arc<dyn UrlResolver>, config: LinkConfig) -> Self {
		Self { resolver, config }
	}

	fn resolve(&self, endpoint: &str, params: &Map<String, Value>) -> Option<String> {
		let url = self.resolver.url_for(endpoint, params);
		if url.is_none() {
			debug!(%endpoint, ?params, "Couldn't resolve URL, linking to null");
		}

		url
	}

	#[must_use]
	pub fn task_links(&self, task: &TaskSnapshot) -> Links {
		let mut params = Map::with_capacity(1);
		params.insert(
			self.config.task_id_param.clone(),
			Value::String(task.id.to_string()),
		);

		[(
			"self".to_string(),
			Link {
				href: self.resolve(&self.config.task_endpoint, &params),
				mimetype: Some(self.config.task_mimetype.clone()),
				meta: Map::new(),
			},
		)]
		.into_iter()
		.collect()
	}

	#[must_use]
	pub fn task(&self, task: TaskSnapshot) -> WithLinks<TaskSnapshot> {
		WithLinks {
			links: self.task_links(&task),
			entity: task,
		}
	}

	/// One link per sub-view: the extension list URL joined with the view's rule.
	#[must_use]
	pub fn extension_links(&self, extension: &Extension) -> Links {
		let base = self.resolve(&self.config.extension_list_endpoint, &Map::new());

		extension
			.views
			.iter()
			.map(|(name, view)| {
				let href = base.as_deref().map(|base| {
					format!(
						"{}/{}",
						base.trim_end_matches('/'),
						view.rule.trim_start_matches('/')
					)
				});

				(
					name.clone(),
					Link {
						href,
						mimetype: None,
						meta: view.meta.clone(),
					},
				)
			})
			.collect()
	}

	#[must_use]
	pub fn extension(&self, extension: Extension) -> WithLinks<Extension> {
		WithLinks {
			links: self.extension_links(&extension),
			entity: extension,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	fn generator(resolver: impl UrlResolver + 'static) -> LinkGenerator {
		LinkGenerator::new(Arc::new(resolver), LinkConfig::default())
	}

	#[test]
	fn unresolvable_extension_views_link_to_null() {
		let links = generator(|_: &str, _: &Map<String, Value>| -> Option<String> { None }).extension_links(
			&Extension::new("org.example.camera")
				.with_view("snapshot", "/camera/snapshot")
				.with_view("stream", "/camera/stream"),
		);

		assert_eq!(
			serde_json::to_value(links).unwrap(),
			json!({"snapshot": {"href": null}, "stream": {"href": null}})
		);
	}

	#[test]
	fn extension_views_join_list_url() {
		let links = generator(|endpoint: &str, _: &Map<String, Value>| -> Option<String> {
			(endpoint == "extension_list").then(|| "/extensions/".to_string())
		})
		.extension_links(&Extension::new("org.example.camera").with_view("snapshot", "/camera/snapshot"));

		assert_eq!(
			links["snapshot"].href.as_deref(),
			Some("/extensions/camera/snapshot")
		);
	}
}
