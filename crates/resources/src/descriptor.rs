use serde::Serialize;
use thing_schema::SchemaNode;

/// Request verbs a generated resource can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
	Get,
	Put,
	Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
	Property,
	Action,
	Static,
}

/// Documentation attached to a generated resource. Never consulted by dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceDocs {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub summary: Option<String>,
	pub safe: bool,
	pub idempotent: bool,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
	pub methods: Vec<Method>,
}

impl ResourceDocs {
	pub(crate) fn new(name: Option<String>, description: Option<String>) -> Self {
		Self {
			summary: description.as_deref().and_then(summary_of),
			name,
			description,
			..Default::default()
		}
	}
}

/// First non blank line of a description
fn summary_of(description: &str) -> Option<String> {
	description
		.lines()
		.map(str::trim)
		.find(|line| !line.is_empty())
		.map(ToString::to_string)
}

/// Build-time output of the resource builder, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDescriptor {
	pub kind: ResourceKind,
	/// Backing attribute name, callable name or static base directory
	pub target: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub input_schema: Option<SchemaNode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub output_schema: Option<SchemaNode>,
	pub docs: ResourceDocs,
}

impl ResourceDescriptor {
	#[must_use]
	pub fn allows(&self, method: Method) -> bool {
		self.docs.methods.contains(&method)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn summary_is_first_meaningful_line() {
		let docs = ResourceDocs::new(None, Some("\n  Move the stage.\n\n  Blocks until done.".into()));

		assert_eq!(docs.summary.as_deref(), Some("Move the stage."));
		assert_eq!(ResourceDocs::new(None, None).summary, None);
	}
}
