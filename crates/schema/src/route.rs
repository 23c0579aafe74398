use std::collections::HashSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::error::Error;

/// `<name>` or `<converter:name>`, the converter may carry arguments like `string(length=2)`
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"<(?:([^:<>]+):)?([^<>]+)>").expect("placeholder pattern is a valid regex")
});

/// Kind of converter bound to a route argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converter {
	String,
	Integer,
	Float,
	/// Any converter we don't have a wire mapping for
	Other(String),
}

impl Converter {
	#[must_use]
	pub fn parse(raw: &str) -> Self {
		let kind = raw.split('(').next().unwrap_or_default().trim();

		match kind {
			"" | "default" | "string" | "unicode" => Self::String,
			"int" | "integer" => Self::Integer,
			"float" => Self::Float,
			other => Self::Other(other.to_string()),
		}
	}

	#[must_use]
	pub fn param_schema(&self) -> ParameterSchema {
		match self {
			Self::Integer => ParameterSchema::new(ParamType::Integer).with_format("int32"),
			Self::Float => ParameterSchema::new(ParamType::Number).with_format("float"),
			Self::String | Self::Other(_) => ParameterSchema::new(ParamType::String),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteArgument {
	pub name: String,
	pub converter: Converter,
}

/// Routing metadata handed over by the router: the raw pattern plus the
/// defaults declared for its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRule {
	pattern: String,
	arguments: Vec<RouteArgument>,
	defaults: Map<String, Value>,
}

impl RouteRule {
	/// Extracts the `<[converter:]name>` placeholders of `pattern`. Text outside of a
	/// complete placeholder, stray brackets included, is literal.
	pub fn parse(pattern: impl Into<String>) -> Result<Self, Error> {
		let pattern = pattern.into();
		let invalid = |reason: String| Error::InvalidPattern {
			pattern: pattern.clone(),
			reason,
		};

		let mut seen = HashSet::new();
		let mut arguments = Vec::new();

		for captures in PLACEHOLDER.captures_iter(&pattern) {
			let name = captures
				.get(2)
				.map(|name| name.as_str().trim())
				.unwrap_or_default();

			if name.is_empty() || name.contains(':') {
				return Err(invalid(format!("malformed placeholder name '{name}'")));
			}

			if !seen.insert(name.to_string()) {
				return Err(invalid(format!("duplicated argument '{name}'")));
			}

			arguments.push(RouteArgument {
				name: name.to_string(),
				converter: captures
					.get(1)
					.map_or(Converter::String, |converter| Converter::parse(converter.as_str())),
			});
		}

		Ok(Self {
			pattern,
			arguments,
			defaults: Map::new(),
		})
	}

	#[must_use]
	pub fn with_default(mut self, argument: impl Into<String>, value: impl Into<Value>) -> Self {
		self.defaults.insert(argument.into(), value.into());
		self
	}

	#[must_use]
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	#[must_use]
	pub fn arguments(&self) -> &[RouteArgument] {
		&self.arguments
	}

	#[must_use]
	pub fn default_for(&self, argument: &str) -> Option<&Value> {
		self.defaults.get(argument)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
	Path,
	Query,
	Header,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
	String,
	Integer,
	Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
	#[serde(rename = "type")]
	pub kind: ParamType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub format: Option<String>,
}

impl ParameterSchema {
	#[must_use]
	pub const fn new(kind: ParamType) -> Self {
		Self { kind, format: None }
	}

	#[must_use]
	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}
}

/// Wire description of one request parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
	#[serde(rename = "in")]
	pub location: ParameterLocation,
	pub name: String,
	pub required: bool,
	pub schema: ParameterSchema,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// Caller supplied replacement values for a parameter, applied field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterOverride {
	#[serde(rename = "in", default)]
	pub location: Option<ParameterLocation>,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub required: Option<bool>,
	#[serde(default)]
	pub schema: Option<ParameterSchema>,
	#[serde(default)]
	pub default: Option<Value>,
	#[serde(default)]
	pub description: Option<String>,
}

impl ParameterOverride {
	fn apply(&self, param: &mut Parameter) {
		if let Some(location) = self.location {
			param.location = location;
		}
		if let Some(name) = &self.name {
			param.name.clone_from(name);
		}
		if let Some(required) = self.required {
			param.required = required;
		}
		if let Some(schema) = &self.schema {
			param.schema = schema.clone();
		}
		if let Some(default) = &self.default {
			param.default = Some(default.clone());
		}
		if let Some(description) = &self.description {
			param.description = Some(description.clone());
		}
	}

	fn into_parameter(self, key: &str, location: ParameterLocation) -> Parameter {
		Parameter {
			location,
			name: self.name.unwrap_or_else(|| key.to_string()),
			required: self.required.unwrap_or(false),
			schema: self
				.schema
				.unwrap_or_else(|| ParameterSchema::new(ParamType::String)),
			default: self.default,
			description: self.description,
		}
	}
}

/// Rewrites every `<[converter:]name>` placeholder as `{name}`, keeping the rest of
/// the pattern verbatim.
#[must_use]
pub fn path_template(rule: &RouteRule) -> String {
	PLACEHOLDER
		.replace_all(rule.pattern(), |captures: &regex::Captures<'_>| {
			format!("{{{}}}", captures.get(2).map_or("", |name| name.as_str().trim()))
		})
		.into_owned()
}

/// Parameter descriptors for a rule: one per path argument, then every header or
/// query override that doesn't name a path argument.
#[must_use]
pub fn route_parameters(
	rule: &RouteRule,
	overrides: &IndexMap<String, ParameterOverride>,
) -> Vec<Parameter> {
	let mut params = rule
		.arguments()
		.iter()
		.map(|argument| {
			let mut param = Parameter {
				location: ParameterLocation::Path,
				name: argument.name.clone(),
				required: true,
				schema: argument.converter.param_schema(),
				default: rule.default_for(&argument.name).cloned(),
				description: None,
			};

			if let Some(param_override) = overrides.get(&argument.name) {
				param_override.apply(&mut param);
			}

			param
		})
		.collect::<Vec<_>>();

	for (key, param_override) in overrides {
		if rule.arguments().iter().any(|argument| &argument.name == key) {
			continue;
		}

		match param_override.location {
			Some(location @ (ParameterLocation::Query | ParameterLocation::Header)) => {
				params.push(param_override.clone().into_parameter(key, location));
			}
			_ => debug!(%key, "Ignoring override that matches no path argument"),
		}
	}

	params
}
