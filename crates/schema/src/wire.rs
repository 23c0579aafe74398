use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::{
	error::Error,
	field::{Field, FieldKind},
	schema::Schema,
};

/// Primitive types a wire schema node can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WireType {
	String,
	Integer,
	Number,
	Boolean,
	Array,
	Object,
}

/// Structure-only description of a value exchanged at the boundary, shaped after
/// JSON Schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<WireType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub format: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub default: Option<Value>,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub nullable: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub items: Option<Box<SchemaNode>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub properties: Option<IndexMap<String, SchemaNode>>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub required: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub additional_properties: Option<Box<SchemaNode>>,
}

impl SchemaNode {
	#[must_use]
	pub fn of(kind: WireType) -> Self {
		Self {
			kind: Some(kind),
			..Default::default()
		}
	}

	#[must_use]
	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	#[must_use]
	pub fn with_property(mut self, name: impl Into<String>, node: Self, required: bool) -> Self {
		let name = name.into();
		if required {
			self.required.push(name.clone());
		}
		self.properties
			.get_or_insert_with(IndexMap::new)
			.insert(name, node);
		self
	}
}

/// Anything the translator accepts as a schema description.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaInput {
	Field(Field),
	/// Name to field or nested mapping. A prebuilt schema is not a valid value here,
	/// wrap it with [`Field::nested`] instead.
	Mapping(IndexMap<String, SchemaInput>),
	Schema(Schema),
}

impl SchemaInput {
	const fn shape(&self) -> &'static str {
		match self {
			Self::Field(_) => "field",
			Self::Mapping(_) => "mapping",
			Self::Schema(_) => "schema",
		}
	}
}

impl From<Field> for SchemaInput {
	fn from(field: Field) -> Self {
		Self::Field(field)
	}
}

impl From<Schema> for SchemaInput {
	fn from(schema: Schema) -> Self {
		Self::Schema(schema)
	}
}

impl<K: Into<String>> FromIterator<(K, SchemaInput)> for SchemaInput {
	fn from_iter<T: IntoIterator<Item = (K, SchemaInput)>>(iter: T) -> Self {
		Self::Mapping(
			iter.into_iter()
				.map(|(key, value)| (key.into(), value))
				.collect(),
		)
	}
}

/// Maps one field descriptor to its wire node, recursing into composite fields.
#[must_use]
pub fn field_to_schema(field: &Field) -> SchemaNode {
	let mut node = match &field.kind {
		FieldKind::String => SchemaNode::of(WireType::String),
		FieldKind::Integer => SchemaNode::of(WireType::Integer),
		FieldKind::Float => SchemaNode::of(WireType::Number),
		FieldKind::Boolean => SchemaNode::of(WireType::Boolean),
		FieldKind::DateTime => SchemaNode::of(WireType::String).with_format("date-time"),
		FieldKind::Uuid => SchemaNode::of(WireType::String).with_format("uuid"),
		FieldKind::Raw => SchemaNode::default(),
		FieldKind::List(item) => SchemaNode {
			items: Some(Box::new(field_to_schema(item))),
			..SchemaNode::of(WireType::Array)
		},
		FieldKind::Dict(values) => SchemaNode {
			additional_properties: values
				.as_deref()
				.map(|values| Box::new(field_to_schema(values))),
			..SchemaNode::of(WireType::Object)
		},
		FieldKind::Nested(schema) => schema_to_node(schema),
	};

	node.description.clone_from(&field.description);
	node.default.clone_from(&field.default);
	node.nullable = field.allow_none;

	node
}

fn schema_to_node(schema: &Schema) -> SchemaNode {
	schema
		.fields()
		.fold(SchemaNode::of(WireType::Object), |node, (name, field)| {
			node.with_property(name, field_to_schema(field), field.required)
		})
}

/// Builds a [`Schema`] out of a mapping, synthesizing a nested schema for every
/// nested mapping value.
pub fn map_to_schema(mapping: &IndexMap<String, SchemaInput>) -> Result<Schema, Error> {
	mapping
		.iter()
		.map(|(key, value)| match value {
			SchemaInput::Field(field) => Ok((key.clone(), field.clone())),
			SchemaInput::Mapping(nested) => {
				trace!(%key, "Synthesizing nested schema for mapping value");
				map_to_schema(nested).map(|schema| (key.clone(), Field::nested(schema)))
			}
			other @ SchemaInput::Schema(_) => Err(Error::TypeMismatch {
				key: key.clone(),
				found: other.shape(),
			}),
		})
		.collect()
}

/// Reduces any accepted input to a single field: fields pass through, mappings and
/// schemas become a nested field.
pub fn normalize_to_schema(input: &SchemaInput) -> Result<Field, Error> {
	match input {
		SchemaInput::Field(field) => Ok(field.clone()),
		SchemaInput::Mapping(mapping) => map_to_schema(mapping).map(Field::nested),
		SchemaInput::Schema(schema) => Ok(Field::nested(schema.clone())),
	}
}

/// Fully expanded wire schema for a field, mapping or schema; structure only.
pub fn to_wire_schema(input: &SchemaInput) -> Result<SchemaNode, Error> {
	normalize_to_schema(input).map(|field| field_to_schema(&field))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[test]
	fn field_nodes() {
		assert_eq!(
			serde_json::to_value(field_to_schema(&Field::integer().required())).unwrap(),
			json!({"type": "integer"})
		);
		assert_eq!(
			serde_json::to_value(field_to_schema(&Field::string().with_default("x"))).unwrap(),
			json!({"type": "string", "default": "x", "nullable": true})
		);
		assert_eq!(
			serde_json::to_value(field_to_schema(&Field::list(Field::date_time()))).unwrap(),
			json!({"type": "array", "items": {"type": "string", "format": "date-time"}})
		);
		assert_eq!(
			serde_json::to_value(field_to_schema(&Field::dict_of(Field::float()))).unwrap(),
			json!({"type": "object", "additionalProperties": {"type": "number"}})
		);
	}

	#[test]
	fn nested_mappings_are_expanded() {
		let input: SchemaInput = [
			("name", SchemaInput::Field(Field::string().required())),
			(
				"position",
				[
					("x", SchemaInput::Field(Field::float().required())),
					("y", SchemaInput::Field(Field::float())),
				]
				.into_iter()
				.collect(),
			),
		]
		.into_iter()
		.collect();

		assert_eq!(
			serde_json::to_value(to_wire_schema(&input).unwrap()).unwrap(),
			json!({
				"type": "object",
				"properties": {
					"name": {"type": "string"},
					"position": {
						"type": "object",
						"properties": {
							"x": {"type": "number"},
							"y": {"type": "number"}
						},
						"required": ["x"]
					}
				},
				"required": ["name"]
			})
		);
	}

	#[test]
	fn schema_inside_mapping_is_a_type_mismatch() {
		let input: SchemaInput = [("inner", SchemaInput::Schema(Schema::new()))]
			.into_iter()
			.collect();

		assert!(matches!(
			to_wire_schema(&input),
			Err(Error::TypeMismatch { key, found: "schema" }) if key == "inner"
		));
	}

	#[test]
	fn field_and_schema_inputs_agree() {
		let schema = Schema::new().with_field("a", Field::boolean());

		assert_eq!(
			to_wire_schema(&SchemaInput::Schema(schema.clone())).unwrap(),
			to_wire_schema(&SchemaInput::Field(Field::nested(schema))).unwrap()
		);
	}
}
