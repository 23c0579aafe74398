use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{
	error::{ValidationErrors, INVALID_INPUT_MESSAGE, MISSING_MESSAGE, UNKNOWN_MESSAGE},
	field::Field,
};

/// An ordered set of named fields describing a structured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
	fields: IndexMap<String, Field>,
}

impl Schema {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_field(mut self, name: impl Into<String>, field: Field) -> Self {
		self.insert(name, field);
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, field: Field) {
		self.fields.insert(name.into(), field);
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Field> {
		self.fields.get(name)
	}

	pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
		self.fields
			.iter()
			.map(|(name, field)| (name.as_str(), field))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Builds a schema whose fields mirror the keys of a sample mapping.
	#[must_use]
	pub fn infer(sample: &Map<String, Value>) -> Self {
		sample
			.iter()
			.map(|(key, value)| (key.clone(), Field::infer(value)))
			.collect()
	}

	/// Decodes a request payload.
	///
	/// Unknown keys are rejected. With `partial` set, missing fields are neither
	/// reported nor filled with their defaults, so only the keys present in the
	/// payload come back.
	pub fn load(&self, payload: &Value, partial: bool) -> Result<Map<String, Value>, ValidationErrors> {
		let Value::Object(input) = payload else {
			return Err(ValidationErrors::single(INVALID_INPUT_MESSAGE));
		};

		let mut errors = ValidationErrors::default();
		let mut out = Map::with_capacity(self.fields.len());

		for key in input.keys().filter(|key| !self.fields.contains_key(*key)) {
			errors.add(key.clone(), UNKNOWN_MESSAGE);
		}

		for (name, field) in &self.fields {
			match input.get(name) {
				Some(value) => match field.deserialize(value) {
					Ok(value) => {
						out.insert(name.clone(), value);
					}
					Err(e) => errors.nest(name, e),
				},

				None if partial => {}

				None => {
					if let Some(default) = &field.default {
						out.insert(name.clone(), default.clone());
					} else if field.required {
						errors.add(name.clone(), MISSING_MESSAGE);
					}
				}
			}
		}

		if errors.is_empty() {
			Ok(out)
		} else {
			Err(errors)
		}
	}

	/// Encodes the declared fields present in `value`, dropping everything else.
	#[must_use]
	pub fn dump(&self, value: &Map<String, Value>) -> Map<String, Value> {
		self.fields
			.iter()
			.filter_map(|(name, field)| {
				value
					.get(name)
					.map(|value| (name.clone(), field.serialize(value)))
			})
			.collect()
	}
}

impl FromIterator<(String, Field)> for Schema {
	fn from_iter<T: IntoIterator<Item = (String, Field)>>(iter: T) -> Self {
		Self {
			fields: iter.into_iter().collect(),
		}
	}
}

/// "Virtual schema" letting a bare value go through the same typed machinery as a
/// structured object: the value is treated as the single attribute of an anonymous
/// container.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualSchema {
	field: Field,
	container: Schema,
}

impl VirtualSchema {
	const ATTRIBUTE: &'static str = "value";

	#[must_use]
	pub fn new(field: Field) -> Self {
		Self {
			container: Schema::new().with_field(Self::ATTRIBUTE, field.clone()),
			field,
		}
	}

	#[must_use]
	pub const fn field(&self) -> &Field {
		&self.field
	}

	/// Decodes a bare value; any validation message is reported on the empty path.
	pub fn deserialize(&self, value: &Value) -> Result<Value, ValidationErrors> {
		self.field.deserialize(value)
	}

	#[must_use]
	pub fn serialize(&self, value: &Value) -> Value {
		let mut container = Map::with_capacity(1);
		container.insert(Self::ATTRIBUTE.to_string(), value.clone());

		self.container
			.dump(&container)
			.remove(Self::ATTRIBUTE)
			.unwrap_or(Value::Null)
	}

	#[must_use]
	pub fn dump(&self, value: &Value) -> Value {
		self.serialize(value)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	fn sample() -> Schema {
		Schema::new()
			.with_field("arg", Field::integer().required())
			.with_field("kwarg", Field::string().with_default("default"))
	}

	#[test]
	fn load_fills_defaults() {
		let loaded = sample().load(&json!({"arg": 5}), false).unwrap();

		assert_eq!(Value::Object(loaded), json!({"arg": 5, "kwarg": "default"}));
	}

	#[test]
	fn load_reports_missing_and_unknown() {
		let errors = sample().load(&json!({"other": 1}), false).unwrap_err();

		assert_eq!(
			errors.messages("arg"),
			Some(&[MISSING_MESSAGE.to_string()][..])
		);
		assert_eq!(
			errors.messages("other"),
			Some(&[UNKNOWN_MESSAGE.to_string()][..])
		);
	}

	#[test]
	fn partial_load_keeps_only_present_keys() {
		let loaded = sample().load(&json!({"kwarg": "x"}), true).unwrap();

		assert_eq!(Value::Object(loaded), json!({"kwarg": "x"}));
	}

	#[test]
	fn load_rejects_non_objects() {
		assert!(sample().load(&json!([1, 2]), false).is_err());
	}

	#[test]
	fn dump_drops_undeclared_keys() {
		let map = json!({"arg": "7", "extra": true});
		let Value::Object(map) = map else { unreachable!() };

		assert_eq!(Value::Object(sample().dump(&map)), json!({"arg": 7}));
	}

	#[test]
	fn virtual_schema_round_trips_scalars() {
		let schema = VirtualSchema::new(Field::float());

		assert_eq!(schema.serialize(&json!("1.5")), json!(1.5));
		assert_eq!(schema.deserialize(&json!(2)).unwrap(), json!(2.0));
		assert!(schema.deserialize(&json!("two")).is_err());
	}
}
