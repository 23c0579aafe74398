use chrono::DateTime;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::{
	error::{ValidationErrors, NULL_MESSAGE},
	schema::Schema,
};

const TRUTHY: &[&str] = &["true", "t", "yes", "y", "on", "1"];
const FALSY: &[&str] = &["false", "f", "no", "n", "off", "0"];

/// Exact `i64` value of a whole float, `None` when it has a fraction or lies outside
/// the `i64` range.
#[allow(clippy::cast_possible_truncation)]
fn whole_i64(float: f64) -> Option<i64> {
	// 2^63, exactly representable as a float
	const BOUND: f64 = 9_223_372_036_854_775_808.0;

	(float.fract() == 0.0 && (-BOUND..BOUND).contains(&float)).then(|| float as i64)
}

/// What a [`Field`] holds
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
	String,
	Integer,
	Float,
	Boolean,
	/// RFC 3339 timestamp carried as a string
	DateTime,
	Uuid,
	/// Any JSON value, passed through untouched
	Raw,
	List(Box<Field>),
	/// A free-form mapping, optionally constraining every value to one field type
	Dict(Option<Box<Field>>),
	Nested(Schema),
}

impl FieldKind {
	/// Human readable name used in validation messages
	#[must_use]
	pub const fn name(&self) -> &'static str {
		match self {
			Self::String => "string",
			Self::Integer => "integer",
			Self::Float => "number",
			Self::Boolean => "boolean",
			Self::DateTime => "datetime",
			Self::Uuid => "UUID",
			Self::Raw => "value",
			Self::List(_) => "list",
			Self::Dict(_) | Self::Nested(_) => "mapping",
		}
	}

	fn invalid(&self) -> ValidationErrors {
		ValidationErrors::single(format!("Not a valid {}.", self.name()))
	}

	fn deserialize(&self, value: &Value) -> Result<Value, ValidationErrors> {
		match (self, value) {
			(Self::Raw, value) => Ok(value.clone()),

			(Self::String, Value::String(_)) => Ok(value.clone()),

			(Self::Integer, Value::Number(number)) => number
				.as_i64()
				.map(Value::from)
				.or_else(|| number.as_u64().map(Value::from))
				.or_else(|| number.as_f64().and_then(whole_i64).map(Value::from))
				.ok_or_else(|| self.invalid()),
			(Self::Integer, Value::String(text)) => text
				.trim()
				.parse::<i64>()
				.map(Value::from)
				.map_err(|_| self.invalid()),

			(Self::Float, Value::Number(number)) => number
				.as_f64()
				.and_then(Number::from_f64)
				.map(Value::Number)
				.ok_or_else(|| self.invalid()),
			(Self::Float, Value::String(text)) => text
				.trim()
				.parse::<f64>()
				.ok()
				.and_then(Number::from_f64)
				.map(Value::Number)
				.ok_or_else(|| self.invalid()),

			(Self::Boolean, Value::Bool(_)) => Ok(value.clone()),
			(Self::Boolean, Value::String(text)) => {
				let text = text.trim().to_lowercase();
				if TRUTHY.contains(&text.as_str()) {
					Ok(Value::Bool(true))
				} else if FALSY.contains(&text.as_str()) {
					Ok(Value::Bool(false))
				} else {
					Err(self.invalid())
				}
			}
			(Self::Boolean, Value::Number(number)) => match number.as_i64() {
				Some(1) => Ok(Value::Bool(true)),
				Some(0) => Ok(Value::Bool(false)),
				_ => Err(self.invalid()),
			},

			(Self::DateTime, Value::String(text)) => DateTime::parse_from_rfc3339(text)
				.map(|datetime| Value::String(datetime.to_rfc3339()))
				.map_err(|_| self.invalid()),

			(Self::Uuid, Value::String(text)) => Uuid::parse_str(text)
				.map(|uuid| Value::String(uuid.hyphenated().to_string()))
				.map_err(|_| self.invalid()),

			(Self::List(item), Value::Array(items)) => {
				let mut errors = ValidationErrors::default();
				let mut out = Vec::with_capacity(items.len());

				for (idx, value) in items.iter().enumerate() {
					match item.deserialize(value) {
						Ok(value) => out.push(value),
						Err(e) => errors.nest(&idx.to_string(), e),
					}
				}

				if errors.is_empty() {
					Ok(Value::Array(out))
				} else {
					Err(errors)
				}
			}

			(Self::Dict(None), Value::Object(_)) => Ok(value.clone()),
			(Self::Dict(Some(values)), Value::Object(map)) => {
				let mut errors = ValidationErrors::default();
				let mut out = Map::with_capacity(map.len());

				for (key, value) in map {
					match values.deserialize(value) {
						Ok(value) => {
							out.insert(key.clone(), value);
						}
						Err(e) => errors.nest(key, e),
					}
				}

				if errors.is_empty() {
					Ok(Value::Object(out))
				} else {
					Err(errors)
				}
			}

			(Self::Nested(schema), value) => schema.load(value, false).map(Value::Object),

			_ => Err(self.invalid()),
		}
	}
}

/// Descriptor of one typed value, the unit every schema is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
	pub kind: FieldKind,
	pub required: bool,
	pub allow_none: bool,
	pub default: Option<Value>,
	pub description: Option<String>,
}

impl Field {
	#[must_use]
	pub const fn new(kind: FieldKind) -> Self {
		Self {
			kind,
			required: false,
			allow_none: false,
			default: None,
			description: None,
		}
	}

	#[must_use]
	pub const fn string() -> Self {
		Self::new(FieldKind::String)
	}

	#[must_use]
	pub const fn integer() -> Self {
		Self::new(FieldKind::Integer)
	}

	#[must_use]
	pub const fn float() -> Self {
		Self::new(FieldKind::Float)
	}

	#[must_use]
	pub const fn boolean() -> Self {
		Self::new(FieldKind::Boolean)
	}

	#[must_use]
	pub const fn date_time() -> Self {
		Self::new(FieldKind::DateTime)
	}

	#[must_use]
	pub const fn uuid() -> Self {
		Self::new(FieldKind::Uuid)
	}

	#[must_use]
	pub const fn raw() -> Self {
		Self::new(FieldKind::Raw)
	}

	#[must_use]
	pub fn list(item: Self) -> Self {
		Self::new(FieldKind::List(Box::new(item)))
	}

	#[must_use]
	pub const fn dict() -> Self {
		Self::new(FieldKind::Dict(None))
	}

	#[must_use]
	pub fn dict_of(values: Self) -> Self {
		Self::new(FieldKind::Dict(Some(Box::new(values))))
	}

	#[must_use]
	pub const fn nested(schema: Schema) -> Self {
		Self::new(FieldKind::Nested(schema))
	}

	#[must_use]
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	#[must_use]
	pub fn allow_none(mut self) -> Self {
		self.allow_none = true;
		self
	}

	/// Sets a default value, which also makes the field optional and nullable.
	#[must_use]
	pub fn with_default(mut self, default: impl Into<Value>) -> Self {
		self.default = Some(default.into());
		self.required = false;
		self.allow_none = true;
		self
	}

	#[must_use]
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Derives an optional, nullable descriptor from a sample value.
	///
	/// Arrays take their item type from the first element, mappings are inferred
	/// key by key into a nested schema.
	#[must_use]
	pub fn infer(value: &Value) -> Self {
		let field = match value {
			Value::Null => Self::raw(),
			Value::Bool(_) => Self::boolean(),
			Value::Number(number) if number.is_f64() => Self::float(),
			Value::Number(_) => Self::integer(),
			Value::String(_) => Self::string(),
			Value::Array(items) => Self::list(items.first().map_or_else(Self::raw, Self::infer)),
			Value::Object(map) => Self::nested(Schema::infer(map)),
		};

		field.allow_none()
	}

	/// Validates and coerces an incoming value.
	pub fn deserialize(&self, value: &Value) -> Result<Value, ValidationErrors> {
		if value.is_null() {
			return if self.allow_none {
				Ok(Value::Null)
			} else {
				Err(ValidationErrors::single(NULL_MESSAGE))
			};
		}

		self.kind.deserialize(value)
	}

	/// Encodes an outgoing value. Never fails: values that can't be coerced are
	/// passed through, except for string fields which fall back to the JSON text.
	#[must_use]
	pub fn serialize(&self, value: &Value) -> Value {
		match (&self.kind, value) {
			(_, Value::Null) => Value::Null,
			(FieldKind::Nested(schema), Value::Object(map)) => Value::Object(schema.dump(map)),
			(FieldKind::List(item), Value::Array(items)) => {
				Value::Array(items.iter().map(|value| item.serialize(value)).collect())
			}
			(FieldKind::Dict(Some(values)), Value::Object(map)) => Value::Object(
				map.iter()
					.map(|(key, value)| (key.clone(), values.serialize(value)))
					.collect(),
			),
			(FieldKind::String, Value::String(_)) => value.clone(),
			(FieldKind::String, other) => Value::String(other.to_string()),
			(kind, value) => kind.deserialize(value).unwrap_or_else(|_| value.clone()),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn integer_coercion() {
		let field = Field::integer();

		assert_eq!(field.deserialize(&json!(5)).unwrap(), json!(5));
		assert_eq!(field.deserialize(&json!("12")).unwrap(), json!(12));
		assert_eq!(field.deserialize(&json!(3.0)).unwrap(), json!(3));
		assert!(field.deserialize(&json!(3.5)).is_err());
		assert!(field.deserialize(&json!(1e30)).is_err());
		assert!(field.deserialize(&json!(-1e19)).is_err());
		assert_eq!(field.deserialize(&json!(-4096.0)).unwrap(), json!(-4096));
		assert!(field.deserialize(&json!("abc")).is_err());
		assert!(field.deserialize(&json!(true)).is_err());
	}

	#[test]
	fn null_handling() {
		assert_eq!(
			Field::string().deserialize(&Value::Null).unwrap_err().messages(""),
			Some(&[NULL_MESSAGE.to_string()][..])
		);
		assert_eq!(
			Field::string()
				.allow_none()
				.deserialize(&Value::Null)
				.unwrap(),
			Value::Null
		);
	}

	#[test]
	fn list_errors_are_indexed() {
		let errors = Field::list(Field::integer())
			.deserialize(&json!([1, "x", 3, []]))
			.unwrap_err();

		assert!(errors.messages("1").is_some());
		assert!(errors.messages("3").is_some());
		assert!(errors.messages("0").is_none());
	}

	#[test]
	fn boolean_strings() {
		let field = Field::boolean();
		assert_eq!(field.deserialize(&json!("Yes")).unwrap(), json!(true));
		assert_eq!(field.deserialize(&json!("off")).unwrap(), json!(false));
		assert!(field.deserialize(&json!("maybe")).is_err());
	}

	#[test]
	fn serialize_string_falls_back_to_text() {
		assert_eq!(Field::string().serialize(&json!(42)), json!("42"));
		assert_eq!(Field::integer().serialize(&json!("nope")), json!("nope"));
		assert_eq!(Field::float().serialize(&json!("2.5")), json!(2.5));
	}

	#[test]
	fn infer_from_sample() {
		assert_eq!(Field::infer(&json!(1)).kind, FieldKind::Integer);
		assert_eq!(Field::infer(&json!(1.5)).kind, FieldKind::Float);
		assert_eq!(
			Field::infer(&json!(["a"])).kind,
			FieldKind::List(Box::new(Field::string().allow_none()))
		);

		let inferred = Field::infer(&json!({"a": 1}));
		let FieldKind::Nested(schema) = inferred.kind else {
			panic!("expected a nested schema");
		};
		assert_eq!(schema.get("a"), Some(&Field::integer().allow_none()));
	}
}
