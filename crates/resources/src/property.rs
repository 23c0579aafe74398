use std::{fmt, sync::Arc};

use serde_json::Value;
use thing_schema::{field_to_schema, Field, Schema, VirtualSchema};
use tracing::{debug, instrument, trace};

use super::{
	attributes::Attributes,
	descriptor::{Method, ResourceDescriptor, ResourceDocs, ResourceKind},
	error::ResourceError,
};

#[derive(Debug, Clone, Default)]
pub struct PropertyOptions {
	pub readonly: bool,
	pub name: Option<String>,
	pub description: Option<String>,
}

/// Schema inferred from the attribute value found at build time
#[derive(Debug, Clone)]
enum PropertySchema {
	Mapping(Schema),
	Scalar(VirtualSchema),
}

impl PropertySchema {
	fn infer(value: &Value) -> Self {
		match value {
			Value::Object(map) => Self::Mapping(Schema::infer(map)),
			other => Self::Scalar(VirtualSchema::new(Field::infer(other))),
		}
	}

	fn field(&self) -> Field {
		match self {
			Self::Mapping(schema) => Field::nested(schema.clone()),
			Self::Scalar(schema) => schema.field().clone(),
		}
	}
}

/// A resource reading, and unless read-only writing, one attribute of a target.
pub struct PropertyResource {
	target: Arc<dyn Attributes>,
	attribute: String,
	schema: PropertySchema,
	readonly: bool,
	descriptor: ResourceDescriptor,
}

impl fmt::Debug for PropertyResource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PropertyResource")
			.field("attribute", &self.attribute)
			.field("schema", &self.schema)
			.field("readonly", &self.readonly)
			.finish_non_exhaustive()
	}
}

/// Builds a property resource over `target.attribute`.
///
/// The attribute has to exist: its current value decides whether the property is a
/// mapping or a scalar, and which field types its payloads are checked against.
#[instrument(skip(target, options), fields(resource = %attribute), err)]
pub fn property_of(
	target: Arc<dyn Attributes>,
	attribute: &str,
	options: PropertyOptions,
) -> Result<PropertyResource, ResourceError> {
	let current = target
		.get_attribute(attribute)
		.ok_or_else(|| ResourceError::AttributeNotFound(attribute.to_string()))?;

	let schema = PropertySchema::infer(&current);
	let node = field_to_schema(&schema.field());

	let mut docs = ResourceDocs::new(options.name, options.description);
	docs.safe = options.readonly;
	docs.idempotent = true;
	docs.tags = vec!["properties".to_string()];
	docs.methods = if options.readonly {
		vec![Method::Get]
	} else {
		vec![Method::Get, Method::Put, Method::Post]
	};

	debug!(readonly = options.readonly, "Built property resource");

	Ok(PropertyResource {
		descriptor: ResourceDescriptor {
			kind: ResourceKind::Property,
			target: attribute.to_string(),
			input_schema: (!options.readonly).then(|| node.clone()),
			output_schema: Some(node),
			docs,
		},
		target,
		attribute: attribute.to_string(),
		schema,
		readonly: options.readonly,
	})
}

impl PropertyResource {
	#[must_use]
	pub const fn descriptor(&self) -> &ResourceDescriptor {
		&self.descriptor
	}

	fn current(&self) -> Result<Value, ResourceError> {
		self.target
			.get_attribute(&self.attribute)
			.ok_or_else(|| ResourceError::AttributeNotFound(self.attribute.clone()))
	}

	/// Current value: a mapping comes back whole, a scalar goes through its virtual schema.
	pub fn read(&self) -> Result<Value, ResourceError> {
		let current = self.current()?;

		Ok(match (&self.schema, current) {
			(PropertySchema::Scalar(schema), value) => schema.dump(&value),
			(PropertySchema::Mapping(_), value) => value,
		})
	}

	/// Write access, `None` for a read-only property.
	#[must_use]
	pub const fn writer(&self) -> Option<PropertyWriter<'_>> {
		if self.readonly {
			None
		} else {
			Some(PropertyWriter { property: self })
		}
	}
}

/// Mutating half of a [`PropertyResource`], only handed out for writable properties.
#[derive(Debug, Clone, Copy)]
pub struct PropertyWriter<'property> {
	property: &'property PropertyResource,
}

impl PropertyWriter<'_> {
	/// Decodes `payload` and overwrites the attribute wholesale, returning the new value.
	/// Keys of a mapping left out of `payload` are gone afterwards.
	#[instrument(skip_all, fields(resource = %self.property.attribute), err)]
	pub fn replace(&self, payload: &Value) -> Result<Value, ResourceError> {
		let value = match &self.property.schema {
			PropertySchema::Mapping(schema) => Value::Object(schema.load(payload, false)?),
			PropertySchema::Scalar(schema) => schema.deserialize(payload)?,
		};

		self.property
			.target
			.set_attribute(&self.property.attribute, value)?;
		trace!("Replaced property value");

		self.property.read()
	}

	/// Partial update.
	///
	/// When the attribute currently holds a mapping, only the keys present in `payload`
	/// are merged into it and just that subset is returned. For any other value this is
	/// exactly [`PropertyWriter::replace`].
	#[instrument(skip_all, fields(resource = %self.property.attribute), err)]
	pub fn update(&self, payload: &Value) -> Result<Value, ResourceError> {
		let PropertySchema::Mapping(schema) = &self.property.schema else {
			trace!("Property isn't a mapping, updating as a full replace");
			return self.replace(payload);
		};

		let updates = schema.load(payload, true)?;

		let mut merged = false;
		self.property
			.target
			.update_attribute(&self.property.attribute, &mut |current| {
				if let Value::Object(current) = current {
					current.extend(updates.clone());
					merged = true;
				}
				Ok(())
			})?;

		if !merged {
			trace!("Property no longer holds a mapping, updating as a full replace");
			return self.replace(payload);
		}

		trace!(keys = updates.len(), "Merged property update");

		Ok(Value::Object(updates))
	}
}
