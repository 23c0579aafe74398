use std::collections::HashSet;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use super::error::ResourceError;

/// Something exposing named values, the stand-in for an object's attributes.
pub trait Attributes: Send + Sync {
	fn get_attribute(&self, name: &str) -> Option<Value>;

	fn set_attribute(&self, name: &str, value: Value) -> Result<(), ResourceError>;

	/// Read-modify-write of one value. No other write to the attribute may land between
	/// reading the current value and storing what `update` left in it.
	fn update_attribute(
		&self,
		name: &str,
		update: &mut dyn FnMut(&mut Value) -> Result<(), ResourceError>,
	) -> Result<(), ResourceError>;
}

/// In-memory [`Attributes`] implementation.
#[derive(Debug, Default)]
pub struct AttributeStore {
	values: RwLock<IndexMap<String, Value>>,
	readonly: HashSet<String>,
}

impl AttributeStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.values.write().insert(name.into(), value.into());
		self
	}

	/// Adds a value that [`Attributes::set_attribute`] refuses to overwrite.
	#[must_use]
	pub fn with_readonly(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		let name = name.into();
		self.readonly.insert(name.clone());
		self.with(name, value)
	}
}

impl Attributes for AttributeStore {
	fn get_attribute(&self, name: &str) -> Option<Value> {
		self.values.read().get(name).cloned()
	}

	fn set_attribute(&self, name: &str, mut value: Value) -> Result<(), ResourceError> {
		self.update_attribute(name, &mut |slot| {
			*slot = value.take();
			Ok(())
		})
	}

	fn update_attribute(
		&self,
		name: &str,
		update: &mut dyn FnMut(&mut Value) -> Result<(), ResourceError>,
	) -> Result<(), ResourceError> {
		if self.readonly.contains(name) {
			return Err(ResourceError::ReadOnlyAttribute(name.to_string()));
		}

		let mut values = self.values.write();
		let slot = values
			.get_mut(name)
			.ok_or_else(|| ResourceError::AttributeNotFound(name.to_string()))?;

		// A failed update leaves the stored value untouched
		let mut updated = slot.clone();
		update(&mut updated)?;
		*slot = updated;

		Ok(())
	}
}
