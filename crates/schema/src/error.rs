use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use thiserror::Error;

pub(crate) const NULL_MESSAGE: &str = "Field may not be null.";
pub(crate) const MISSING_MESSAGE: &str = "Missing data for required field.";
pub(crate) const UNKNOWN_MESSAGE: &str = "Unknown field.";
pub(crate) const INVALID_INPUT_MESSAGE: &str = "Invalid input type.";

#[derive(Debug, Error)]
pub enum Error {
	#[error("invalid schema type for <key='{key}'>: expected a field or a mapping, found a {found}")]
	TypeMismatch { key: String, found: &'static str },
	#[error("invalid route pattern <pattern='{pattern}'>: {reason}")]
	InvalidPattern { pattern: String, reason: String },
	#[error(transparent)]
	Validation(#[from] ValidationErrors),
}

/// Validation messages keyed by the dotted path of the offending value.
///
/// The empty path refers to the value being decoded itself, so a failed scalar
/// decode yields a single entry under `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
	#[must_use]
	pub fn single(message: impl Into<String>) -> Self {
		let mut errors = Self::default();
		errors.add("", message);
		errors
	}

	pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
		self.0.entry(path.into()).or_default().push(message.into());
	}

	/// Moves every message of `other` under `prefix`
	pub fn nest(&mut self, prefix: &str, other: Self) {
		for (path, messages) in other.0 {
			let path = if path.is_empty() {
				prefix.to_string()
			} else {
				format!("{prefix}.{path}")
			};

			self.0.entry(path).or_default().extend(messages);
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn messages(&self, path: &str) -> Option<&[String]> {
		self.0.get(path).map(Vec::as_slice)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.0
			.iter()
			.map(|(path, messages)| (path.as_str(), messages.as_slice()))
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (path, messages) in &self.0 {
			for message in messages {
				if !first {
					write!(f, "; ")?;
				}
				first = false;

				if path.is_empty() {
					write!(f, "{message}")?;
				} else {
					write!(f, "{path}: {message}")?;
				}
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nesting_prefixes_paths() {
		let mut inner = ValidationErrors::single(NULL_MESSAGE);
		inner.add("b", MISSING_MESSAGE);

		let mut outer = ValidationErrors::default();
		outer.nest("a", inner);

		assert_eq!(outer.messages("a"), Some(&[NULL_MESSAGE.to_string()][..]));
		assert_eq!(outer.messages("a.b"), Some(&[MISSING_MESSAGE.to_string()][..]));
		assert_eq!(
			outer.to_string(),
			format!("a: {NULL_MESSAGE}; a.b: {MISSING_MESSAGE}")
		);
	}
}
