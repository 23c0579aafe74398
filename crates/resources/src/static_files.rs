use std::{
	fs,
	path::{Path, PathBuf},
};

use tracing::{debug, instrument, warn};

use super::{
	descriptor::{Method, ResourceDescriptor, ResourceDocs, ResourceKind},
	error::{FileIOError, ResourceError},
};

/// Raw content of a served file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
	pub content: Vec<u8>,
	pub mimetype: String,
}

/// A resource serving files from below one base directory, and nothing outside of it.
#[derive(Debug, Clone)]
pub struct StaticResource {
	base: PathBuf,
	descriptor: ResourceDescriptor,
}

/// Builds a static resource over `base_dir`, which must be an existing directory.
#[instrument(skip_all, fields(resource = %base_dir.as_ref().display()), err)]
pub fn static_from(
	base_dir: impl AsRef<Path>,
	name: Option<String>,
) -> Result<StaticResource, ResourceError> {
	let base_dir = base_dir.as_ref();
	let base = base_dir
		.canonicalize()
		.map_err(|e| FileIOError::from((base_dir, e, "Failed to resolve static base directory")))?;

	if !base.is_dir() {
		return Err(ResourceError::NotFound(format!(
			"static base '{}' is not a directory",
			base.display()
		)));
	}

	let mut docs = ResourceDocs::new(name, None);
	docs.safe = true;
	docs.idempotent = true;
	docs.methods = vec![Method::Get];

	debug!(base = %base.display(), "Built static resource");

	Ok(StaticResource {
		descriptor: ResourceDescriptor {
			kind: ResourceKind::Static,
			target: base.display().to_string(),
			input_schema: None,
			output_schema: None,
			docs,
		},
		base,
	})
}

impl StaticResource {
	#[must_use]
	pub const fn descriptor(&self) -> &ResourceDescriptor {
		&self.descriptor
	}

	#[must_use]
	pub fn base(&self) -> &Path {
		&self.base
	}

	/// Reads the file at `relative` below the base directory.
	///
	/// The resolved path is canonicalized first, anything landing outside the base
	/// directory (through `..`, absolute paths or symlinks) is reported as not found,
	/// and so are directories.
	#[instrument(skip(self), err)]
	pub fn read(&self, relative: &str) -> Result<StaticFile, ResourceError> {
		let not_found = || ResourceError::NotFound(relative.to_string());

		let requested = self.base.join(relative.trim_start_matches('/'));

		// Whatever stops the path from resolving, the caller only learns it isn't there
		let resolved = match requested.canonicalize() {
			Ok(resolved) => resolved,
			Err(e) => {
				debug!(?e, "Static path doesn't resolve");
				return Err(not_found());
			}
		};

		if !resolved.starts_with(&self.base) {
			warn!(
				resolved = %resolved.display(),
				"Rejected static path resolving outside of the base directory",
			);
			return Err(not_found());
		}

		if resolved.is_dir() {
			return Err(not_found());
		}

		let content = fs::read(&resolved).map_err(|e| FileIOError::from((&resolved, e)))?;

		Ok(StaticFile {
			mimetype: mime_guess::from_path(&resolved)
				.first_or_octet_stream()
				.essence_str()
				.to_string(),
			content,
		})
	}
}
