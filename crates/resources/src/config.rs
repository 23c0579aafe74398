use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use thing_task_system::TaskEngineConfig;
use tracing::{info, warn};

use super::error::{FileIOError, ResourceError};

/// Endpoints and metadata used when computing links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
	/// Endpoint identifier of the task detail view
	pub task_endpoint: String,

	/// Name of the task id parameter of that endpoint
	pub task_id_param: String,

	/// Mimetype advertised on task links
	pub task_mimetype: String,

	/// Endpoint identifier of the extension list view
	pub extension_list_endpoint: String,
}

impl Default for LinkConfig {
	fn default() -> Self {
		Self {
			task_endpoint: "task_detail".to_string(),
			task_id_param: "task_id".to_string(),
			task_mimetype: "application/json".to_string(),
			extension_list_endpoint: "extension_list".to_string(),
		}
	}
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingConfig {
	/// Task engine configuration
	#[serde(default)]
	pub tasks: TaskEngineConfig,

	/// Link generation configuration
	#[serde(default)]
	pub links: LinkConfig,
}

impl ThingConfig {
	/// Loads the configuration from a JSON file, using defaults if the file doesn't exist.
	pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
		let path = path.as_ref();

		match fs::read(path) {
			Ok(bytes) => {
				let config = serde_json::from_slice::<Self>(&bytes)?;
				config.tasks.validate()?;
				info!(path = %path.display(), "Loaded configuration");
				Ok(config)
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				warn!(path = %path.display(), "No configuration file found, using defaults");
				Ok(Self::default())
			}
			Err(e) => Err(FileIOError::from((path, e, "Failed to read config file")).into()),
		}
	}

	/// Saves the configuration as pretty printed JSON
	pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ResourceError> {
		let path = path.as_ref();

		if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
			fs::create_dir_all(parent)
				.map_err(|e| FileIOError::from((parent, e, "Failed to create config directory")))?;
		}

		fs::write(path, serde_json::to_vec_pretty(self)?)
			.map_err(|e| FileIOError::from((path, e, "Failed to write config file")))?;

		info!(path = %path.display(), "Saved configuration");

		Ok(())
	}
}
