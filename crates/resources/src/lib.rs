//!
//! # Thing Resources
//!
//! Turns live values and functions into typed resources an HTTP layer can route to,
//! without writing endpoint code for each of them:
//! - [`property_of`] exposes one attribute of an [`Attributes`] target for reading, and
//!   unless read-only, for full (`PUT`) or partial (`POST`) updates;
//! - [`action_from`] exposes a [`Callable`], run inline or spawned as a background task;
//! - [`static_from`] serves files from below one directory;
//! - [`LinkGenerator`] attaches best-effort hyperlinks to tasks and extensions right before
//!   they're serialized.
//!
//! ## Basic example
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use thing_resources::{property_of, AttributeStore, PropertyOptions};
//!
//! let target = Arc::new(AttributeStore::new().with("position", json!({"x": 1, "y": 2})));
//! let property = property_of(target, "position", PropertyOptions::default()).unwrap();
//!
//! let writer = property.writer().unwrap();
//! assert_eq!(writer.update(&json!({"x": 9})).unwrap(), json!({"x": 9}));
//! assert_eq!(property.read().unwrap(), json!({"x": 9, "y": 2}));
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod action;
mod attributes;
mod config;
mod descriptor;
mod error;
mod links;
mod property;
mod resource;
mod static_files;

pub use action::{action_from, ActionOptions, ActionOutput, ActionResource, Callable, TypeHint};
pub use attributes::{AttributeStore, Attributes};
pub use config::{LinkConfig, ThingConfig};
pub use descriptor::{Method, ResourceDescriptor, ResourceDocs, ResourceKind};
pub use error::{FileIOError, ResourceError};
pub use links::{Extension, ExtensionView, Link, LinkGenerator, Links, UrlResolver, WithLinks};
pub use property::{property_of, PropertyOptions, PropertyResource, PropertyWriter};
pub use resource::{Request, Resource, ResourceBuilder, Response};
pub use static_files::{static_from, StaticFile, StaticResource};
