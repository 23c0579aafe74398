//!
//! # Thing Schema
//!
//! Typed field descriptors and their translation into wire-level, JSON-Schema shaped
//! documents.
//!
//! A [`Field`] validates and coerces incoming values and encodes outgoing ones, a
//! [`Schema`] groups named fields, and [`VirtualSchema`] lets a bare scalar flow through
//! the same machinery. The [`wire`] functions turn any of those into a [`SchemaNode`],
//! while [`route`] derives path templates and parameter descriptors from routing rules.
//!
//! ## Basic example
//!
//! ```
//! use thing_schema::{to_wire_schema, Field, Schema, SchemaInput};
//!
//! let schema = Schema::new()
//!     .with_field("arg", Field::integer().required())
//!     .with_field("kwarg", Field::string().with_default("default"));
//!
//! let node = to_wire_schema(&SchemaInput::Schema(schema)).unwrap();
//! assert_eq!(node.required, vec!["arg".to_string()]);
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

mod error;
mod field;
mod schema;

pub mod route;
pub mod wire;

pub use error::{Error as SchemaError, ValidationErrors};
pub use field::{Field, FieldKind};
pub use route::{
	path_template, route_parameters, Converter, ParamType, Parameter, ParameterLocation,
	ParameterOverride, ParameterSchema, RouteArgument, RouteRule,
};
pub use schema::{Schema, VirtualSchema};
pub use wire::{
	field_to_schema, map_to_schema, normalize_to_schema, to_wire_schema, SchemaInput, SchemaNode,
	WireType,
};
