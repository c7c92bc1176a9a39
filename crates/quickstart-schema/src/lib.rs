//! # quickstart-schema
//!
//! JSON-schema utilities for the admin console:
//!
//! - [`flatten`]: dotted-path view of a schema's properties
//! - [`coerce`]: string form values to typed JSON values
//! - [`path`]: nested map writes and reads
//! - [`synthesize`]: schema from panel form fields, schema sanitizing
//! - [`diff`]: breaking-change analysis between two schemas
//! - [`versions`]: pending and committed schema version history

pub mod coerce;
pub mod diff;
pub mod error;
pub mod flatten;
pub mod path;
pub mod synthesize;
pub mod versions;

pub use coerce::{coerce_field, coerce_list, coerce_scalar_multi, coerce_value, parse_bool};
pub use diff::{ChangeType, CompatibilityReport, SchemaChange, compare_schemas};
pub use error::CoerceError;
pub use flatten::{FieldInfo, FlattenedSchema, ValueKind, flatten, has_renderable_properties, schema_type};
pub use path::{get_path, set_path};
pub use synthesize::{DEFAULT_DIALECT, json_type_for_field, sanitize_schema, schema_from_fields};
pub use versions::{
    InMemoryVersionStore, SchemaLifecycle, SchemaVersion, VersionStore, content_type_key,
};
