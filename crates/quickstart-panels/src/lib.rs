//! # quickstart-panels
//!
//! Content types and panels for the admin console.
//!
//! A *content type* is a JSON-schema document describing an editable entity;
//! a *panel* is the typed repository view that stores it. The console resolves
//! both per request and drives the repository through the [`Repository`] trait.

pub mod content_types;
pub mod registry;
pub mod repository;

pub use content_types::{
    ContentTypeService, InMemoryContentTypes, active_content_types, resolve_alias,
    resolve_content_type,
};
pub use registry::{Panel, PanelKey, PanelRegistry};
pub use repository::{InMemoryRepository, Repository};
