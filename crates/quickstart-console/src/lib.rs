//! # quickstart-console
//!
//! HTTP surface of the admin console: the content-entry CRUD pipeline behind
//! `/content/{name}`, canonical per-panel routes, alias redirects, the JSON
//! list and content-type builder APIs, and the built-in HTML views.
//!
//! ## Request flow
//!
//! 1. [`routes::console_router`] dispatches to a handler in [`handlers`].
//! 2. [`panel_context::resolve_panel_context`] resolves the panel, content
//!    type and [`quickstart_core::AdminContext`].
//! 3. The [`quickstart_policy::PermissionGuard`] checks the action.
//! 4. One repository call runs under the admin context.
//! 5. The result is rendered through [`templates::render_with_fallback`] or
//!    answered with a redirect.

pub mod api;
pub mod auth;
pub mod columns;
pub mod error;
pub mod form;
pub mod handlers;
pub mod html;
pub mod panel_context;
pub mod payload;
pub mod preview;
pub mod query;
pub mod relations;
pub mod request_context;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;
pub mod translation;
pub mod views;

pub use error::ConsoleError;
pub use form::{FormRenderer, HtmlFormRenderer};
pub use preview::{PreviewService, TokenPreviewService};
pub use routes::{StaticUrlResolver, UrlResolver, console_router, panel_router};
pub use server::ConsoleServer;
pub use state::ConsoleState;
pub use templates::{TemplateChecker, ViewEngine, ViewError};
pub use views::BuiltinViews;
