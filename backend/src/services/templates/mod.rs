//! # Template Service Module
//!
//! This module aggregates all API endpoints related to templates: the catalog
//! copy the engine reads from, site-scoped generation and the named Class
//! Lists. It acts as a router, directing incoming HTTP requests under the
//! `/templates` path to the appropriate handler logic defined in its
//! sub-modules.
//!
//! ## Sub-modules:
//! - `save` / `get`: store and read back a template's HTML, CSS and JS.
//! - `generate_unique`: runs the uniqueness engine for one site and persists the result.
//! - `unique_template`: returns the last persisted generation for a template and site.
//! - `class_lists`: generation and CRUD of named Class Lists.

mod class_lists;
mod generate_unique;
mod get;
mod save;
mod unique_template;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`POST /save`**: creates or replaces a template (`save::process`).
/// *   **`POST /generate_css_class_list`**: generates a named Class List
///     (`class_lists::generate::process`).
/// *   **`GET|PUT|DELETE /class_lists`**: reads, replaces or deletes Class Lists
///     (`class_lists::crud`).
/// *   **`GET /{template_id}`**: returns one template (`get::process`).
/// *   **`POST /{template_id}/generate_unique_template`**: generates and persists
///     the site-scoped rewrite (`generate_unique::process`).
/// *   **`GET /{template_id}/unique_template/{site_id}`**: returns the persisted
///     rewrite (`unique_template::process`).
///
/// Fixed paths are registered before `/{template_id}` so they are never read
/// as template ids.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/save", post().to(save::process))
        .route(
            "/generate_css_class_list",
            post().to(class_lists::generate::process),
        )
        .service(class_lists::configure_resource())
        .route("/{template_id}", get().to(get::process))
        .route(
            "/{template_id}/generate_unique_template",
            post().to(generate_unique::process),
        )
        .route(
            "/{template_id}/unique_template/{site_id}",
            get().to(unique_template::process),
        )
}
