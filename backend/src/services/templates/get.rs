//! # Template Retrieval Service
//!
//! Provides the backend logic for the `GET /templates/{template_id}` endpoint.
//!
//! ## Workflow
//!
//! 1.  **HTTP Request**: `process` receives the `template_id` from the URL path.
//! 2.  **Database Query**: the lookup runs on the blocking pool through
//!     `MappingStore::get_template`, which reads `id`, `html_content`,
//!     `css_content` and `js_content` from the `templates` table.
//! 3.  **HTTP Response**: the `Template` is returned as JSON, or `404 Not Found`
//!     with a `{message}` body when no such template exists.

use crate::services::{message_error, run_blocking};
use crate::store::MappingStore;
use actix_web::{web, HttpResponse, Responder};

/// Actix web handler for the `GET /templates/{template_id}` endpoint.
///
/// # Arguments
/// * `template_id` - The unique identifier of the template, extracted from the URL path.
///
/// # Returns
/// - `200 OK` with the `Template` object as a JSON payload on success.
/// - `404 Not Found` if the template does not exist.
pub async fn process(store: web::Data<MappingStore>, template_id: web::Path<String>) -> impl Responder {
    let store = store.get_ref().clone();
    let template_id = template_id.into_inner();

    match run_blocking(move || store.get_template(&template_id)).await {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(err) => message_error("retrieving template", err),
    }
}
