//! Named Class Lists: pools of generated identifiers owned by a site and
//! independent of any template.
//!
//! - `POST /templates/generate_css_class_list` (`generate`) creates or
//!   regenerates a list.
//! - `GET /templates/class_lists?site_id=..[&name=..]` returns one list, or
//!   every list of the site when `name` is omitted.
//! - `PUT /templates/class_lists` replaces the identifiers of an existing list.
//! - `DELETE /templates/class_lists?site_id=..&name=..` removes a list.

pub mod crud;
pub mod generate;

use actix_web::web::{delete, get, put, resource};
use actix_web::Resource;

pub fn configure_resource() -> Resource {
    resource("/class_lists")
        .route(get().to(crud::get))
        .route(put().to(crud::update))
        .route(delete().to(crud::delete))
}
