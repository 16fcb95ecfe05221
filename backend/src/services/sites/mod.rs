//! Site catalog endpoints. A site only contributes its id to namespacing, so
//! the catalog is a plain registry.

mod save;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/sites";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/save", post().to(save::process))
}
