//! HTTP surface.
//!
//! Every handler runs its store call on the blocking pool (`web::block`) and
//! matches on the result to build the response. Failures are mapped to a
//! status code by [`error_status`] and logged once here, at `warn` for errors
//! the caller can fix and at `error` for the rest.

pub mod batch;
pub mod sites;
pub mod templates;

use crate::engine::error::EngineError;
use actix_web::http::StatusCode;
use actix_web::{error, web, HttpRequest, HttpResponse};
use common::responses::MessageResponse;
use log::{error, warn};

/// Registers every route. Shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(templates::configure_routes())
        .service(sites::configure_routes())
        .service(batch::configure_routes());
}

/// JSON extractor settings: body limit plus a `{message}` body on rejection.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, req| rejected(err.to_string(), err.into(), req))
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| rejected(err.to_string(), err.into(), req))
}

fn rejected(message: String, cause: actix_web::Error, req: &HttpRequest) -> actix_web::Error {
    warn!("rejected {} {}: {}", req.method(), req.path(), message);
    error::InternalError::from_response(
        cause,
        HttpResponse::BadRequest().json(MessageResponse::new(message)),
    )
    .into()
}

pub fn error_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Cancelled => StatusCode::CONFLICT,
        EngineError::CollisionExhausted { .. }
        | EngineError::InternalConsistency(_)
        | EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Runs a store operation off the async workers.
pub(crate) async fn run_blocking<T, F>(operation: F) -> Result<T, EngineError>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    web::block(operation)
        .await
        .map_err(|err| EngineError::InternalConsistency(format!("blocking task failed: {err}")))?
}

pub(crate) fn log_failure(context: &str, err: &EngineError) {
    if err.is_recoverable() {
        warn!("{context}: {err}");
    } else {
        error!("{context}: {err}");
    }
}

/// `{message}` body with the status of `err`.
pub(crate) fn message_error(context: &str, err: EngineError) -> HttpResponse {
    log_failure(context, &err);
    HttpResponse::build(error_status(&err)).json(MessageResponse::new(err.to_string()))
}
