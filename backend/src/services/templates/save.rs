use crate::services::{message_error, run_blocking};
use crate::store::MappingStore;
use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;
use common::responses::MessageResponse;

/// Actix web handler for `POST /templates/save`.
///
/// Creates the template or replaces every field of an existing one.
///
/// # Returns
/// - `200 OK` with `{message}` on success.
/// - `400 Bad Request` when the id is empty.
pub async fn process(store: web::Data<MappingStore>, payload: web::Json<Template>) -> impl Responder {
    let store = store.get_ref().clone();
    let template = payload.into_inner();
    let template_id = template.id.clone();

    match run_blocking(move || store.save_template(&template)).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new(format!(
            "template {template_id} saved"
        ))),
        Err(err) => message_error("saving template", err),
    }
}
