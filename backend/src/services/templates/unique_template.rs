use crate::services::{error_status, log_failure, run_blocking};
use crate::store::MappingStore;
use actix_web::{web, HttpResponse, Responder};
use common::responses::GenerateUniqueTemplateResponse;

/// Actix web handler for `GET /templates/{template_id}/unique_template/{site_id}`.
///
/// Returns the last persisted generation for the pair in the same envelope as
/// the generate endpoint. Nothing is regenerated.
pub async fn process(store: web::Data<MappingStore>, path: web::Path<(String, String)>) -> impl Responder {
    let (template_id, site_id) = path.into_inner();
    let store = store.get_ref().clone();
    let (tid, sid) = (template_id.clone(), site_id.clone());

    match run_blocking(move || store.find_generation(&tid, &sid)).await {
        Ok(generation) => HttpResponse::Ok().json(GenerateUniqueTemplateResponse::from(generation)),
        Err(err) => {
            log_failure("looking up unique template", &err);
            HttpResponse::build(error_status(&err)).json(GenerateUniqueTemplateResponse::failure(
                template_id,
                site_id,
                err.to_string(),
            ))
        }
    }
}
