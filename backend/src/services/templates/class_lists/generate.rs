use crate::services::{error_status, log_failure, run_blocking};
use crate::store::MappingStore;
use actix_web::{web, HttpResponse, Responder};
use common::requests::GenerateClassListRequest;
use common::responses::GenerateClassListResponse;

/// Actix web handler for `POST /templates/generate_css_class_list`.
///
/// # Arguments
/// * `payload` - `site_id`, `list_name`, optional `count` (configured default
///   when omitted) and `force_new`.
///
/// # Returns
/// - `200 OK` with `{success, list_name, classes, count}`.
/// - `400` for an empty name or an out-of-range count, `404` for an unknown
///   site, each with `success: false` and `error`.
pub async fn process(
    store: web::Data<MappingStore>,
    payload: web::Json<GenerateClassListRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    let store = store.get_ref().clone();
    let list_name = request.list_name.clone();

    let result = run_blocking(move || {
        store.generate_list(
            &request.site_id,
            &request.list_name,
            request.count,
            request.force_new,
        )
    })
    .await;

    match result {
        Ok(list) => HttpResponse::Ok().json(GenerateClassListResponse::from(list)),
        Err(err) => {
            log_failure("generating class list", &err);
            HttpResponse::build(error_status(&err))
                .json(GenerateClassListResponse::failure(list_name, err.to_string()))
        }
    }
}
