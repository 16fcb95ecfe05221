use crate::services::{message_error, run_blocking};
use crate::store::MappingStore;
use actix_web::{web, HttpResponse, Responder};
use common::model::site::Site;
use common::responses::MessageResponse;

/// Actix web handler for `POST /sites/save`. Registers a site or renames it.
pub async fn process(store: web::Data<MappingStore>, payload: web::Json<Site>) -> impl Responder {
    let store = store.get_ref().clone();
    let site = payload.into_inner();
    let message = format!("site {} saved", site.id);

    match run_blocking(move || store.save_site(&site)).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new(message)),
        Err(err) => message_error("saving site", err),
    }
}
