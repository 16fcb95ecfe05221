use crate::engine::error::EngineError;
use crate::services::{message_error, run_blocking};
use crate::store::MappingStore;
use actix_web::{web, HttpResponse, Responder};
use common::requests::{ClassListQuery, UpdateClassListRequest};
use common::responses::{ClassListsResponse, MessageResponse};

/// `GET /templates/class_lists?site_id=..[&name=..]`
///
/// With `name`: the list itself. Without: `{site_id, lists}` for every list
/// the site owns.
pub async fn get(store: web::Data<MappingStore>, query: web::Query<ClassListQuery>) -> impl Responder {
    let ClassListQuery { site_id, name } = query.into_inner();
    let store = store.get_ref().clone();

    match name {
        Some(name) => match run_blocking(move || store.get_list(&site_id, &name)).await {
            Ok(list) => HttpResponse::Ok().json(list),
            Err(err) => message_error("reading class list", err),
        },
        None => {
            let owner = site_id.clone();
            match run_blocking(move || store.lists_for_site(&owner)).await {
                Ok(lists) => HttpResponse::Ok().json(ClassListsResponse { site_id, lists }),
                Err(err) => message_error("listing class lists", err),
            }
        }
    }
}

/// `PUT /templates/class_lists` with `{site_id, name, classes}`.
///
/// Replaces the identifiers of an existing list and returns it. Unknown lists
/// are `404`; invalid or repeated identifiers are `400`.
pub async fn update(
    store: web::Data<MappingStore>,
    payload: web::Json<UpdateClassListRequest>,
) -> impl Responder {
    let UpdateClassListRequest {
        site_id,
        name,
        classes,
    } = payload.into_inner();
    let store = store.get_ref().clone();

    match run_blocking(move || store.update_list(&site_id, &name, classes)).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(err) => message_error("updating class list", err),
    }
}

/// `DELETE /templates/class_lists?site_id=..&name=..`
pub async fn delete(store: web::Data<MappingStore>, query: web::Query<ClassListQuery>) -> impl Responder {
    let ClassListQuery { site_id, name } = query.into_inner();
    let Some(name) = name else {
        return message_error(
            "deleting class list",
            EngineError::InvalidInput("`name` is required".to_string()),
        );
    };
    let store = store.get_ref().clone();
    let message = format!("class list {name} deleted");

    match run_blocking(move || store.delete_list(&site_id, &name)).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new(message)),
        Err(err) => message_error("deleting class list", err),
    }
}
