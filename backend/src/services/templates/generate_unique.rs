//! # Unique Template Generation Service
//!
//! Provides the `POST /templates/{template_id}/generate_unique_template`
//! endpoint, which rewrites a template's classes and inline styles into
//! identifiers scoped to one site.
//!
//! ## Workflow
//!
//! 1.  **HTTP Request**: `process` receives the `template_id` in the path and a
//!     `GenerateUniqueTemplateRequest` body (`site_id`, optional `force_new`).
//!
//! 2.  **Generation**: `MappingStore::generate_or_replace` runs on the blocking
//!     pool. It loads the template, runs scanner, extractor, generator and
//!     rewriter, then replaces the stored mapping for the pair in one
//!     transaction.
//!
//! 3.  **Cancellation**: the request owns an `AbortHandle` guard. If the client
//!     goes away, the handler future is dropped, the guard cancels the handle
//!     and the generation stops at its next stage boundary without persisting
//!     anything.
//!
//! 4.  **HTTP Response**: the `GenerateUniqueTemplateResponse` envelope, with
//!     `success: false` and `error` set on failure.

use crate::engine::AbortHandle;
use crate::services::{error_status, log_failure, run_blocking};
use crate::store::MappingStore;
use actix_web::{web, HttpResponse, Responder};
use common::requests::GenerateUniqueTemplateRequest;
use common::responses::GenerateUniqueTemplateResponse;

/// Actix web handler for `POST /templates/{template_id}/generate_unique_template`.
///
/// # Arguments
/// * `store` - The shared `MappingStore`.
/// * `template_id` - The template to rewrite, from the URL path.
/// * `payload` - The target `site_id` and the `force_new` flag.
///
/// # Returns
/// - `200 OK` with the generation envelope on success.
/// - `404`, `422`, `400` or `500` with `success: false` and `error` on failure.
pub async fn process(
    store: web::Data<MappingStore>,
    template_id: web::Path<String>,
    payload: web::Json<GenerateUniqueTemplateRequest>,
) -> impl Responder {
    let template_id = template_id.into_inner();
    let request = payload.into_inner();
    let abort = AbortHandle::default();
    let _cancel_on_drop = abort.cancel_on_drop();

    let store = store.get_ref().clone();
    let (tid, sid) = (template_id.clone(), request.site_id.clone());
    let result =
        run_blocking(move || store.generate_or_replace(&tid, &sid, request.force_new, &abort)).await;

    match result {
        Ok(generation) => HttpResponse::Ok().json(GenerateUniqueTemplateResponse::from(generation)),
        Err(err) => {
            log_failure("generating unique template", &err);
            HttpResponse::build(error_status(&err)).json(GenerateUniqueTemplateResponse::failure(
                template_id,
                request.site_id,
                err.to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::generator::namespace_tag;
    use crate::services::test_support::{app, context};
    use crate::store::test_support::seed;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use common::responses::GenerateUniqueTemplateResponse;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn generates_the_container_scenario() {
        let ctx = context();
        seed(
            &ctx.store,
            "t1",
            "<div class='container'></div>",
            ".container { width: 100%; }",
            &["7"],
        );
        let app = test::init_service(app(&ctx)).await;

        let req = test::TestRequest::post()
            .uri("/templates/t1/generate_unique_template")
            .set_json(json!({ "site_id": 7 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let unique = format!("tpl7-{}-container", namespace_tag("t1:7"));
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["template_id"], json!("t1"));
        assert_eq!(body["site_id"], json!("7"));
        assert_eq!(body["unique_classes"], json!({ "container": unique }));
        assert_eq!(body["unique_styles"], json!({}));
        assert_eq!(body["custom_css"], json!(format!(".{unique} {{ width: 100%; }}")));
        assert_eq!(
            body["processed_content"],
            json!(format!("<div class='{unique}'></div>"))
        );
        assert_eq!(body["total_classes"], json!(1));
        assert_eq!(body["total_styles"], json!(0));
        assert!(body.get("error").is_none());
    }

    #[actix_web::test]
    async fn parse_errors_are_unprocessable() {
        let ctx = context();
        seed(&ctx.store, "t1", "<div", ".a{}", &["7"]);
        let app = test::init_service(app(&ctx)).await;

        let req = test::TestRequest::post()
            .uri("/templates/t1/generate_unique_template")
            .set_json(json!({ "site_id": "7" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: GenerateUniqueTemplateResponse = test::read_body_json(resp).await;
        assert!(!body.success);
        assert_eq!(body.total_classes, 0);
        assert!(body.error.unwrap().contains("byte 0"));
    }

    #[actix_web::test]
    async fn unknown_template_is_not_found() {
        let ctx = context();
        seed(&ctx.store, "t1", "", "", &["7"]);
        let app = test::init_service(app(&ctx)).await;

        let req = test::TestRequest::post()
            .uri("/templates/nope/generate_unique_template")
            .set_json(json!({ "site_id": "7" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["template_id"], json!("nope"));
    }

    #[actix_web::test]
    async fn malformed_body_is_a_bad_request() {
        let ctx = context();
        let app = test::init_service(app(&ctx)).await;

        let req = test::TestRequest::post()
            .uri("/templates/t1/generate_unique_template")
            .set_json(json!({ "site": "7" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].as_str().is_some());
    }
}
