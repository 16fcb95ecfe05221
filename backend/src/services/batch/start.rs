//! # Batch Generation Start Service
//!
//! This module provides the `POST /batch/generate_unique_templates` endpoint,
//! which generates one template for many sites in the background.
//!
//! ## Workflow:
//!
//! 1.  **HTTP Request**: The `process` handler receives a `BatchGenerateRequest`
//!     containing a `template_id`, the `site_ids` and the `force_new` flag.
//!
//! 2.  **Job Scheduling**: It calls `schedule_batch_job`, which:
//!     - Creates a unique `job_id` and an `AbortHandle` for it.
//!     - Sets the initial job status to `Pending` in the shared `JobsState` and
//!       registers the handle so `/batch/cancel/{job_id}` can reach it.
//!     - Immediately returns the `job_id` to the client, allowing for asynchronous status polling.
//!     - Spawns a new Tokio task to manage the job's lifecycle.
//!
//! 3.  **Background Processing**: The spawned task uses `tokio::task::spawn_blocking` to
//!     run `batch_blocking` on a dedicated thread, which fans the sites out over the
//!     `rayon` pool. Each site goes through `MappingStore::generate_or_replace`, so
//!     per-pair locking and atomic persistence apply exactly as for single requests.
//!
//! 4.  **Progress Reporting**: Every finished site sends a `JobUpdate` with the
//!     percentage of sites processed so far. The final status (`Completed`,
//!     `Failed` or `Cancelled`) is sent on the same channel after the worker
//!     returns, so it always lands last.

use crate::engine::error::EngineError;
use crate::engine::AbortHandle;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::message_error;
use crate::store::MappingStore;
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use common::requests::BatchGenerateRequest;
use common::responses::JobCreatedResponse;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

/// What happened to one site of a batch.
#[derive(Debug, PartialEq, Eq)]
enum SiteOutcome {
    Generated,
    /// Not attempted, or stopped before persisting, because the job was cancelled.
    Skipped,
    Failed(String),
}

/// The Actix web handler for `POST /batch/generate_unique_templates`.
///
/// # Arguments
/// * `store` - The shared `MappingStore`.
/// * `state` - The shared `JobsState`, injected by Actix, for managing job statuses.
/// * `payload` - The template and the sites to generate it for.
///
/// # Returns
/// `{job_id}` on success, or `400 Bad Request` when the request names no
/// template or no sites.
pub(crate) async fn process(
    store: web::Data<MappingStore>,
    state: web::Data<JobsState>,
    payload: web::Json<BatchGenerateRequest>,
) -> impl Responder {
    match schedule_batch_job(store, state, payload.into_inner()).await {
        Ok(job_id) => HttpResponse::Ok().json(JobCreatedResponse { job_id }),
        Err(err) => message_error("scheduling batch job", err),
    }
}

async fn schedule_batch_job(
    store: web::Data<MappingStore>,
    state: web::Data<JobsState>,
    mut req: BatchGenerateRequest,
) -> Result<String, EngineError> {
    if req.template_id.trim().is_empty() {
        return Err(EngineError::InvalidInput(
            "template id must not be empty".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    req.site_ids.retain(|site_id| seen.insert(site_id.clone()));
    if req.site_ids.is_empty() {
        return Err(EngineError::InvalidInput(
            "site_ids must name at least one site".to_string(),
        ));
    }

    let job_id = Uuid::new_v4().to_string();
    let abort = AbortHandle::default();
    state
        .aborts
        .write()
        .await
        .insert(job_id.clone(), abort.clone());
    state
        .jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);
    info!(
        "scheduled batch job {} for template {} and {} sites",
        job_id,
        req.template_id,
        req.site_ids.len()
    );

    let tx = state.tx.clone(); // Channel to the central job updater.
    let store = store.get_ref().clone();
    let job_id_clone = job_id.clone();

    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let job_id_for_blocking = job_id_clone.clone();
        let handle = tokio::task::spawn_blocking(move || {
            batch_blocking(&progress_tx, &job_id_for_blocking, &store, &req, &abort)
        });

        let status = match handle.await {
            Ok(status) => status,
            Err(e) => JobStatus::Failed(format!("Task join error: {}", e)),
        };
        info!("batch job {} finished: {:?}", job_id_clone, status);
        let _ = tx
            .send(JobUpdate {
                job_id: job_id_clone,
                status,
            })
            .await;
    });

    Ok(job_id)
}

/// Generates the template for every site and returns the job's final status.
/// Runs on a blocking thread.
fn batch_blocking(
    tx: &mpsc::Sender<JobUpdate>,
    job_id: &str,
    store: &MappingStore,
    req: &BatchGenerateRequest,
    abort: &AbortHandle,
) -> JobStatus {
    let _ = tx.blocking_send(JobUpdate {
        job_id: job_id.to_string(),
        status: JobStatus::InProgress(0),
    });

    let total = req.site_ids.len();
    let finished = AtomicUsize::new(0);
    let outcomes: Vec<SiteOutcome> = req
        .site_ids
        .par_iter()
        .map(|site_id| {
            if abort.is_cancelled() {
                return SiteOutcome::Skipped;
            }
            let outcome =
                match store.generate_or_replace(&req.template_id, site_id, req.force_new, abort) {
                    Ok(_) => SiteOutcome::Generated,
                    Err(EngineError::Cancelled) => SiteOutcome::Skipped,
                    Err(err) => {
                        warn!("batch job {}: site {} failed: {}", job_id, site_id, err);
                        SiteOutcome::Failed(format!("site {site_id}: {err}"))
                    }
                };
            let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = tx.blocking_send(JobUpdate {
                job_id: job_id.to_string(),
                status: JobStatus::InProgress(percent(done, total)),
            });
            outcome
        })
        .collect();

    let cancelled = !abort.finish();
    summarize(&req.template_id, &outcomes, cancelled)
}

fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    (done * 100 / total) as u32
}

fn summarize(template_id: &str, outcomes: &[SiteOutcome], cancelled: bool) -> JobStatus {
    let total = outcomes.len();
    let generated = outcomes
        .iter()
        .filter(|outcome| **outcome == SiteOutcome::Generated)
        .count();
    let failures: Vec<&str> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            SiteOutcome::Failed(reason) => Some(reason.as_str()),
            _ => None,
        })
        .collect();

    if cancelled {
        JobStatus::Cancelled(format!(
            "cancelled after generating {generated} of {total} sites"
        ))
    } else if !failures.is_empty() {
        JobStatus::Failed(format!(
            "{} of {} sites failed: {}",
            failures.len(),
            total,
            failures.join("; ")
        ))
    } else {
        JobStatus::Completed(format!(
            "generated template {template_id} for {total} sites"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_controller::state::JobsState;
    use crate::services::test_support::{app, context};
    use crate::store::test_support::{seed, temp_store};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use common::responses::MessageResponse;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    async fn wait_for_terminal(jobs: &JobsState, job_id: &str) -> JobStatus {
        for _ in 0..500 {
            if let Some(status) = jobs.jobs.read().await.get(job_id) {
                if status.is_terminal() {
                    return status.clone();
                }
            }
            actix_web::rt::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not finish");
    }

    #[actix_web::test]
    async fn generates_every_site() {
        let ctx = context();
        seed(&ctx.store, "t1", r#"<p class="a"></p>"#, ".a{}", &["1", "2", "3"]);
        let app = actix_test::init_service(app(&ctx)).await;

        let req = actix_test::TestRequest::post()
            .uri("/batch/generate_unique_templates")
            .set_json(json!({ "template_id": "t1", "site_ids": [1, "2", "3", "3"] }))
            .to_request();
        let created: JobCreatedResponse = actix_test::call_and_read_body_json(&app, req).await;

        let status = wait_for_terminal(&ctx.jobs, &created.job_id).await;
        assert_eq!(
            status,
            JobStatus::Completed("generated template t1 for 3 sites".to_string())
        );
        for site in ["1", "2", "3"] {
            assert_eq!(ctx.store.find_generation("t1", site).unwrap().class_mapping.len(), 1);
        }

        let req = actix_test::TestRequest::get()
            .uri(&format!("/batch/status/{}", created.job_id))
            .to_request();
        let polled: JobStatus = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(polled, status);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/batch/cancel/{}", created.job_id))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn failing_sites_fail_the_job() {
        let ctx = context();
        seed(&ctx.store, "t1", "", ".a{}", &["1"]);
        let app = actix_test::init_service(app(&ctx)).await;

        let req = actix_test::TestRequest::post()
            .uri("/batch/generate_unique_templates")
            .set_json(json!({ "template_id": "t1", "site_ids": ["1", "unknown"] }))
            .to_request();
        let created: JobCreatedResponse = actix_test::call_and_read_body_json(&app, req).await;

        match wait_for_terminal(&ctx.jobs, &created.job_id).await {
            JobStatus::Failed(reason) => {
                assert!(reason.starts_with("1 of 2 sites failed"));
                assert!(reason.contains("site unknown"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(ctx.store.find_generation("t1", "1").is_ok());
    }

    #[actix_web::test]
    async fn unknown_jobs_and_empty_requests() {
        let ctx = context();
        let app = actix_test::init_service(app(&ctx)).await;

        let req = actix_test::TestRequest::get().uri("/batch/status/nope").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: MessageResponse = actix_test::read_body_json(resp).await;
        assert_eq!(body.message, "job nope not found");

        let req = actix_test::TestRequest::post().uri("/batch/cancel/nope").to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = actix_test::TestRequest::post()
            .uri("/batch/generate_unique_templates")
            .set_json(json!({ "template_id": "t1", "site_ids": [] }))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn cancelled_batch_persists_nothing() {
        let (_dir, store) = temp_store();
        seed(&store, "t1", "", ".a{}", &["1", "2"]);
        let (tx, mut rx) = mpsc::channel(100);
        let abort = AbortHandle::default();
        abort.cancel();
        let req = BatchGenerateRequest {
            template_id: "t1".to_string(),
            site_ids: vec!["1".to_string(), "2".to_string()],
            force_new: false,
        };

        let status = batch_blocking(&tx, "job", &store, &req, &abort);
        assert_eq!(
            status,
            JobStatus::Cancelled("cancelled after generating 0 of 2 sites".to_string())
        );
        assert!(store.find_generation("t1", "1").is_err());
        assert!(store.find_generation("t1", "2").is_err());

        let first = rx.try_recv().unwrap();
        assert_eq!(first.status, JobStatus::InProgress(0));
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
