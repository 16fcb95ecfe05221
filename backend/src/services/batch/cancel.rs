use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};
use common::responses::MessageResponse;
use log::info;

/// Actix web handler for `POST /batch/cancel/{job_id}`.
///
/// # Returns
/// - `200 OK` once cancellation has been requested. The job reports
///   `Cancelled` after the sites already in flight finish.
/// - `409 Conflict` if the job has already finished, including a worker that
///   finished but whose final status has not been recorded yet.
/// - `404 Not Found` for an unknown job.
pub(crate) async fn process(job_id: web::Path<String>, state: web::Data<JobsState>) -> impl Responder {
    let job_id = job_id.into_inner();

    let finished = match state.jobs.read().await.get(&job_id) {
        None => {
            return HttpResponse::NotFound()
                .json(MessageResponse::new(format!("job {job_id} not found")))
        }
        Some(status) => status.is_terminal(),
    };

    let stopped = !finished
        && state
            .aborts
            .read()
            .await
            .get(&job_id)
            .is_some_and(|abort| abort.try_cancel());
    if stopped {
        info!("cancellation requested for job {}", job_id);
        HttpResponse::Ok().json(MessageResponse::new(format!(
            "cancellation requested for job {job_id}"
        )))
    } else {
        HttpResponse::Conflict().json(MessageResponse::new(format!(
            "job {job_id} has already finished"
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::AbortHandle;
    use crate::services::test_support::{app, context};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use common::jobs::JobStatus;

    #[actix_web::test]
    async fn cancel_reaches_only_unfinished_workers() {
        let ctx = context();
        let running = AbortHandle::default();
        let done = AbortHandle::default();
        assert!(done.finish());
        for (job_id, abort) in [("running", &running), ("done", &done)] {
            ctx.jobs
                .aborts
                .write()
                .await
                .insert(job_id.to_string(), abort.clone());
            ctx.jobs
                .jobs
                .write()
                .await
                .insert(job_id.to_string(), JobStatus::InProgress(100));
        }
        let app = test::init_service(app(&ctx)).await;

        let req = test::TestRequest::post().uri("/batch/cancel/running").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert!(running.is_cancelled());

        // The worker returned but its final status is still in the channel.
        let req = test::TestRequest::post().uri("/batch/cancel/done").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
        assert!(!done.is_cancelled());
    }
}
