//! Batch generation of one template for many sites.
//!
//! The provided routes are:
//! - `POST /batch/generate_unique_templates`: schedules a background job that
//!   generates the template for every listed site and immediately returns a
//!   `job_id`. Sites are processed in parallel on the `rayon` pool; each site
//!   is persisted atomically on its own.
//!
//! - `GET /batch/status/{job_id}`: returns the current `JobStatus` of a job
//!   (`Pending`, `InProgress(percent)`, `Completed`, `Failed` or `Cancelled`).
//!
//! - `POST /batch/cancel/{job_id}`: asks a running job to stop. Sites that have
//!   not been generated yet are skipped; sites already stored stay stored.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod cancel;
mod get_status;
mod start;

const API_PATH: &str = "/batch";

/// Configures and returns the Actix scope for batch routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Route to start a new batch generation job.
        .route("/generate_unique_templates", post().to(start::process))
        // Route to poll a job.
        .route("/status/{job_id}", get().to(get_status::process))
        // Route to stop a running job.
        .route("/cancel/{job_id}", post().to(cancel::process))
}
