//! Manages the state of long-running, asynchronous background jobs.
//!
//! This module provides the core components for tracking the progress of tasks
//! that are executed outside the immediate request/response cycle, such as the
//! batch generation started in `backend/src/services/batch/start.rs`.
//!
//! The main components are:
//! - `JobsState`: A clonable, thread-safe struct that holds the shared state of all jobs.
//!   It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: A message struct used to communicate status changes from a background
//!   job back to the central state manager.
//! - `start_job_updater`: A long-running task that listens for `JobUpdate` messages
//!   on an MPSC channel and updates the shared `JobsState` accordingly.

use crate::engine::AbortHandle;
use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Capacity of the channel between workers and the updater task.
const UPDATE_BUFFER: usize = 100;

/// A thread-safe, shareable container for the state of all background jobs.
///
/// This struct is created in `main.rs` and shared across the Actix application
/// as `web::Data`. It allows different parts of the application to interact with
/// the job system in a coordinated way.
#[derive(Clone)]
pub struct JobsState {
    /// A map from a unique job ID (String) to its current `JobStatus`.
    ///
    /// This map is the single source of truth for the status of all jobs.
    /// It is protected by an `Arc<RwLock>` to allow concurrent reads (e.g., by the
    /// `/batch/status/{job_id}` endpoint) and exclusive writes
    /// (by the `start_job_updater` task).
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Cancellation handles of the jobs that are still running.
    ///
    /// A handle is registered when a job is scheduled and removed once the job
    /// reports its final status, so `/batch/cancel/{job_id}` can tell a running
    /// job from a finished one.
    pub aborts: Arc<RwLock<HashMap<String, AbortHandle>>>,

    /// A multi-producer, single-consumer (MPSC) channel sender.
    ///
    /// Background tasks (like the one spawned in `schedule_batch_job`) use this
    /// sender to push `JobUpdate` messages into a channel. This decouples the job
    /// execution logic from the state update logic, allowing tasks to report
    /// progress without needing direct write access to the `jobs` map.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Creates an empty state together with the receiver that
    /// `start_job_updater` must drain.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            aborts: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }
}

/// Represents a status update for a specific background job.
///
/// These messages are sent by background workers via the `JobsState.tx` sender
/// and are processed by the `start_job_updater` task.
#[derive(Debug)]
pub struct JobUpdate {
    /// The unique identifier of the job being updated.
    pub(crate) job_id: String,
    /// The new status of the job.
    pub(crate) status: JobStatus,
}

/// Starts the central job state updater task.
///
/// This function should be spawned as a long-running background task (as seen in `main.rs`).
/// It continuously listens for `JobUpdate` messages on the provided `rx` receiver.
///
/// Upon receiving an update, it acquires a write lock on the `jobs` map in the
/// shared `JobsState` and updates the status for the corresponding `job_id`.
/// A terminal status also retires the job's cancellation handle.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        if update.status.is_terminal() {
            state.aborts.write().await.remove(&update.job_id);
        }
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[actix_web::test]
    async fn updater_applies_updates_and_retires_handles() {
        let (state, rx) = JobsState::new();
        state
            .aborts
            .write()
            .await
            .insert("job".to_string(), AbortHandle::default());
        let updater = tokio::spawn(start_job_updater(state.clone(), rx));

        for status in [JobStatus::InProgress(50), JobStatus::Completed("done".to_string())] {
            state
                .tx
                .send(JobUpdate {
                    job_id: "job".to_string(),
                    status,
                })
                .await
                .unwrap();
        }
        // The updater holds a sender itself, so wait for the state to settle.
        for _ in 0..100 {
            if state.jobs.read().await.get("job").is_some_and(JobStatus::is_terminal) {
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(10)).await;
        }
        updater.abort();

        assert_eq!(
            state.jobs.read().await.get("job"),
            Some(&JobStatus::Completed("done".to_string()))
        );
        assert!(state.aborts.read().await.is_empty());
    }
}
