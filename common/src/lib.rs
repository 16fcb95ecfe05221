//! Shared models for the class namespacing service.
//!
//! Everything in here crosses the HTTP boundary: the backend produces these
//! values and the admin UI (or any other client) consumes them as JSON.

pub mod jobs;
pub mod model;
pub mod requests;
pub mod responses;
