//! HTTP surface for the SOAR pipeline: webhook ingestion, admin operations,
//! the read-only query API, and metrics/health -- the external-facing layer
//! wired here against the alert-processing pipeline.

pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod report;

pub use api::{router, AppState};
pub use config::Config;
pub use error::ServerError;
pub use handler::PipelineHandler;
