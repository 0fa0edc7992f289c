//! Interview pipeline backend: hiring records in an in-memory store, a REST API
//! over them, CSV exports and scheduled reminder/archival jobs.

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod hiring;
pub mod http;
pub mod jobs;
pub mod store;
pub mod telemetry;
