#![forbid(unsafe_code)]

//! Mission timer and alert engine for search-and-rescue team coordination.
//!
//! Tracks deployment time per field team, escalates through two warning
//! thresholds, and keeps a threaded, filterable mission log that a desktop
//! UI, a mobile HTTP mirror and a local control CLI can all read
//! concurrently.

pub mod config;
pub mod engine;
pub mod errors;
pub mod export;
pub mod ipc;
pub mod mirror;
pub mod models;
pub mod orchestrator;

pub use config::GlobalConfig;
pub use engine::MissionEngine;
pub use errors::{AppError, Result};
