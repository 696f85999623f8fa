//! Read-mostly HTTP mirror for the smartphone companion page.
//!
//! Serves JSON snapshots of the mission log and team timers. The one write
//! is `POST /api/replies`, which threads a reply under an existing entry
//! through the engine. Every response is built from a single consistent
//! engine read; no handler ever sees a half-written entry.

pub mod server;

pub use server::{router, serve_mirror, serve_with_listener};
