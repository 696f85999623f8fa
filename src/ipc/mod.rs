//! Local IPC layer for `mission-timer-ctl` interaction.
//!
//! Provides a named pipe (Windows) or Unix domain socket (Linux/macOS)
//! server that accepts JSON-line commands from the companion CLI. This is
//! the keyboard/manual-input surface: timer commands, notes and replies.

pub mod server;

pub use server::{dispatch, spawn_ipc_server, IpcRequest, IpcResponse};
