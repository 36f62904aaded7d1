//! Library entry point for the notify-hub crate.
//! Re-exports the shared string and path aliases used across actors.

pub mod api;
pub mod cache;
pub mod channel;
pub mod config;
pub mod log;
pub mod net;
pub mod notification;
pub mod utils;

pub use utils::*;
