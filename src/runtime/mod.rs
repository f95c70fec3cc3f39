//! # Runtime
//!
//! Startup and the fixed-interval run loop.

pub mod initialization;
pub mod run_loop;

pub use initialization::{initialize, stop_server, InitializationResult};
pub use run_loop::{run, run_once, PassReport};
