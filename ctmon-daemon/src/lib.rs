//! ctmon daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `ctmon` is used as a binary (main.rs).

pub mod cli;
pub mod logging;
pub mod metrics_server;
pub mod readiness;
pub mod sink;
pub mod source;
pub mod supervisor;
