//! Aether - an autonomous agent that turns thoughts into artifacts
//!
//! The binary wires the workspace crates together: `aether-agent` runs the
//! cognition and execution loops, `aether-gateway` serves the dashboard.

pub mod app;
pub mod logging;

pub use app::{exit_code, run, seed, snapshot, EXIT_CONFIG, EXIT_STORE};
