//! Aether Gateway - dashboard HTTP surface and live WebSocket feed

pub mod command;
pub mod server;
pub mod ws;

pub use command::{parse_command, Command};
pub use server::{router, serve, DashboardState};
