//! Axum-based HTTP gateway for Discord interactions and idle alarms.
//!
//! - Ed25519 verification of every interaction before it is parsed
//! - Shared-secret check on every alarm delivery
//! - Request body size limits (64KB max)
//! - Request timeouts (30s) to prevent slow-loris attacks

mod handlers;
mod replay_guard;
mod server;

pub use handlers::ALARM_SECRET_HEADER;
pub use replay_guard::InteractionGuard;
pub use server::{build_app, run_gateway, run_gateway_with_listener};

use crate::autoshutdown::AlarmHandler;
use crate::workflow::WorkflowRunner;
use ed25519_dalek::VerifyingKey;
use std::sync::Arc;

/// Maximum request body size (64KB) -- prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s) -- prevents slow-loris attacks
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub public_key: Arc<VerifyingKey>,
    pub runner: Arc<WorkflowRunner>,
    pub interactions: Arc<InteractionGuard>,
    /// Present only when `[auto_shutdown] enabled = true`.
    pub alarms: Option<Arc<AlarmHandler>>,
}
