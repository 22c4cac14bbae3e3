use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Gamekeeper.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide how to report a failed run; the CLI and server bootstrap
/// continue to use `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum GamekeeperError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Managed service (ECS / Secrets Manager) ─────────────────────────
    #[error("service: {0}")]
    Service(#[from] ServiceError),

    // ── Discord HTTP API ────────────────────────────────────────────────
    #[error("discord: {0}")]
    Discord(#[from] DiscordError),

    // ── Inbound webhooks ────────────────────────────────────────────────
    #[error("webhook: {0}")]
    Webhook(#[from] WebhookError),

    // ── Workflow runs ───────────────────────────────────────────────────
    #[error("workflow: {0}")]
    Workflow(#[from] WorkflowError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Managed service errors ─────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service {service} not found in cluster {cluster}")]
    NotFound { cluster: String, service: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("api error {code}: {message}")]
    Api { code: String, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("could not obtain AWS credentials: {0}")]
    Credentials(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err.to_string())
        }
    }
}

// ─── Discord errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("request {method} {route} failed: {message}")]
    Request {
        method: String,
        route: String,
        message: String,
    },

    #[error("request {method} {route} returned {status}: {body}")]
    Status {
        method: String,
        route: String,
        status: u16,
        body: String,
    },

    #[error("rate-limited on {route} (retry after {retry_after_secs:.1}s)")]
    RateLimited { route: String, retry_after_secs: f64 },

    #[error("request {method} {route} timed out")]
    Timeout { method: String, route: String },
}

// ─── Webhook errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid request signature")]
    Signature,

    #[error("invalid public key: {0}")]
    PublicKey(String),

    #[error("invalid payload: {0}")]
    Payload(String),

    #[error("refused: {0}")]
    Forbidden(String),
}

// ─── Workflow errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("no transition from {state} on {event}")]
    InvalidTransition { state: String, event: String },

    #[error("managed service call failed: {0}")]
    Service(#[from] ServiceError),

    #[error("notification failed: {0}")]
    Notify(#[from] DiscordError),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, GamekeeperError>;
