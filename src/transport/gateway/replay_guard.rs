//! Duplicate-delivery protection for the interactions endpoint.
//!
//! Tracks interaction ids seen within the interaction-token lifetime, after
//! which a redelivery could not be answered anyway. In-memory only.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::transport::discord::types::INTERACTION_TOKEN_TTL_SECS;

const MAX_ENTRIES: usize = 10_000;

pub struct InteractionGuard {
    seen: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl InteractionGuard {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(INTERACTION_TOKEN_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            seen: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns `true` if new (start a run), `false` if already handled.
    pub fn check_and_record(&self, interaction_id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if seen.len() > MAX_ENTRIES {
            seen.retain(|_, ts| now.duration_since(*ts) < self.ttl);
        }
        if let Some(ts) = seen.get(interaction_id)
            && now.duration_since(*ts) < self.ttl
        {
            return false;
        }
        seen.insert(interaction_id.to_string(), now);
        true
    }
}

impl std::fmt::Debug for InteractionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionGuard")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
