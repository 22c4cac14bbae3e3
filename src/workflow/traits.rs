use async_trait::async_trait;

use crate::error::{DiscordError, ServiceError};

use super::types::{Interaction, ServiceStatus};

/// Control surface of the managed game-server service.
///
/// The service identity is fixed when the implementation is built; calls
/// take no per-request target.
#[async_trait]
pub trait ServiceControl: Send + Sync {
    /// Current running and desired replica counts.
    async fn describe(&self) -> Result<ServiceStatus, ServiceError>;

    /// Request convergence to `desired` replicas. Does not wait for it.
    async fn set_desired_count(&self, desired: u32) -> Result<ServiceStatus, ServiceError>;
}

/// Outbound replies to the chat platform for one interaction.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Initial response, addressed by interaction id and token.
    async fn post_initial(&self, interaction: &Interaction, content: &str)
    -> Result<(), DiscordError>;

    /// Replace the initial response, addressed by token and application id.
    async fn patch_original(
        &self,
        interaction: &Interaction,
        content: &str,
    ) -> Result<(), DiscordError>;
}
