use async_trait::async_trait;

use crate::error::DiscordError;
use crate::workflow::{Interaction, Notifier};

use super::http_client::DiscordHttpClient;
use super::types::{InteractionCallbackType, MAX_MESSAGE_LENGTH};

/// Replies to interactions through the Discord HTTP API.
pub struct DiscordNotifier {
    http: DiscordHttpClient,
    application_id: String,
}

impl DiscordNotifier {
    pub fn new(http: DiscordHttpClient, application_id: impl Into<String>) -> Self {
        Self {
            http,
            application_id: application_id.into(),
        }
    }
}

fn clamp(content: &str) -> &str {
    match content.char_indices().nth(MAX_MESSAGE_LENGTH) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn post_initial(
        &self,
        interaction: &Interaction,
        content: &str,
    ) -> Result<(), DiscordError> {
        self.http
            .create_interaction_response(
                &interaction.interaction_id,
                &interaction.interaction_token,
                InteractionCallbackType::ChannelMessageWithSource,
                Some(clamp(content)),
            )
            .await
    }

    async fn patch_original(
        &self,
        interaction: &Interaction,
        content: &str,
    ) -> Result<(), DiscordError> {
        self.http
            .edit_original_interaction_response(
                &self.application_id,
                &interaction.interaction_token,
                clamp(content),
            )
            .await
    }
}
