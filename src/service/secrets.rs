use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::ServiceError;

use super::aws_json::AwsJsonClient;
use super::credentials::CredentialsProvider;

/// Discord bot credential as stored in Secrets Manager.
///
/// Only `AppId` and `Authorization` are needed at run time; the rest serve
/// webhook verification and command registration.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscordSecret {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl std::fmt::Debug for DiscordSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSecret")
            .field("app_id", &self.app_id)
            .field("guild_id", &self.guild_id)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct GetSecretValueOutput {
    #[serde(rename = "SecretString", default)]
    secret_string: Option<String>,
}

pub async fn fetch_discord_secret(
    region: &str,
    endpoint: Option<&str>,
    credentials: Arc<CredentialsProvider>,
    timeout: Duration,
    secret_id: &str,
) -> Result<DiscordSecret, ServiceError> {
    let api = AwsJsonClient::new(
        "secretsmanager",
        "secretsmanager",
        region,
        endpoint,
        credentials,
        timeout,
    )?;
    let output: GetSecretValueOutput = api
        .call("GetSecretValue", &json!({ "SecretId": secret_id }))
        .await?;
    let raw = output
        .secret_string
        .ok_or_else(|| ServiceError::Decode(format!("secret {secret_id} has no SecretString")))?;
    parse_secret(&raw)
}

fn parse_secret(raw: &str) -> Result<DiscordSecret, ServiceError> {
    serde_json::from_str(raw).map_err(|e| ServiceError::Decode(format!("secret JSON: {e}")))
}
