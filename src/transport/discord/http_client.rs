use std::time::Duration;

use reqwest::{Method, Response, header::HeaderMap};
use serde_json::json;

use crate::error::DiscordError;

use super::types::{API_BASE, InteractionCallbackType};

pub struct DiscordHttpClient {
    client: reqwest::Client,
    api_base: String,
    authorization: String,
}

impl DiscordHttpClient {
    /// `authorization` is sent verbatim (e.g. `Bot <token>`).
    pub fn new(authorization: impl Into<String>, timeout: Duration) -> Result<Self, DiscordError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscordError::Request {
                method: "-".into(),
                route: "-".into(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            api_base: API_BASE.to_string(),
            authorization: authorization.into(),
        })
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn create_interaction_response(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        response_type: InteractionCallbackType,
        content: Option<&str>,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/interactions/{interaction_id}/{interaction_token}/callback",
            self.api_base
        );
        let mut body = json!({ "type": response_type as u8 });
        if let Some(text) = content {
            body["data"] = json!({ "content": text });
        }
        self.request(Method::POST, &url, Some(body)).await?;
        Ok(())
    }

    pub async fn edit_original_interaction_response(
        &self,
        application_id: &str,
        interaction_token: &str,
        content: &str,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/webhooks/{application_id}/{interaction_token}/messages/@original",
            self.api_base
        );
        self.request(Method::PATCH, &url, Some(json!({ "content": content })))
            .await?;
        Ok(())
    }

    /// Creates (or overwrites by name) one guild command and returns its id.
    pub async fn create_guild_command(
        &self,
        application_id: &str,
        guild_id: &str,
        command: &serde_json::Value,
    ) -> Result<String, DiscordError> {
        let url = format!(
            "{}/applications/{application_id}/guilds/{guild_id}/commands",
            self.api_base
        );
        let response = self
            .request(Method::POST, &url, Some(command.clone()))
            .await?;
        let route = Self::route_key(&url);
        let created: serde_json::Value =
            response.json().await.map_err(|e| DiscordError::Request {
                method: "POST".into(),
                route: route.clone(),
                message: format!("parse command response: {e}"),
            })?;
        created
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(String::from)
            .ok_or_else(|| DiscordError::Request {
                method: "POST".into(),
                route,
                message: "command response has no id".into(),
            })
    }

    pub async fn delete_guild_command(
        &self,
        application_id: &str,
        guild_id: &str,
        command_id: &str,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/applications/{application_id}/guilds/{guild_id}/commands/{command_id}",
            self.api_base
        );
        self.request(Method::DELETE, &url, None).await?;
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, DiscordError> {
        let route = Self::route_key(url);
        let mut request_builder = self
            .client
            .request(method.clone(), url)
            .header("Authorization", &self.authorization);
        if let Some(payload) = body {
            request_builder = request_builder.json(&payload);
        }

        let response = request_builder.send().await.map_err(|error| {
            if error.is_timeout() {
                DiscordError::Timeout {
                    method: method.to_string(),
                    route: route.clone(),
                }
            } else {
                DiscordError::Request {
                    method: method.to_string(),
                    route: route.clone(),
                    message: error.to_string(),
                }
            }
        })?;

        if response.status().as_u16() == 429 {
            let retry_after = Self::parse_retry_after(response.headers())
                .unwrap_or_else(|| Duration::from_secs(1));
            return Err(DiscordError::RateLimited {
                route,
                retry_after_secs: retry_after.as_secs_f64(),
            });
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|error| format!("<failed to read response body: {error}>"));
            return Err(DiscordError::Status {
                method: method.to_string(),
                route,
                status,
                body: body_text,
            });
        }

        tracing::debug!(method = %method, route = %route, "discord request ok");
        Ok(response)
    }

    fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
        let seconds = headers
            .get("Retry-After")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<f64>().ok())?;
        if seconds <= 0.0 {
            return Some(Duration::from_secs(0));
        }
        Duration::try_from_secs_f64(seconds).ok()
    }

    /// Path with ids and interaction tokens masked, safe to log.
    fn route_key(url: &str) -> String {
        let path = reqwest::Url::parse(url)
            .map_or_else(|_| url.to_string(), |parsed| parsed.path().to_string());
        let path_without_api_prefix = path
            .strip_prefix("/api/v10")
            .map_or(path.as_str(), |stripped| stripped);

        let is_id = |segment: &str| segment.chars().all(|character| character.is_ascii_digit());
        let segments: Vec<&str> = path_without_api_prefix
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let normalized = segments
            .iter()
            .enumerate()
            .map(|(i, &segment)| {
                let follows_owner_id = i >= 2
                    && matches!(segments[i - 2], "interactions" | "webhooks")
                    && is_id(segments[i - 1]);
                if is_id(segment) {
                    "{id}"
                } else if follows_owner_id {
                    "{token}"
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>()
            .join("/");

        format!("/{normalized}")
    }
}
