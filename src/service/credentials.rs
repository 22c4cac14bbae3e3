//! AWS credential resolution for long-running processes.
//!
//! Static keys are used as-is. Container (ECS task role) and instance
//! metadata (EC2 role) credentials are temporary: they are cached and
//! fetched again shortly before they expire.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::ServiceError;

use super::sigv4::AwsCredentials;

/// Host of the ECS task metadata endpoint that serves
/// `AWS_CONTAINER_CREDENTIALS_RELATIVE_URI`.
pub const CONTAINER_CREDENTIALS_HOST: &str = "http://169.254.170.2";
pub const INSTANCE_METADATA_ENDPOINT: &str = "http://169.254.169.254";

/// Refresh this long before the advertised expiry.
const REFRESH_WINDOW_SECS: i64 = 5 * 60;
const IMDS_TOKEN_TTL_SECS: &str = "21600";

/// Where credentials come from, in resolution order.
#[derive(Clone)]
pub enum CredentialSource {
    Static(AwsCredentials),
    /// ECS container credentials endpoint (full URI).
    Container {
        uri: String,
        authorization: Option<String>,
    },
    /// EC2 instance metadata service, IMDSv2.
    InstanceMetadata { endpoint: String },
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(creds) => f.debug_tuple("Static").field(creds).finish(),
            Self::Container { uri, .. } => f
                .debug_struct("Container")
                .field("uri", uri)
                .finish_non_exhaustive(),
            Self::InstanceMetadata { endpoint } => f
                .debug_struct("InstanceMetadata")
                .field("endpoint", endpoint)
                .finish(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TemporaryCredentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

struct Cached {
    credentials: AwsCredentials,
    expires_at: Option<DateTime<Utc>>,
}

impl Cached {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| {
            expires_at - chrono::Duration::seconds(REFRESH_WINDOW_SECS) > now
        })
    }
}

/// Hands out signing credentials, refreshing temporary ones before expiry.
pub struct CredentialsProvider {
    source: CredentialSource,
    http: reqwest::Client,
    cached: Mutex<Option<Cached>>,
}

impl CredentialsProvider {
    pub fn new(source: CredentialSource, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServiceError::from)?;
        Ok(Self {
            source,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Provider that always returns `credentials`.
    pub fn fixed(credentials: AwsCredentials) -> Self {
        Self {
            source: CredentialSource::Static(credentials),
            http: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// Current credentials. Concurrent callers share one refresh.
    pub async fn credentials(&self) -> Result<AwsCredentials, ServiceError> {
        if let CredentialSource::Static(credentials) = &self.source {
            return Ok(credentials.clone());
        }

        let mut cached = self.cached.lock().await;
        if let Some(current) = cached.as_ref().filter(|c| c.is_fresh(Utc::now())) {
            return Ok(current.credentials.clone());
        }

        let fetched = match &self.source {
            CredentialSource::Container { uri, authorization } => {
                self.fetch_container(uri, authorization.as_deref()).await?
            }
            CredentialSource::InstanceMetadata { endpoint } => {
                self.fetch_instance_metadata(endpoint).await?
            }
            CredentialSource::Static(credentials) => return Ok(credentials.clone()),
        };

        tracing::debug!(
            source = ?self.source,
            expires_at = ?fetched.expiration,
            "refreshed AWS credentials"
        );
        let fresh = Cached {
            credentials: AwsCredentials {
                access_key_id: fetched.access_key_id,
                secret_access_key: fetched.secret_access_key,
                session_token: fetched.token.filter(|t| !t.is_empty()),
            },
            expires_at: fetched.expiration,
        };
        let credentials = fresh.credentials.clone();
        *cached = Some(fresh);
        Ok(credentials)
    }

    async fn fetch_container(
        &self,
        uri: &str,
        authorization: Option<&str>,
    ) -> Result<TemporaryCredentials, ServiceError> {
        let mut request = self.http.get(uri);
        if let Some(token) = authorization {
            request = request.header("authorization", token);
        }
        let response = request.send().await.map_err(credentials_error)?;
        decode_credentials(response, "container credentials").await
    }

    async fn fetch_instance_metadata(
        &self,
        endpoint: &str,
    ) -> Result<TemporaryCredentials, ServiceError> {
        let endpoint = endpoint.trim_end_matches('/');

        let response = self
            .http
            .put(format!("{endpoint}/latest/api/token"))
            .header("x-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECS)
            .send()
            .await
            .map_err(credentials_error)?;
        let token = success_text(response, "metadata token").await?;

        let roles_url = format!("{endpoint}/latest/meta-data/iam/security-credentials/");
        let response = self
            .http
            .get(&roles_url)
            .header("x-aws-ec2-metadata-token", &token)
            .send()
            .await
            .map_err(credentials_error)?;
        let roles = success_text(response, "instance role").await?;
        let role = roles
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| {
                ServiceError::Credentials("no IAM role attached to this instance".into())
            })?;

        let response = self
            .http
            .get(format!("{roles_url}{role}"))
            .header("x-aws-ec2-metadata-token", &token)
            .send()
            .await
            .map_err(credentials_error)?;
        decode_credentials(response, "instance credentials").await
    }
}

fn credentials_error(err: reqwest::Error) -> ServiceError {
    ServiceError::Credentials(err.to_string())
}

async fn success_text(response: reqwest::Response, what: &str) -> Result<String, ServiceError> {
    let status = response.status();
    let text = response.text().await.map_err(credentials_error)?;
    if !status.is_success() {
        return Err(ServiceError::Credentials(format!(
            "{what} request returned {status}: {text}"
        )));
    }
    Ok(text.trim().to_string())
}

async fn decode_credentials(
    response: reqwest::Response,
    what: &str,
) -> Result<TemporaryCredentials, ServiceError> {
    let body = success_text(response, what).await?;
    serde_json::from_str(&body).map_err(|e| ServiceError::Credentials(format!("{what}: {e}")))
}
