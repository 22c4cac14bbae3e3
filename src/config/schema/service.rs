use serde::{Deserialize, Serialize};

use crate::service::AwsCredentials;
use crate::service::credentials::{
    CONTAINER_CREDENTIALS_HOST, CredentialSource, INSTANCE_METADATA_ENDPOINT,
};

/// Which ECS service is the game server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub service: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Override for the ECS endpoint (local emulators, tests).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Override for the Secrets Manager endpoint.
    #[serde(default)]
    pub secrets_endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".into()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cluster: String::new(),
            service: String::new(),
            region: default_region(),
            endpoint: None,
            secrets_endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// AWS credentials. Static keys win; otherwise the ECS container endpoint,
/// then the EC2 instance metadata service.
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    /// Full URI of the container credentials endpoint.
    #[serde(default)]
    pub container_credentials_uri: Option<String>,
    #[serde(default)]
    pub container_authorization_token: Option<String>,
    #[serde(default = "default_instance_metadata")]
    pub instance_metadata: bool,
    #[serde(default = "default_instance_metadata_endpoint")]
    pub instance_metadata_endpoint: String,
}

fn default_instance_metadata() -> bool {
    true
}

fn default_instance_metadata_endpoint() -> String {
    INSTANCE_METADATA_ENDPOINT.into()
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            container_credentials_uri: None,
            container_authorization_token: None,
            instance_metadata: default_instance_metadata(),
            instance_metadata_endpoint: default_instance_metadata_endpoint(),
        }
    }
}

impl AwsConfig {
    pub fn credentials(&self) -> Option<AwsCredentials> {
        Some(AwsCredentials {
            access_key_id: self.access_key_id.clone().filter(|v| !v.is_empty())?,
            secret_access_key: self.secret_access_key.clone().filter(|v| !v.is_empty())?,
            session_token: self.session_token.clone().filter(|v| !v.is_empty()),
        })
    }

    /// Resolve `AWS_CONTAINER_CREDENTIALS_RELATIVE_URI` against the task
    /// metadata host.
    pub fn set_container_relative_uri(&mut self, relative: &str) {
        self.container_credentials_uri = Some(format!("{CONTAINER_CREDENTIALS_HOST}{relative}"));
    }

    pub fn credential_source(&self) -> Option<CredentialSource> {
        if let Some(credentials) = self.credentials() {
            return Some(CredentialSource::Static(credentials));
        }
        if let Some(uri) = self.container_credentials_uri.clone().filter(|v| !v.is_empty()) {
            return Some(CredentialSource::Container {
                uri,
                authorization: self
                    .container_authorization_token
                    .clone()
                    .filter(|v| !v.is_empty()),
            });
        }
        self.instance_metadata
            .then(|| CredentialSource::InstanceMetadata {
                endpoint: self.instance_metadata_endpoint.clone(),
            })
    }
}

impl std::fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConfig")
            .field("access_key_id", &self.access_key_id)
            .field("container_credentials_uri", &self.container_credentials_uri)
            .field("instance_metadata", &self.instance_metadata)
            .finish_non_exhaustive()
    }
}
