use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

use super::credentials::CredentialsProvider;
use super::sigv4::{RequestToSign, sign};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Minimal AWS JSON 1.1 protocol client for one service in one region.
pub struct AwsJsonClient {
    client: reqwest::Client,
    endpoint: Url,
    region: String,
    signing_name: &'static str,
    target_prefix: &'static str,
    credentials: Arc<CredentialsProvider>,
}

#[derive(serde::Deserialize)]
struct AwsErrorBody {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

impl AwsJsonClient {
    pub fn new(
        signing_name: &'static str,
        target_prefix: &'static str,
        region: &str,
        endpoint: Option<&str>,
        credentials: Arc<CredentialsProvider>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let endpoint = endpoint.map_or_else(
            || format!("https://{signing_name}.{region}.amazonaws.com/"),
            ToOwned::to_owned,
        );
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| ServiceError::Request(format!("invalid endpoint {endpoint}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServiceError::from)?;

        Ok(Self {
            client,
            endpoint,
            region: region.to_string(),
            signing_name,
            target_prefix,
            credentials,
        })
    }

    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Signs and sends one `{target_prefix}.{operation}` call.
    pub async fn call<Req, Resp>(&self, operation: &str, input: &Req) -> Result<Resp, ServiceError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body =
            serde_json::to_vec(input).map_err(|e| ServiceError::Request(e.to_string()))?;
        let target = format!("{}.{operation}", self.target_prefix);
        let host = self.host();
        let credentials = self.credentials.credentials().await?;

        let signed = sign(
            &credentials,
            &self.region,
            self.signing_name,
            &RequestToSign {
                host: &host,
                target: &target,
                content_type: CONTENT_TYPE,
                body: &body,
            },
            Utc::now(),
        )?;

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-target", &target)
            .header("authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }

        tracing::debug!(operation = %target, "aws request");
        let response = request.body(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(format!("{target}: {e}")))
    }

    fn api_error(status: u16, body: &[u8]) -> ServiceError {
        let parsed: Option<AwsErrorBody> = serde_json::from_slice(body).ok();
        let code = parsed
            .as_ref()
            .and_then(|b| b.kind.as_deref())
            .map_or_else(|| format!("HTTP{status}"), error_code);
        let message = parsed
            .and_then(|b| b.message)
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
        ServiceError::Api { code, message }
    }
}

/// `com.amazonaws.ecs#ClusterNotFoundException` → `ClusterNotFoundException`.
fn error_code(raw: &str) -> String {
    let tail = raw.rsplit('#').next().unwrap_or(raw);
    tail.split(':').next().unwrap_or(tail).to_string()
}
