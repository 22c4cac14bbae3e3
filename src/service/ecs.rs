use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::ServiceError;
use crate::workflow::{ServiceControl, ServiceStatus};

use super::aws_json::AwsJsonClient;
use super::credentials::CredentialsProvider;

const SIGNING_NAME: &str = "ecs";
const TARGET_PREFIX: &str = "AmazonEC2ContainerServiceV20141113";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EcsService {
    #[serde(default)]
    service_name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    running_count: u32,
    #[serde(default)]
    desired_count: u32,
}

impl EcsService {
    fn counts(&self) -> ServiceStatus {
        ServiceStatus {
            running_count: self.running_count,
            desired_count: self.desired_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EcsFailure {
    #[serde(default)]
    arn: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct DescribeServicesOutput {
    #[serde(default)]
    services: Vec<EcsService>,
    #[serde(default)]
    failures: Vec<EcsFailure>,
}

#[derive(Debug, Deserialize)]
struct UpdateServiceOutput {
    service: EcsService,
}

/// ECS `DescribeServices` / `UpdateService` over signed JSON.
pub struct EcsClient {
    api: AwsJsonClient,
}

impl EcsClient {
    pub fn new(
        region: &str,
        endpoint: Option<&str>,
        credentials: Arc<CredentialsProvider>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            api: AwsJsonClient::new(
                SIGNING_NAME,
                TARGET_PREFIX,
                region,
                endpoint,
                credentials,
                timeout,
            )?,
        })
    }

    pub async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<ServiceStatus, ServiceError> {
        let output: DescribeServicesOutput = self
            .api
            .call(
                "DescribeServices",
                &json!({ "cluster": cluster, "services": [service] }),
            )
            .await
            .map_err(|e| not_found_or(e, cluster, service))?;

        for failure in &output.failures {
            tracing::warn!(arn = %failure.arn, reason = %failure.reason, "describe failure");
        }

        // An INACTIVE service has been deleted and only lingers in describe results.
        output
            .services
            .iter()
            .find(|s| s.status != "INACTIVE")
            .map(EcsService::counts)
            .ok_or_else(|| ServiceError::NotFound {
                cluster: cluster.to_string(),
                service: service.to_string(),
            })
    }

    pub async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        desired_count: u32,
    ) -> Result<ServiceStatus, ServiceError> {
        let output: UpdateServiceOutput = self
            .api
            .call(
                "UpdateService",
                &json!({
                    "cluster": cluster,
                    "service": service,
                    "desiredCount": desired_count,
                }),
            )
            .await
            .map_err(|e| not_found_or(e, cluster, service))?;

        tracing::info!(
            cluster,
            service = %output.service.service_name,
            desired_count,
            "desired count updated"
        );
        Ok(output.service.counts())
    }
}

fn not_found_or(err: ServiceError, cluster: &str, service: &str) -> ServiceError {
    match err {
        ServiceError::Api { code, .. }
            if code == "ServiceNotFoundException" || code == "ClusterNotFoundException" =>
        {
            ServiceError::NotFound {
                cluster: cluster.to_string(),
                service: service.to_string(),
            }
        }
        other => other,
    }
}

/// The game-server service, bound to one cluster/service pair.
pub struct ManagedService {
    ecs: Arc<EcsClient>,
    cluster: String,
    service: String,
}

impl ManagedService {
    pub fn new(
        ecs: Arc<EcsClient>,
        cluster: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            ecs,
            cluster: cluster.into(),
            service: service.into(),
        }
    }
}

#[async_trait]
impl ServiceControl for ManagedService {
    async fn describe(&self) -> Result<ServiceStatus, ServiceError> {
        self.ecs
            .describe_service(&self.cluster, &self.service)
            .await
    }

    async fn set_desired_count(&self, desired: u32) -> Result<ServiceStatus, ServiceError> {
        self.ecs
            .update_service(&self.cluster, &self.service, desired)
            .await
    }
}
