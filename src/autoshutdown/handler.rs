use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::error::{GamekeeperError, Result, WebhookError};
use crate::service::EcsClient;

use super::alarm::{
    AlarmAction, CloudWatchAlarm, Delivery, Notification, is_sns_subscribe_url,
    parse_notifications,
};

/// Tally of one alarm delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmReport {
    pub scaled: u32,
    pub ignored: u32,
    pub confirmed: u32,
}

/// Scales the game server to zero when its idle alarm fires.
///
/// Only the configured cluster/service pair is ever touched; alarms naming
/// anything else are logged and skipped. Callers must present the shared
/// secret, and deliveries from a topic other than the configured one are
/// refused before anything is acted on.
pub struct AlarmHandler {
    ecs: Arc<EcsClient>,
    http: reqwest::Client,
    cluster: String,
    service: String,
    secret: Option<String>,
    topic_arn: Option<String>,
}

impl AlarmHandler {
    pub fn new(
        ecs: Arc<EcsClient>,
        cluster: impl Into<String>,
        service: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build SNS confirmation client")?;
        Ok(Self {
            ecs,
            http,
            cluster: cluster.into(),
            service: service.into(),
            secret: None,
            topic_arn: None,
        })
    }

    #[must_use]
    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }

    #[must_use]
    pub fn with_topic_arn(mut self, topic_arn: Option<String>) -> Self {
        self.topic_arn = topic_arn.filter(|t| !t.is_empty());
        self
    }

    /// Constant-time check of the caller's secret. Nothing is authorized
    /// when no secret is configured.
    pub fn authorize(&self, provided: Option<&str>) -> bool {
        match (self.secret.as_deref(), provided) {
            (Some(expected), Some(provided)) => constant_time_eq(provided, expected),
            _ => false,
        }
    }

    pub async fn handle(&self, body: &[u8]) -> Result<AlarmReport> {
        let deliveries = parse_notifications(body)?;
        for delivery in &deliveries {
            self.admit(delivery)?;
        }

        let mut report = AlarmReport::default();
        for Delivery { notification, .. } in deliveries {
            match notification {
                Notification::SubscriptionConfirmation { subscribe_url } => {
                    self.confirm_subscription(&subscribe_url).await?;
                    report.confirmed += 1;
                }
                Notification::Alarm(raw) => {
                    let alarm = CloudWatchAlarm::parse(&raw)?;
                    if self.apply(&alarm).await? {
                        report.scaled += 1;
                    } else {
                        report.ignored += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    fn admit(&self, delivery: &Delivery) -> std::result::Result<(), WebhookError> {
        if let Some(expected) = self.topic_arn.as_deref() {
            if delivery.topic_arn.as_deref() != Some(expected) {
                return Err(WebhookError::Forbidden(format!(
                    "topic {} is not {expected}",
                    delivery.topic_arn.as_deref().unwrap_or("<none>")
                )));
            }
        }
        if let Notification::SubscriptionConfirmation { subscribe_url } = &delivery.notification {
            if !is_sns_subscribe_url(subscribe_url) {
                return Err(WebhookError::Forbidden(format!(
                    "SubscribeURL {subscribe_url} is not an SNS endpoint"
                )));
            }
        }
        Ok(())
    }

    async fn apply(&self, alarm: &CloudWatchAlarm) -> Result<bool> {
        match alarm.action()? {
            AlarmAction::Ignore { state } => {
                tracing::info!(alarm = %alarm.alarm_name, state = %state, "alarm not firing, ignoring");
                Ok(false)
            }
            AlarmAction::ScaleToZero { cluster, service }
                if cluster != self.cluster || service != self.service =>
            {
                tracing::warn!(
                    alarm = %alarm.alarm_name,
                    cluster = %cluster,
                    service = %service,
                    "alarm names a service this gateway does not manage"
                );
                Ok(false)
            }
            AlarmAction::ScaleToZero { cluster, service } => {
                tracing::info!(
                    alarm = %alarm.alarm_name,
                    cluster = %cluster,
                    service = %service,
                    "server idle, setting desired count to zero"
                );
                self.ecs.update_service(&cluster, &service, 0).await?;
                Ok(true)
            }
        }
    }

    async fn confirm_subscription(&self, subscribe_url: &str) -> Result<()> {
        let response = self
            .http
            .get(subscribe_url)
            .send()
            .await
            .context("confirm SNS subscription")?;
        let status = response.status();
        if !status.is_success() {
            return Err(GamekeeperError::Other(anyhow::anyhow!(
                "SNS subscription confirmation returned {status}"
            )));
        }
        tracing::info!("SNS subscription confirmed");
        Ok(())
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{AwsCredentials, CredentialsProvider};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "secret".into(),
            session_token: None,
        }
    }

    fn handler(server: &MockServer) -> AlarmHandler {
        let ecs = EcsClient::new(
            "us-east-1",
            Some(&server.uri()),
            Arc::new(CredentialsProvider::fixed(creds())),
            Duration::from_secs(5),
        )
        .unwrap();
        AlarmHandler::new(Arc::new(ecs), "games", "valheim", Duration::from_secs(5))
            .unwrap()
            .with_secret(Some("alarm-secret".into()))
    }

    fn alarm_body(state: &str, service: &str) -> Vec<u8> {
        let alarm = json!({
            "AlarmName": "idle",
            "NewStateValue": state,
            "Trigger": {"Dimensions": [
                {"name": "ClusterName", "value": "games"},
                {"name": "ServiceName", "value": service}
            ]}
        });
        json!({"Type": "Notification", "Message": alarm.to_string()})
            .to_string()
            .into_bytes()
    }

    #[tokio::test]
    async fn firing_alarm_scales_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header(
                "x-amz-target",
                "AmazonEC2ContainerServiceV20141113.UpdateService",
            ))
            .and(body_partial_json(json!({"desiredCount": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "service": {"serviceName": "valheim", "runningCount": 1, "desiredCount": 0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = handler(&server)
            .handle(&alarm_body("ALARM", "valheim"))
            .await
            .unwrap();
        assert_eq!(report.scaled, 1);
    }

    #[tokio::test]
    async fn ok_state_and_foreign_service_do_not_scale() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let handler = handler(&server);
        let report = handler.handle(&alarm_body("OK", "valheim")).await.unwrap();
        assert_eq!(report.ignored, 1);

        let report = handler
            .handle(&alarm_body("ALARM", "minecraft"))
            .await
            .unwrap();
        assert_eq!(report.ignored, 1);
        assert_eq!(report.scaled, 0);
    }

    #[test]
    fn authorize_requires_matching_secret() {
        let server_uri = "http://127.0.0.1:9";
        let ecs = EcsClient::new(
            "us-east-1",
            Some(server_uri),
            Arc::new(CredentialsProvider::fixed(creds())),
            Duration::from_secs(1),
        )
        .unwrap();
        let open = AlarmHandler::new(Arc::new(ecs), "games", "valheim", Duration::from_secs(1))
            .unwrap();
        assert!(!open.authorize(Some("")));
        assert!(!open.authorize(None));

        let guarded = open.with_secret(Some("alarm-secret".into()));
        assert!(guarded.authorize(Some("alarm-secret")));
        assert!(!guarded.authorize(Some("alarm-secreT")));
        assert!(!guarded.authorize(Some("alarm-secret-longer")));
        assert!(!guarded.authorize(None));
    }

    #[tokio::test]
    async fn subscribe_url_off_sns_is_never_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let body = json!({
            "Type": "SubscriptionConfirmation",
            "SubscribeURL": format!("{}/latest/meta-data/", server.uri())
        });
        let err = handler(&server)
            .handle(body.to_string().as_bytes())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GamekeeperError::Webhook(WebhookError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn foreign_topic_is_refused_before_scaling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let handler = handler(&server)
            .with_topic_arn(Some("arn:aws:sns:us-east-1:123456789012:valheim-idle".into()));
        let alarm = json!({
            "AlarmName": "idle",
            "NewStateValue": "ALARM",
            "Trigger": {"Dimensions": [
                {"name": "ClusterName", "value": "games"},
                {"name": "ServiceName", "value": "valheim"}
            ]}
        });

        for topic in [Some("arn:aws:sns:us-east-1:999999999999:other"), None] {
            let mut body = json!({"Type": "Notification", "Message": alarm.to_string()});
            if let Some(topic) = topic {
                body["TopicArn"] = json!(topic);
            }
            let err = handler
                .handle(body.to_string().as_bytes())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                GamekeeperError::Webhook(WebhookError::Forbidden(_))
            ));
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_webhook_error() {
        let server = MockServer::start().await;
        let err = handler(&server).handle(b"{}").await.unwrap_err();
        assert!(matches!(err, GamekeeperError::Webhook(_)));
    }
}
