//! CloudWatch alarm notifications delivered through SNS.
//!
//! Two envelopes are accepted: the Lambda event shape
//! (`{"Records": [{"Sns": {"Message": "..."}}]}`) and the body SNS POSTs to an
//! HTTP subscriber (`{"Type": "Notification", "Message": "..."}`).

use reqwest::Url;
use serde::Deserialize;

use crate::error::WebhookError;

const ALARM_STATE: &str = "ALARM";

/// One unit of work pulled out of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A JSON-encoded CloudWatch alarm.
    Alarm(String),
    /// SNS wants the subscriber to GET this URL before it delivers anything.
    SubscriptionConfirmation { subscribe_url: String },
}

/// A notification plus the SNS topic it claims to come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic_arn: Option<String>,
    pub notification: Notification,
}

/// What to do about one alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmAction {
    ScaleToZero { cluster: String, service: String },
    Ignore { state: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LambdaEvent {
    records: Vec<LambdaRecord>,
}

#[derive(Debug, Deserialize)]
struct LambdaRecord {
    #[serde(rename = "Sns")]
    sns: SnsRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SnsRecord {
    message: String,
    #[serde(default)]
    topic_arn: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SnsHttpMessage {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "SubscribeURL", default)]
    subscribe_url: Option<String>,
    #[serde(default)]
    topic_arn: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CloudWatchAlarm {
    #[serde(default)]
    pub alarm_name: String,
    pub new_state_value: String,
    pub trigger: Trigger,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Trigger {
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// Split a request body into the notifications it carries.
pub fn parse_notifications(body: &[u8]) -> Result<Vec<Delivery>, WebhookError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| WebhookError::Payload(e.to_string()))?;

    if value.get("Records").is_some() {
        let event: LambdaEvent =
            serde_json::from_value(value).map_err(|e| WebhookError::Payload(e.to_string()))?;
        return Ok(event
            .records
            .into_iter()
            .map(|r| Delivery {
                topic_arn: r.sns.topic_arn,
                notification: Notification::Alarm(r.sns.message),
            })
            .collect());
    }

    let message: SnsHttpMessage =
        serde_json::from_value(value).map_err(|e| WebhookError::Payload(e.to_string()))?;
    let notification = match message.kind.as_str() {
        "Notification" => message
            .message
            .map(Notification::Alarm)
            .ok_or_else(|| WebhookError::Payload("notification without Message".into()))?,
        "SubscriptionConfirmation" => message
            .subscribe_url
            .map(|subscribe_url| Notification::SubscriptionConfirmation { subscribe_url })
            .ok_or_else(|| WebhookError::Payload("confirmation without SubscribeURL".into()))?,
        other => {
            return Err(WebhookError::Payload(format!(
                "unsupported SNS message type: {other}"
            )));
        }
    };
    Ok(vec![Delivery {
        topic_arn: message.topic_arn,
        notification,
    }])
}

/// True only for `https://sns.<region>.amazonaws.com[.cn]/...` on the default port.
pub fn is_sns_subscribe_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if url.scheme() != "https"
        || url.port().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
    {
        return false;
    }
    let Some(rest) = url.host_str().and_then(|host| host.strip_prefix("sns.")) else {
        return false;
    };
    rest.strip_suffix(".amazonaws.com")
        .or_else(|| rest.strip_suffix(".amazonaws.com.cn"))
        .is_some_and(|region| {
            !region.is_empty()
                && region
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        })
}

impl CloudWatchAlarm {
    pub fn parse(raw: &str) -> Result<Self, WebhookError> {
        serde_json::from_str(raw).map_err(|e| WebhookError::Payload(e.to_string()))
    }

    fn dimension(&self, name: &str) -> Option<&str> {
        self.trigger
            .dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Decide the action. The target must be named by the alarm's dimensions.
    pub fn action(&self) -> Result<AlarmAction, WebhookError> {
        let cluster = self.dimension("ClusterName");
        let service = self.dimension("ServiceName");
        let (Some(cluster), Some(service)) = (cluster, service) else {
            return Err(WebhookError::Payload(format!(
                "cluster and service are required, got cluster={} service={}",
                cluster.unwrap_or_default(),
                service.unwrap_or_default()
            )));
        };

        if self.new_state_value != ALARM_STATE {
            return Ok(AlarmAction::Ignore {
                state: self.new_state_value.clone(),
            });
        }

        Ok(AlarmAction::ScaleToZero {
            cluster: cluster.to_string(),
            service: service.to_string(),
        })
    }
}
