use serde::{Deserialize, Serialize};

pub const DEFAULT_CPU_UTILIZATION_MIN: f64 = 5.0;
pub const DEFAULT_EVALUATION_PERIODS: u32 = 6;

/// Idle shutdown driven by a CloudWatch CPU alarm.
///
/// The alarm itself lives in CloudWatch; these values document and
/// validate what it should be configured with.
#[derive(Clone, Serialize, Deserialize)]
pub struct AutoShutdownConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Average CPU percentage under which the service counts as idle.
    #[serde(default = "default_cpu_utilization_min")]
    pub cpu_utilization_min: f64,
    /// Consecutive idle periods before the alarm fires.
    #[serde(default = "default_evaluation_periods")]
    pub evaluation_periods: u32,
    /// Shared secret every `/alarms` delivery must carry, either as the
    /// `X-Webhook-Secret` header or as `?secret=` on the SNS subscription URL.
    #[serde(default)]
    pub secret: Option<String>,
    /// When set, deliveries from any other SNS topic are refused.
    #[serde(default)]
    pub topic_arn: Option<String>,
}

impl std::fmt::Debug for AutoShutdownConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoShutdownConfig")
            .field("enabled", &self.enabled)
            .field("cpu_utilization_min", &self.cpu_utilization_min)
            .field("evaluation_periods", &self.evaluation_periods)
            .field("topic_arn", &self.topic_arn)
            .finish_non_exhaustive()
    }
}

fn default_cpu_utilization_min() -> f64 {
    DEFAULT_CPU_UTILIZATION_MIN
}

fn default_evaluation_periods() -> u32 {
    DEFAULT_EVALUATION_PERIODS
}

impl Default for AutoShutdownConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cpu_utilization_min: DEFAULT_CPU_UTILIZATION_MIN,
            evaluation_periods: DEFAULT_EVALUATION_PERIODS,
            secret: None,
            topic_arn: None,
        }
    }
}
