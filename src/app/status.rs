use crate::config::Config;
use crate::workflow::{RunReport, ServiceStatus};

pub fn render_status(config: &Config, status: ServiceStatus) -> String {
    let mut lines = vec![
        "◆ Gamekeeper Status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        String::new(),
        format!("  Cluster   {}", config.service.cluster),
        format!("  Service   {}", config.service.service),
        format!("  Region    {}", config.service.region),
        format!(
            "  Tasks     {} running / {} desired",
            status.running_count, status.desired_count
        ),
        format!(
            "  State     {}",
            if status.is_running() {
                "up"
            } else if status.desired_count > 0 {
                "starting"
            } else {
                "down"
            }
        ),
    ];

    let shutdown = &config.auto_shutdown;
    if shutdown.enabled {
        lines.push(format!(
            "  Idle stop CPU < {}% for {} periods",
            shutdown.cpu_utilization_min, shutdown.evaluation_periods
        ));
    } else {
        lines.push("  Idle stop disabled".to_string());
    }

    lines.join("\n")
}

pub fn render_run_report(report: &RunReport) -> String {
    let mut lines = vec![
        format!("run {} ({:?})", report.run_id, report.path),
        format!("  ack     {}", report.acknowledgement.content),
    ];
    if let Some(update) = &report.update {
        lines.push(format!("  update  {}", update.content));
    }
    lines.join("\n")
}
