use std::fmt::Write;

use crate::aggregate::DashboardDataProcessor;
use crate::error::AggregateError;
use crate::models::Status;

pub fn build_report(
    processor: &DashboardDataProcessor<'_>,
    label: Option<&str>,
) -> Result<String, AggregateError> {
    let metrics = processor.overall_metrics()?;
    let distribution = processor.stage_status_distribution();
    let clients = processor.client_performance();
    let services = processor.service_type_analysis();
    let workload = processor.team_workload();

    let mut output = String::new();
    let scope_label = label.unwrap_or("all clients");

    let _ = writeln!(output, "# Engagement Dashboard Report");
    let _ = writeln!(
        output,
        "Generated for {} as of {}",
        scope_label,
        processor.today()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- {} workflows across {} clients and {} services",
        metrics.total_workflows, metrics.total_clients, metrics.total_services
    );
    let _ = writeln!(
        output,
        "- {} active, {} completed, {} blocked, {} overdue",
        metrics.active_workflows,
        metrics.completed_workflows,
        metrics.blocked_workflows,
        metrics.overdue_workflows
    );
    let _ = writeln!(output, "- average progress {:.0}%", metrics.average_progress);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");
    for (status, point) in Status::ALL.iter().zip(distribution.display.iter()) {
        let actual = distribution.counts.get(*status);
        if actual == point.value {
            let _ = writeln!(output, "- {}: {}", point.name, actual);
        } else {
            let _ = writeln!(
                output,
                "- {}: {} (charted as {})",
                point.name, actual, point.value
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Client Performance");
    for client in clients.iter() {
        let _ = writeln!(
            output,
            "- {}: {}/{} workflows complete, progress {:.1}%",
            client.client_name.as_deref().unwrap_or(&client.client_id),
            client.completed_workflows,
            client.total_workflows,
            client.average_progress
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Service Lines");
    for service in services.iter() {
        let _ = writeln!(
            output,
            "- {}: {} workflows, progress {:.1}%, {:.1} days since update",
            service.service_name,
            service.total_workflows,
            service.average_progress,
            service.average_duration_days
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Workload by Role");
    if workload.is_empty() {
        let _ = writeln!(output, "No assigned stage entries.");
    } else {
        for row in workload.iter() {
            let _ = writeln!(
                output,
                "- {}: {} in progress, {} completed, {} overdue",
                row.role, row.in_progress, row.completed, row.overdue
            );
        }
    }

    let active_days: Vec<_> = processor
        .timeline_trends()
        .filter(|point| point.matched > 0)
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Activity");

    if active_days.is_empty() {
        let _ = writeln!(output, "No timelines updated in this window.");
    } else {
        for point in active_days.iter().rev() {
            let _ = writeln!(
                output,
                "- {}: {} updated, average progress {:.0}%",
                point.date, point.matched, point.value
            );
        }
    }

    Ok(output)
}
