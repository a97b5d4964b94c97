//! Per-tick instance aggregation and classification.
//!
//! One tick fetches every configured service concurrently, waits for all
//! of them, then summarizes and classifies each service in request order.

use crate::models::{InstanceListResult, ServiceReport, ServiceStatSummary, TickReport};
use crate::registry::{InstanceSource, RegistryError};
use chrono::{DateTime, Local};
use futures::future::join_all;
use tracing::{debug, warn};

/// Timestamp layout used at the start of every report line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Compute health/enablement/weight statistics in a single scan.
///
/// Addresses are grouped by exact weight and keep scan order within a group.
pub fn summarize(result: &InstanceListResult) -> ServiceStatSummary {
    let mut summary = ServiceStatSummary {
        total_count: result.total_count,
        instance_count: result.instances.len(),
        ..ServiceStatSummary::default()
    };

    for instance in &result.instances {
        if instance.healthy {
            summary.healthy += 1;
        } else {
            summary.unhealthy += 1;
        }

        if instance.enabled {
            summary.enabled += 1;
        } else {
            summary.disabled += 1;
        }

        summary
            .weight_groups
            .insert(instance.weight, instance.address());
    }

    summary
}

/// Whether a service needs attention.
///
/// A missing summary (no usable data from the registry) is always flagged.
pub fn is_flagged(summary: Option<&ServiceStatSummary>) -> bool {
    let Some(summary) = summary else {
        return true;
    };

    summary.weight_groups.keys().any(|w| w.is_non_positive())
        || summary.instance_count == 0
        || summary.unhealthy > 0
        || summary.disabled > 0
}

/// Render the single-line summary of a service.
pub fn render_line(
    timestamp: &DateTime<Local>,
    service_name: &str,
    summary: Option<&ServiceStatSummary>,
) -> String {
    let ts = timestamp.format(TIMESTAMP_FORMAT);

    match summary {
        Some(s) => format!(
            "{} {:<20} has total {:<2} instances, {} healthy, {} unhealthy, {} enabled, {} disabled, weights: {}",
            ts,
            service_name,
            s.total_count,
            s.healthy,
            s.unhealthy,
            s.enabled,
            s.disabled,
            s.weight_groups
        ),
        None => format!("{} {:<20} has total {:<2} instances", ts, service_name, 0),
    }
}

/// Turn one fetch outcome into a report entry. Failures degrade to "0 instances".
pub fn build_service_report(
    timestamp: &DateTime<Local>,
    service_name: &str,
    outcome: &Result<InstanceListResult, RegistryError>,
) -> ServiceReport {
    let summary = match outcome {
        Ok(result) => Some(summarize(result)),
        Err(e) => {
            warn!(service = %service_name, error = %e, "Failed to fetch instances");
            None
        }
    };

    let flagged = is_flagged(summary.as_ref());
    let line = render_line(timestamp, service_name, summary.as_ref());

    ServiceReport {
        service_name: service_name.to_string(),
        summary,
        flagged,
        line,
    }
}

/// Run one polling cycle.
///
/// Every fetch runs concurrently; results are joined before anything is
/// summarized, so the report order always matches `service_names`.
pub async fn run_tick<S: InstanceSource>(source: &S, service_names: &[String]) -> TickReport {
    debug!("Fetching instances for {} services", service_names.len());

    let outcomes = join_all(
        service_names
            .iter()
            .map(|name| source.fetch_instances(name)),
    )
    .await;

    let timestamp = Local::now();
    let token_rejected = outcomes
        .iter()
        .any(|o| matches!(o, Err(e) if e.is_unauthorized()));

    let services = service_names
        .iter()
        .zip(outcomes.iter())
        .map(|(name, outcome)| build_service_report(&timestamp, name, outcome))
        .collect();

    TickReport {
        timestamp,
        services,
        token_rejected,
    }
}
