//! Text and JSON output for one tick.
//!
//! Text output lists services without problems first, then a separate
//! block headed by the number of flagged services.

use crate::models::{ServiceReport, TickReport};
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Render a tick as plain text lines.
pub fn render_text(report: &TickReport) -> String {
    let (normal, flagged) = report.partition();
    let mut output = String::new();

    for line in &normal {
        output.push_str(line);
        output.push('\n');
    }

    output.push_str(&generate_flagged_section(&flagged));

    output
}

/// Generate the block listing flagged services, empty when none are flagged.
fn generate_flagged_section(flagged: &[String]) -> String {
    if flagged.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push('\n');
    section.push_str(&format!(
        "{} service(s) with instance problems:\n",
        flagged.len()
    ));
    for line in flagged {
        section.push_str(line);
        section.push('\n');
    }

    section
}

#[derive(Serialize)]
struct TickJson<'a> {
    timestamp: &'a DateTime<Local>,
    flagged_count: usize,
    services: &'a [ServiceReport],
}

/// Render a tick as a single JSON line.
pub fn render_json(report: &TickReport) -> Result<String> {
    let view = TickJson {
        timestamp: &report.timestamp,
        flagged_count: report.flagged_count(),
        services: &report.services,
    };

    serde_json::to_string(&view).map_err(Into::into)
}
