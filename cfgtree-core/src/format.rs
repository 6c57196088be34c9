//! Decode report formatters.

use crate::report::{DecodeReport, FieldOutcome};

/// Format outcomes as plain text, one marker line per field.
pub fn format_text(report: &DecodeReport) -> String {
    let mut lines = Vec::with_capacity(report.outcomes.len());
    for outcome in &report.outcomes {
        match outcome {
            FieldOutcome::Decoded { path } => lines.push(format!("= {path}")),
            FieldOutcome::Patched { path, reason } => lines.push(format!("~ {path}: {reason}")),
            FieldOutcome::Cleared { path } => lines.push(format!("- {path}")),
            FieldOutcome::Skipped { path } => lines.push(format!(". {path}")),
            FieldOutcome::Malformed { path, reason } => lines.push(format!("! {path}: {reason}")),
        }
    }
    lines.join("\n")
}

/// Format outcome counts on one line.
pub fn format_summary(report: &DecodeReport) -> String {
    let mut decoded = 0;
    let mut patched = 0;
    let mut cleared = 0;
    let mut skipped = 0;
    let mut malformed = 0;

    for outcome in &report.outcomes {
        match outcome {
            FieldOutcome::Decoded { .. } => decoded += 1,
            FieldOutcome::Patched { .. } => patched += 1,
            FieldOutcome::Cleared { .. } => cleared += 1,
            FieldOutcome::Skipped { .. } => skipped += 1,
            FieldOutcome::Malformed { .. } => malformed += 1,
        }
    }

    format!(
        "resource={} decoded={decoded} patched={patched} cleared={cleared} skipped={skipped} malformed={malformed}",
        report.resource_type
    )
}

/// Format the report as JSON.
pub fn format_json(report: &DecodeReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::{format_json, format_summary, format_text};
    use crate::path::FieldPath;
    use crate::report::{DecodeReport, FieldOutcome};

    fn report() -> DecodeReport {
        let mut report = DecodeReport::new("firewall_sniffer");
        report.outcomes.push(FieldOutcome::Decoded {
            path: FieldPath::root("status"),
        });
        report.outcomes.push(FieldOutcome::Skipped {
            path: FieldPath::root("anomaly"),
        });
        report.outcomes.push(FieldOutcome::Malformed {
            path: FieldPath::root("ip_range").index(1),
            reason: "element 1 is string, expected an object".to_string(),
        });
        report
    }

    #[test]
    fn text_uses_one_marker_per_outcome() {
        let text = format_text(&report());
        assert_eq!(
            text,
            "= status\n. anomaly\n! ip_range.1: element 1 is string, expected an object"
        );
    }

    #[test]
    fn summary_and_json_include_counts_and_tags() {
        let report = report();
        assert_eq!(
            format_summary(&report),
            "resource=firewall_sniffer decoded=1 patched=0 cleared=0 skipped=1 malformed=1"
        );
        let json = format_json(&report);
        assert!(json.contains("\"type\": \"Skipped\""));
        assert!(json.contains("\"path\": \"ip_range.1\""));
    }
}
