//! Retention plan and run summary formatting

use chrono::{DateTime, Utc};

use crate::backup::{PruneReport, RunReport};
use crate::retention::{RetentionDecision, RetentionPlan};

use super::{format_duration, format_size};

/// Format every listed archive with its age and retention decision
pub fn format_retention_plan(plan: &RetentionPlan, now: DateTime<Utc>) -> String {
    if plan.entries.is_empty() {
        return "No remote archives found.".to_string();
    }

    let name_width = plan
        .entries
        .iter()
        .map(|p| p.entry.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>6}  {}\n",
        "Name",
        "Age",
        "Action",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->6}  {:-<6}\n",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for planned in &plan.entries {
        let age = planned
            .created_at
            .map(|created| format_duration(now.signed_duration_since(created)))
            .unwrap_or_else(|| "?".to_string());

        let action = match &planned.decision {
            RetentionDecision::SkipMalformed { reason } => format!("skip ({})", reason),
            decision => decision.label().to_string(),
        };

        output.push_str(&format!(
            "{:<name_width$}  {:>6}  {}\n",
            planned.entry.name,
            age,
            action,
            name_width = name_width,
        ));
    }

    output.push_str(&format!(
        "\nCutoff: {}  ({} to delete, {} kept, {} skipped)\n",
        plan.cutoff.format("%Y-%m-%d %H:%M:%S UTC"),
        plan.to_delete().len(),
        plan.kept_count(),
        plan.skipped().len(),
    ));

    output
}

/// Summary of an applied prune
pub fn format_prune_summary(report: &PruneReport) -> String {
    let mut output = format!("Deleted {} archive(s).\n", report.deleted.len());

    for failed in &report.failed_deletes {
        output.push_str(&format!(
            "  Failed to delete {}: {}\n",
            failed.remote_id, failed.message
        ));
    }

    output
}

/// Summary of a backup run
pub fn format_run_summary(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Uploaded: {} ({}, {} file(s))\n",
        report.archive_name,
        format_size(report.archive_bytes),
        report.entry_count
    ));
    output.push_str(&format!("Remote id: {}\n", report.remote_id));

    if let Some(error) = &report.retention_error {
        output.push_str(&format!(
            "Retention skipped: {}\nOld archives were not pruned; the next run will retry.\n",
            error
        ));
    } else {
        output.push_str(&format!(
            "Deleted {} expired archive(s).\n",
            report.deleted().len()
        ));
    }

    for failed in report.failed_deletes() {
        output.push_str(&format!(
            "  Failed to delete {}: {}\n",
            failed.remote_id, failed.message
        ));
    }

    let skipped = report.skipped_malformed();
    if !skipped.is_empty() {
        output.push_str(&format!(
            "Skipped {} item(s) with unrecognized names.\n",
            skipped.len()
        ));
    }

    match &report.local_archive {
        Some(path) => output.push_str(&format!("Local archive kept: {}\n", path.display())),
        None => output.push_str("Local archive removed.\n"),
    }

    output
}
