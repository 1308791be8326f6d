//! Run history formatting

use crate::audit::RunRecord;

/// Format run records as a table, oldest first
pub fn format_history(records: &[RunRecord]) -> String {
    if records.is_empty() {
        return "No runs recorded yet.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<19}  {:<6}  {:<7}  {:>7}  {}\n",
        "Started (UTC)", "Kind", "Outcome", "Deleted", "Detail"
    ));
    output.push_str(&format!(
        "{:-<19}  {:-<6}  {:-<7}  {:->7}  {:-<6}\n",
        "", "", "", "", ""
    ));

    for record in records {
        let kind = match record.kind {
            crate::audit::RunKind::Backup => "backup",
            crate::audit::RunKind::Prune => "prune",
        };
        let detail = record
            .error
            .as_deref()
            .or(record.archive.as_deref())
            .unwrap_or("");

        output.push_str(&format!(
            "{:<19}  {:<6}  {:<7}  {:>7}  {}\n",
            record.started_at.format("%Y-%m-%d %H:%M:%S"),
            kind,
            record.outcome,
            record.deleted_count,
            detail,
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RunKind;
    use crate::error::BackupError;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_history() {
        let started = Utc.with_ymd_and_hms(2024, 2, 1, 3, 0, 0).unwrap();
        let records = vec![RunRecord::failed(
            RunKind::Backup,
            "nightly",
            started,
            &BackupError::AuthFailure("invalid_grant".into()),
        )];

        let output = format_history(&records);
        let row = output.lines().nth(2).unwrap();
        assert!(row.starts_with("2024-02-01 03:00:00  backup  FAILED"));
        assert!(row.ends_with("Authorization failed: invalid_grant"));
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(format_history(&[]), "No runs recorded yet.");
    }
}
