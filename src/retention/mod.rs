//! Retention engine
//!
//! Decides which remote archives are old enough to delete. Everything here
//! is pure: the caller supplies the listing and the current instant, and
//! gets back decisions. An entry is deleted only when its name parses as an
//! archive of exactly this backup and its timestamp is strictly earlier than
//! `now - retention_days`. Anything that fails to parse is skipped, never
//! deleted.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::archive::{ArchiveName, NameError, NamePattern};
use crate::error::{BackupError, BackupResult};
use crate::remote::{RemoteArchiveEntry, RemoteId};

/// How long archives are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub retention_days: u32,
}

impl RetentionPolicy {
    pub fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }

    /// Archives strictly older than this instant are deleted
    ///
    /// Fails when the window reaches past the earliest representable date.
    pub fn cutoff(&self, now: DateTime<Utc>) -> BackupResult<DateTime<Utc>> {
        Duration::try_days(i64::from(self.retention_days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                BackupError::Config(format!(
                    "retention_days {} reaches past the earliest supported date",
                    self.retention_days
                ))
            })
    }
}

/// What to do with one remote entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionDecision {
    Keep,
    Delete,
    SkipMalformed { reason: String },
}

impl RetentionDecision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Delete => "delete",
            Self::SkipMalformed { .. } => "skip",
        }
    }
}

/// Classify a single entry against `cutoff`
pub fn classify(
    entry: &RemoteArchiveEntry,
    pattern: &NamePattern,
    cutoff: DateTime<Utc>,
) -> RetentionDecision {
    decide(&pattern.parse(&entry.name), cutoff)
}

fn decide(parsed: &Result<ArchiveName, NameError>, cutoff: DateTime<Utc>) -> RetentionDecision {
    match parsed {
        Ok(name) if name.created_at() < cutoff => RetentionDecision::Delete,
        Ok(_) => RetentionDecision::Keep,
        Err(e) => RetentionDecision::SkipMalformed {
            reason: e.to_string(),
        },
    }
}

/// One entry of a [`RetentionPlan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub entry: RemoteArchiveEntry,
    /// Parsed creation time, when the name parsed
    pub created_at: Option<DateTime<Utc>>,
    pub decision: RetentionDecision,
}

/// Every listed entry with its decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPlan {
    pub cutoff: DateTime<Utc>,
    pub entries: Vec<PlannedEntry>,
}

impl RetentionPlan {
    /// Ids selected for deletion, in listing order
    pub fn to_delete(&self) -> Vec<RemoteId> {
        self.entries
            .iter()
            .filter(|p| p.decision == RetentionDecision::Delete)
            .map(|p| p.entry.remote_id.clone())
            .collect()
    }

    /// Names that were skipped as malformed
    pub fn skipped(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|p| matches!(p.decision, RetentionDecision::SkipMalformed { .. }))
            .map(|p| p.entry.name.clone())
            .collect()
    }

    pub fn kept_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|p| p.decision == RetentionDecision::Keep)
            .count()
    }
}

/// Build the full plan for a listing, warning once per malformed entry
pub fn plan(
    entries: &[RemoteArchiveEntry],
    backup_name: &str,
    policy: RetentionPolicy,
    now: DateTime<Utc>,
) -> BackupResult<RetentionPlan> {
    let pattern = NamePattern::new(backup_name)?;
    let cutoff = policy.cutoff(now)?;

    let entries = entries
        .iter()
        .map(|entry| {
            let parsed = pattern.parse(&entry.name);
            if let Err(e) = &parsed {
                report_malformed(entry, e);
            }
            let created_at = parsed.as_ref().ok().map(ArchiveName::created_at);
            let decision = decide(&parsed, cutoff);
            PlannedEntry {
                entry: entry.clone(),
                created_at,
                decision,
            }
        })
        .collect();

    Ok(RetentionPlan { cutoff, entries })
}

/// Remote ids of the entries to delete
///
/// Malformed names are skipped with a warning.
pub fn select_for_deletion(
    entries: &[RemoteArchiveEntry],
    backup_name: &str,
    retention_days: u32,
    now: DateTime<Utc>,
) -> BackupResult<Vec<RemoteId>> {
    let plan = plan(
        entries,
        backup_name,
        RetentionPolicy::new(retention_days),
        now,
    )?;
    Ok(plan.to_delete())
}

fn report_malformed(entry: &RemoteArchiveEntry, cause: &NameError) {
    let err = BackupError::MalformedRemoteName {
        name: entry.name.clone(),
        reason: cause.to_string(),
    };
    warn!(remote_id = %entry.remote_id, "{}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn entries(names: &[&str]) -> Vec<RemoteArchiveEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| RemoteArchiveEntry::new(format!("id{}", i), *name))
            .collect()
    }

    #[test]
    fn test_selects_only_expired_archives_of_this_backup() {
        let listing = entries(&[
            "nightly_20240101_020000.zip",
            "other_20240101_020000.zip",
            "nightly_bad.zip",
        ]);

        let selected =
            select_for_deletion(&listing, "nightly", 7, at(2024, 2, 1, 0, 0, 0)).unwrap();
        assert_eq!(selected, vec![RemoteId::new("id0")]);
    }

    #[test]
    fn test_cutoff_equality_keeps() {
        let listing = entries(&["nightly_20240201_000000.tar.gz"]);
        let now = at(2024, 2, 1, 0, 0, 0);

        assert!(select_for_deletion(&listing, "nightly", 0, now)
            .unwrap()
            .is_empty());
        assert_eq!(
            select_for_deletion(&listing, "nightly", 0, now + Duration::seconds(1)).unwrap(),
            vec![RemoteId::new("id0")]
        );
    }

    #[test]
    fn test_boundary_with_retention_days() {
        let now = at(2024, 2, 8, 12, 0, 0);
        let listing = entries(&[
            "nightly_20240201_120000.tar.gz",
            "nightly_20240201_115959.tar.gz",
            "nightly_20240201_120001.tar.gz",
        ]);

        let selected = select_for_deletion(&listing, "nightly", 7, now).unwrap();
        assert_eq!(selected, vec![RemoteId::new("id1")]);
    }

    #[test]
    fn test_oversized_retention_is_an_error() {
        let listing = entries(&["nightly_20240101_020000.tar.gz"]);

        let err = select_for_deletion(&listing, "nightly", 100_000_000, at(2024, 2, 1, 0, 0, 0))
            .unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));

        let policy = RetentionPolicy::new(u32::MAX);
        assert!(policy.cutoff(at(2024, 2, 1, 0, 0, 0)).is_err());
        assert!(RetentionPolicy::new(36_500)
            .cutoff(at(2024, 2, 1, 0, 0, 0))
            .is_ok());
    }

    #[test]
    fn test_malformed_entries_never_selected() {
        let listing = entries(&[
            "nightly_20241301_000000.zip",
            "nightly_19990101_000000",
            "nightly_1999_000000.zip",
            "nightly.zip",
        ]);
        let far_future = at(2100, 1, 1, 0, 0, 0);

        for days in [0, 1, 7, 365] {
            assert!(select_for_deletion(&listing, "nightly", days, far_future)
                .unwrap()
                .is_empty());
        }
    }

    #[test]
    fn test_longer_backup_name_not_selected() {
        let listing = entries(&[
            "db_20200101_20240101_020000.tar.gz",
            "db_20240101_020000.tar.gz",
        ]);

        let selected = select_for_deletion(&listing, "db", 1, at(2024, 6, 1, 0, 0, 0)).unwrap();
        assert_eq!(selected, vec![RemoteId::new("id1")]);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let now = at(2024, 2, 1, 0, 0, 0);
        let mut listing = entries(&[
            "nightly_20240101_020000.tar.gz",
            "nightly_20240130_020000.tar.gz",
        ]);

        let first = select_for_deletion(&listing, "nightly", 7, now).unwrap();
        listing.retain(|e| !first.contains(&e.remote_id));
        let second = select_for_deletion(&listing, "nightly", 7, now).unwrap();

        assert_eq!(first, vec![RemoteId::new("id0")]);
        assert!(second.is_empty());
    }

    #[test]
    fn test_plan_lists_every_entry() {
        let listing = entries(&[
            "nightly_20240101_020000.zip",
            "nightly_20240131_020000.zip",
            "nightly_bad.zip",
        ]);

        let plan = plan(
            &listing,
            "nightly",
            RetentionPolicy::new(7),
            at(2024, 2, 1, 0, 0, 0),
        )
        .unwrap();

        assert_eq!(plan.cutoff, at(2024, 1, 25, 0, 0, 0));
        assert_eq!(plan.entries.len(), 3);
        assert_eq!(plan.entries[0].decision, RetentionDecision::Delete);
        assert_eq!(plan.entries[1].decision, RetentionDecision::Keep);
        assert_eq!(plan.entries[1].created_at, Some(at(2024, 1, 31, 2, 0, 0)));
        assert!(matches!(
            plan.entries[2].decision,
            RetentionDecision::SkipMalformed { .. }
        ));
        assert_eq!(plan.entries[2].created_at, None);

        assert_eq!(plan.to_delete(), vec![RemoteId::new("id0")]);
        assert_eq!(plan.skipped(), vec!["nightly_bad.zip".to_string()]);
        assert_eq!(plan.kept_count(), 1);
    }

    #[test]
    fn test_classify_single_entry() {
        let pattern = NamePattern::new("nightly").unwrap();
        let cutoff = at(2024, 1, 25, 0, 0, 0);

        let old = RemoteArchiveEntry::new("a", "nightly_20240101_020000.tar.gz");
        let new = RemoteArchiveEntry::new("b", "nightly_20240125_000000.tar.gz");
        let bad = RemoteArchiveEntry::new("c", "nightly_20240132_000000.tar.gz");

        assert_eq!(classify(&old, &pattern, cutoff), RetentionDecision::Delete);
        assert_eq!(classify(&new, &pattern, cutoff), RetentionDecision::Keep);
        assert_eq!(classify(&bad, &pattern, cutoff).label(), "skip");
    }

    #[test]
    fn test_plan_agrees_with_classify() {
        let now = at(2024, 3, 15, 8, 30, 0);
        let listing = entries(&[
            "nightly_20240301_000000.tar.gz",
            "nightly_20240310_000000.tar.gz",
            "nightly_20240315_083000.tar.gz",
            "nightly_2024031_083000.tar.gz",
        ]);

        for days in [0, 5, 14, 30] {
            let policy = RetentionPolicy::new(days);
            let pattern = NamePattern::new("nightly").unwrap();
            let planned = plan(&listing, "nightly", policy, now).unwrap();
            for p in &planned.entries {
                assert_eq!(
                    p.decision,
                    classify(&p.entry, &pattern, policy.cutoff(now).unwrap()),
                    "retention_days = {days}"
                );
            }
        }
    }
}
