//! Manifest checking against a shallow asset listing.
//!
//! Only the leading segment of each required path is compared with the
//! listing, because sources such as packaged asset bundles only expose their
//! top level. `app/build.gradle` is therefore reported present whenever an
//! `app` entry exists, and two required paths under the same top-level
//! directory always share a classification.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use qc_core::enums::{AuditStatus, RunKind};
use qc_core::responses::{AuditEntry, AuditReport};
use qc_core::stage::{Stage, StagePlan};

use crate::error::ManifestError;

pub const AUDIT_HEADER: &str = "Starting configuration alignment...";
pub const AUDIT_FOOTER: &str = "\nConfiguration alignment check complete.";

/// Snapshot of the top-level names present in an asset source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedListing {
    names: BTreeSet<String>,
}

impl ObservedListing {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ObservedListing {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Where an [`ObservedListing`] comes from.
pub trait ListingSource: Send + Sync {
    /// Read the current top-level listing.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::SourceUnavailable`] when the source cannot be read.
    fn list(&self) -> Result<ObservedListing, ManifestError>;
}

/// Lists the top-level entries of a directory on disk.
#[derive(Debug, Clone)]
pub struct DirListing {
    root: PathBuf,
}

impl DirListing {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unavailable(&self, error: &std::io::Error) -> ManifestError {
        ManifestError::SourceUnavailable {
            source_name: self.root.display().to_string(),
            reason: error.to_string(),
        }
    }
}

impl ListingSource for DirListing {
    fn list(&self) -> Result<ObservedListing, ManifestError> {
        let entries = std::fs::read_dir(&self.root).map_err(|error| self.unavailable(&error))?;

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|error| self.unavailable(&error))?;
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }

        tracing::debug!(root = %self.root.display(), entries = names.len(), "listed asset root");
        Ok(ObservedListing { names })
    }
}

/// A fixed listing, for embedding callers that already know their assets.
#[derive(Debug, Clone, Default)]
pub struct StaticListing(ObservedListing);

impl StaticListing {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self(names.into_iter().collect())
    }
}

impl ListingSource for StaticListing {
    fn list(&self) -> Result<ObservedListing, ManifestError> {
        Ok(self.0.clone())
    }
}

/// Leading path segment of a required entry.
#[must_use]
pub fn top_level(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

/// Classify every required entry against `observed`.
///
/// Entries keep their manifest order and duplicates are reported once per
/// occurrence. Nothing here fails: unmatched entries are `Missing`.
pub fn check<S: AsRef<str>>(required: &[S], observed: &ObservedListing) -> AuditReport {
    let entries = required
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let top = top_level(path);
            let status = if observed.contains(top) {
                AuditStatus::Present
            } else {
                AuditStatus::Missing
            };
            AuditEntry {
                path: path.to_string(),
                top_level: top.to_string(),
                status,
            }
        })
        .collect();

    AuditReport { entries }
}

/// Read `source` and check `required` against it.
///
/// # Errors
///
/// Propagates [`ManifestError::SourceUnavailable`] from the source.
pub fn check_source<S: AsRef<str>>(
    required: &[S],
    source: &dyn ListingSource,
) -> Result<AuditReport, ManifestError> {
    let observed = source.list()?;
    Ok(check(required, &observed))
}

/// Line narrated for one audit entry.
#[must_use]
pub fn audit_line(entry: &AuditEntry) -> String {
    match entry.status {
        AuditStatus::Present => format!("[OK] {} is present.", entry.path),
        AuditStatus::Missing => format!("[MISSING] {} would be generated.", entry.path),
    }
}

/// Stage plan narrating an audit report. Every stage fires at offset zero,
/// so delivery order is declaration order.
#[must_use]
pub fn audit_plan(report: &AuditReport) -> StagePlan {
    let mut stages = Vec::with_capacity(report.entries.len() + 2);
    stages.push(Stage::new("start", 0, AUDIT_HEADER));
    stages.extend(
        report
            .entries
            .iter()
            .map(|entry| Stage::new(format!("check:{}", entry.path), 0, audit_line(entry))),
    );
    stages.push(Stage::new("complete", 0, AUDIT_FOOTER));

    StagePlan {
        kind: RunKind::Audit,
        stages,
    }
}
