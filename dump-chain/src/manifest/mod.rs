//! Manifest types for dump chain discovery.
//!
//! A manifest is the sidecar record written next to every finished dump. It
//! names the logical database the dump belongs to and the versionstamp range
//! it captures, which is all the chain builder needs to link dumps together.

pub mod codec;

use crate::utils::errors::{DumpError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of dump a manifest describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestType {
    /// Snapshot of all data up to `end_versionstamp`
    Full,
    /// Change-feed slice between `start_versionstamp` and `end_versionstamp`
    Incremental,
}

impl fmt::Display for ManifestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestType::Full => f.write_str("full"),
            ManifestType::Incremental => f.write_str("incremental"),
        }
    }
}

/// Dump manifest, serialized as `<dump>.manifest.json` beside the dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// File name of the dump artifact (not of the manifest)
    pub filename: String,

    #[serde(rename = "type")]
    pub dump_type: ManifestType,

    /// When the dump finished
    pub created_at: DateTime<Utc>,

    /// Dump artifact size in bytes
    pub size: u64,

    pub namespace: String,
    pub database: String,

    /// Last versionstamp captured by the dump. For a full dump this is the
    /// point every later incremental must continue from.
    pub end_versionstamp: u64,

    /// First versionstamp of the captured range. Zero for an initial full
    /// dump, the previous link's `end_versionstamp` for an incremental.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub start_versionstamp: u64,

    /// Hex SHA-256 of the dump artifact, when the producer recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl Manifest {
    /// Manifest for a full dump finishing at `end_versionstamp`.
    pub fn full(
        filename: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
        end_versionstamp: u64,
        size: u64,
    ) -> Self {
        Self {
            filename: filename.into(),
            dump_type: ManifestType::Full,
            created_at: Utc::now(),
            size,
            namespace: namespace.into(),
            database: database.into(),
            end_versionstamp,
            start_versionstamp: 0,
            sha256: None,
        }
    }

    /// Manifest for an incremental dump covering `start_versionstamp..end_versionstamp`.
    pub fn incremental(
        filename: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
        start_versionstamp: u64,
        end_versionstamp: u64,
        size: u64,
    ) -> Self {
        Self {
            filename: filename.into(),
            dump_type: ManifestType::Incremental,
            created_at: Utc::now(),
            size,
            namespace: namespace.into(),
            database: database.into(),
            end_versionstamp,
            start_versionstamp,
            sha256: None,
        }
    }

    /// Attach the artifact checksum computed by the dump producer.
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    pub fn is_full(&self) -> bool {
        self.dump_type == ManifestType::Full
    }

    pub fn is_incremental(&self) -> bool {
        self.dump_type == ManifestType::Incremental
    }

    /// Check the manifest fields for consistency.
    pub fn validate(&self) -> Result<()> {
        match self.invalid_reason() {
            Some(reason) => Err(DumpError::InvalidManifest {
                path: PathBuf::from(&self.filename),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Reason the manifest is unusable, if any.
    ///
    /// Looser than producer-side checks: an incremental may start at zero
    /// and a full dump may start above zero. Beyond missing context, only a
    /// range that runs backwards or an empty incremental range is rejected.
    pub(crate) fn invalid_reason(&self) -> Option<String> {
        if self.namespace.is_empty() {
            return Some("missing namespace".to_string());
        }
        if self.database.is_empty() {
            return Some("missing database".to_string());
        }
        if self.start_versionstamp > self.end_versionstamp {
            return Some(format!(
                "start versionstamp {} is after end versionstamp {}",
                self.start_versionstamp, self.end_versionstamp
            ));
        }
        // An incremental must capture at least one change
        if self.is_incremental() && self.end_versionstamp == self.start_versionstamp {
            return Some(format!(
                "incremental dump has an empty versionstamp range at {}",
                self.start_versionstamp
            ));
        }
        None
    }
}

/// Check whether an incremental dump continues exactly at `current_versionstamp`.
pub fn can_apply_incremental(current_versionstamp: u64, manifest: &Manifest) -> Result<()> {
    if !manifest.is_incremental() {
        return Err(DumpError::Continuity(format!(
            "{} is a {} dump, not an incremental dump",
            manifest.filename, manifest.dump_type
        )));
    }

    if manifest.start_versionstamp != current_versionstamp {
        return Err(DumpError::Continuity(format!(
            "{} starts at versionstamp {}, but the chain ends at {}",
            manifest.filename, manifest.start_versionstamp, current_versionstamp
        )));
    }

    Ok(())
}
