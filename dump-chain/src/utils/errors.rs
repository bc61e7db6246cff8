//! Custom error types for manifest handling and chain scanning.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory scan error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Manifest not found for {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Failed to parse manifest {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid manifest {}: {reason}", .path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Continuity error: {0}")]
    Continuity(String),

    #[error("Target versionstamp {target} is before the full dump at {full}")]
    VersionstampOutOfRange { target: u64, full: u64 },
}

impl DumpError {
    /// True for failures that mean "this dump is not usable" rather than
    /// "the operation failed".
    pub fn is_unusable_manifest(&self) -> bool {
        matches!(
            self,
            DumpError::ManifestNotFound(_)
                | DumpError::ManifestParse { .. }
                | DumpError::InvalidManifest { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DumpError>;
