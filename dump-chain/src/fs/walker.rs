//! Non-recursive listing of dump artifacts.
//!
//! Only the immediate children of the dump directory are considered, and only
//! regular files whose extension names a known [`ArtifactKind`].

use crate::config::ScanConfig;
use crate::utils::errors::Result;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Kinds of dump artifact the scanner recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// CBOR-encoded dump stream
    Cbor,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 1] = [ArtifactKind::Cbor];

    /// File extension (without the dot) used by this kind
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Cbor => "cbor",
        }
    }

    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL.into_iter().find(|kind| kind.extension() == ext)
    }
}

/// A candidate dump discovered in the scanned directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpArtifact {
    /// Full path to the dump file
    pub path: PathBuf,

    pub kind: ArtifactKind,
}

impl DumpArtifact {
    /// Create a DumpArtifact from a DirEntry.
    /// Returns None for directories and for files of no known kind.
    fn from_entry(entry: &DirEntry) -> Option<Self> {
        if !entry.file_type().is_file() {
            return None;
        }

        let kind = ArtifactKind::from_path(entry.path())?;

        Some(Self {
            path: entry.path().to_path_buf(),
            kind,
        })
    }
}

/// List the dump artifacts directly inside `dir`, sorted by path.
///
/// # Returns
/// * `Ok(Vec<DumpArtifact>)` - Artifacts found (possibly empty)
/// * `Err(DumpError)` - If `dir` is missing, not a directory, or unreadable
pub fn list_dump_artifacts(dir: &Path, config: &ScanConfig) -> Result<Vec<DumpArtifact>> {
    let metadata = std::fs::metadata(dir)?;
    if !metadata.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", dir.display()),
        )
        .into());
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(config.follow_links)
        .sort_by_file_name();

    let mut artifacts = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Failing to read the directory itself is fatal
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                debug!(error = %e, "[SCAN] Skipping unreadable entry");
                continue;
            }
        };

        if let Some(artifact) = DumpArtifact::from_entry(&entry) {
            artifacts.push(artifact);
        }
    }

    Ok(artifacts)
}
