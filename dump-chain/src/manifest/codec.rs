//! Sidecar manifest reading and writing.
//!
//! Each dump `<name>.cbor` carries exactly one manifest at
//! `<name>.cbor.manifest.json`. A dump without a readable manifest is treated
//! as partial and never used.

use super::Manifest;
use crate::utils::errors::{DumpError, Result};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to a dump path to form its manifest path.
pub const MANIFEST_SUFFIX: &str = ".manifest.json";

const TEMP_SUFFIX: &str = ".tmp";

/// Derive the sidecar manifest path for a dump artifact.
pub fn sidecar_path(dump_path: impl AsRef<Path>) -> PathBuf {
    append_suffix(dump_path.as_ref(), MANIFEST_SUFFIX)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Write the manifest for a dump that is already fully written and flushed.
///
/// The manifest is staged in a temporary sibling and renamed into place, so a
/// concurrent reader sees either the complete manifest or nothing.
pub fn write_manifest(dump_path: impl AsRef<Path>, manifest: &Manifest) -> Result<()> {
    let manifest_path = sidecar_path(&dump_path);
    let temp_path = append_suffix(&manifest_path, TEMP_SUFFIX);

    let data = serde_json::to_vec_pretty(manifest)?;

    if let Err(e) = write_durable(&temp_path, &data) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&temp_path, &manifest_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    debug!(
        manifest = %manifest_path.display(),
        dump_type = %manifest.dump_type,
        end_versionstamp = manifest.end_versionstamp,
        "[MANIFEST] Wrote manifest"
    );

    Ok(())
}

fn write_durable(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

/// Read and validate the manifest of a dump.
///
/// # Errors
/// * `ManifestNotFound` - no sidecar exists for `dump_path`
/// * `ManifestParse` - the sidecar is not a manifest
/// * `InvalidManifest` - the sidecar parses but its fields are inconsistent
/// * `Io` - the sidecar exists but could not be read
pub fn read_manifest(dump_path: impl AsRef<Path>) -> Result<Manifest> {
    let dump_path = dump_path.as_ref();
    let manifest_path = sidecar_path(dump_path);

    let data = match fs::read(&manifest_path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DumpError::ManifestNotFound(dump_path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let manifest: Manifest =
        serde_json::from_slice(&data).map_err(|source| DumpError::ManifestParse {
            path: manifest_path.clone(),
            source,
        })?;

    if let Some(reason) = manifest.invalid_reason() {
        return Err(DumpError::InvalidManifest {
            path: manifest_path,
            reason,
        });
    }

    Ok(manifest)
}
