//! Directory scanning: dump artifacts in, restore chains out.
//!
//! Only a failure to list the directory aborts a scan. Dumps with a missing,
//! malformed or inconsistent manifest are skipped, and chains are built from
//! whatever remains.

use crate::chain::{build_chains, Chain};
use crate::config::ScanConfig;
use crate::fs::walker::list_dump_artifacts;
use crate::manifest::codec::read_manifest;
use crate::manifest::Manifest;
use crate::utils::errors::Result;
use std::path::Path;
use tracing::{debug, info};

/// Scan `dir` for dumps and build every valid restore chain, using the
/// default configuration.
pub fn scan_chains(dir: impl AsRef<Path>) -> Result<Vec<Chain>> {
    scan_chains_with_config(dir, &ScanConfig::default())
}

/// Scan `dir` for dumps and build every valid restore chain.
///
/// # Returns
/// * `Ok(Vec<Chain>)` - One chain per namespace/database with a full dump,
///   sorted by namespace then database (possibly empty)
/// * `Err(DumpError)` - If the directory cannot be listed
pub fn scan_chains_with_config(dir: impl AsRef<Path>, config: &ScanConfig) -> Result<Vec<Chain>> {
    let dir = dir.as_ref();
    let manifests = scan_manifests(dir, config)?;
    let manifest_count = manifests.len();

    let chains = build_chains(manifests, config.anchor_policy);

    info!(
        dir = %dir.display(),
        manifests = manifest_count,
        chains = chains.len(),
        "[SCAN] Scan complete"
    );

    Ok(chains)
}

/// Load the manifest of every dump artifact in `dir`, skipping dumps whose
/// manifest cannot be used.
pub fn scan_manifests(dir: &Path, config: &ScanConfig) -> Result<Vec<Manifest>> {
    let artifacts = list_dump_artifacts(dir, config)?;
    let mut manifests = Vec::with_capacity(artifacts.len());

    for artifact in &artifacts {
        match read_manifest(&artifact.path) {
            Ok(manifest) => manifests.push(manifest),
            Err(e) => {
                debug!(
                    dump = %artifact.path.display(),
                    kind = ?artifact.kind,
                    error = %e,
                    "[SCAN] Skipping dump without usable manifest"
                );
            }
        }
    }

    debug!(
        dir = %dir.display(),
        artifacts = artifacts.len(),
        manifests = manifests.len(),
        "[SCAN] Loaded manifests"
    );

    Ok(manifests)
}

/// Latest restorable versionstamp for one namespace/database in `dir`, or
/// `None` if the directory holds no chain for it.
pub fn find_latest_versionstamp(
    dir: impl AsRef<Path>,
    namespace: &str,
    database: &str,
) -> Result<Option<u64>> {
    let chains = scan_chains(dir)?;

    Ok(chains
        .iter()
        .find(|chain| chain.namespace() == namespace && chain.database() == database)
        .map(Chain::latest_versionstamp))
}
