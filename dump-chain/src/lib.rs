//! Dump Chain Library
//!
//! Discovers full and incremental database dumps through their sidecar
//! manifests and rebuilds the gap-free restore chain of each logical
//! database.

pub mod chain;
pub mod config;
pub mod fs;
pub mod manifest;
pub mod scan;
pub mod utils;

// Re-export commonly used types
pub use chain::Chain;
pub use config::{AnchorPolicy, ScanConfig};
pub use manifest::codec::{read_manifest, sidecar_path, write_manifest};
pub use manifest::{Manifest, ManifestType};
pub use scan::{find_latest_versionstamp, scan_chains, scan_chains_with_config};
pub use utils::errors::DumpError;
pub type Result<T> = std::result::Result<T, DumpError>;
