//! Configuration for chain scanning.
//!
//! Loads from a TOML file; every field has a default so an empty file is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the anchor is chosen when one logical database has several full dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Most recent `created_at` wins, then the higher end versionstamp
    #[default]
    LatestCreated,
    /// Highest end versionstamp wins, then the most recent `created_at`
    HighestVersionstamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Anchor selection for groups with more than one full dump
    #[serde(default)]
    pub anchor_policy: AnchorPolicy,

    /// Follow symbolic links to dump artifacts
    #[serde(default = "default_follow_links")]
    pub follow_links: bool,
}

fn default_follow_links() -> bool {
    false
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            anchor_policy: AnchorPolicy::default(),
            follow_links: default_follow_links(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ScanConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("scan.toml");
        std::fs::write(&path, "")?;

        assert_eq!(ScanConfig::from_file(&path)?, ScanConfig::default());
        Ok(())
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("scan.toml");
        std::fs::write(
            &path,
            "anchor_policy = \"highest_versionstamp\"\nfollow_links = true\n",
        )?;

        let config = ScanConfig::from_file(&path)?;
        assert_eq!(config.anchor_policy, AnchorPolicy::HighestVersionstamp);
        assert!(config.follow_links);
        Ok(())
    }

    #[test]
    fn test_unknown_policy_is_rejected() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("scan.toml");
        std::fs::write(&path, "anchor_policy = \"first_found\"\n")?;

        assert!(ScanConfig::from_file(&path).is_err());
        Ok(())
    }
}
