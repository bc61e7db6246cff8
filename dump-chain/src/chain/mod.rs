//! Restore chains.
//!
//! A chain is one full dump followed by the incremental dumps that continue
//! it without a gap. Replaying the dumps in order reconstructs the database
//! as of [`Chain::latest_versionstamp`].

pub mod builder;

use crate::manifest::Manifest;
use crate::utils::errors::{DumpError, Result};

pub use builder::build_chains;

/// Gap-free sequence of dumps for one namespace/database pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    full_dump: Manifest,
    incremental_dumps: Vec<Manifest>,
    latest_versionstamp: u64,
}

impl Chain {
    /// Anchor of the chain
    pub fn full_dump(&self) -> &Manifest {
        &self.full_dump
    }

    /// Incremental dumps in replay order
    pub fn incremental_dumps(&self) -> &[Manifest] {
        &self.incremental_dumps
    }

    /// End versionstamp of the last linked dump; the latest restorable point
    pub fn latest_versionstamp(&self) -> u64 {
        self.latest_versionstamp
    }

    pub fn namespace(&self) -> &str {
        &self.full_dump.namespace
    }

    pub fn database(&self) -> &str {
        &self.full_dump.database
    }

    /// Every dump in replay order, starting with the full dump
    pub fn dumps(&self) -> impl Iterator<Item = &Manifest> {
        std::iter::once(&self.full_dump).chain(self.incremental_dumps.iter())
    }

    /// Number of dumps in the chain, including the full dump
    pub fn dump_count(&self) -> usize {
        1 + self.incremental_dumps.len()
    }

    /// Total bytes of all dumps in the chain
    pub fn total_size(&self) -> u64 {
        self.dumps().map(|m| m.size).sum()
    }

    /// Check that every incremental continues exactly where the previous
    /// link ends.
    pub fn validate(&self) -> Result<()> {
        if !self.full_dump.is_full() {
            return Err(DumpError::Continuity(format!(
                "chain anchor {} is not a full dump",
                self.full_dump.filename
            )));
        }

        let mut expected = self.full_dump.end_versionstamp;

        for (i, inc) in self.incremental_dumps.iter().enumerate() {
            if inc.start_versionstamp != expected {
                return Err(DumpError::Continuity(format!(
                    "incremental dump {} ({}) starts at {}, expected {}",
                    i, inc.filename, inc.start_versionstamp, expected
                )));
            }
            if inc.start_versionstamp >= inc.end_versionstamp {
                return Err(DumpError::Continuity(format!(
                    "incremental dump {} ({}) has an empty range {}..{}",
                    i, inc.filename, inc.start_versionstamp, inc.end_versionstamp
                )));
            }
            expected = inc.end_versionstamp;
        }

        if expected != self.latest_versionstamp {
            return Err(DumpError::Continuity(format!(
                "latest versionstamp {} does not match the last dump end {}",
                self.latest_versionstamp, expected
            )));
        }

        Ok(())
    }

    /// End versionstamps the chain can restore to, oldest first
    pub fn restoration_points(&self) -> Vec<u64> {
        self.dumps().map(|m| m.end_versionstamp).collect()
    }

    /// Dumps to replay to restore up to `target`: the full dump plus every
    /// leading incremental that ends at or before `target`.
    pub fn manifests_for_versionstamp(&self, target: u64) -> Result<Vec<&Manifest>> {
        if target < self.full_dump.end_versionstamp {
            return Err(DumpError::VersionstampOutOfRange {
                target,
                full: self.full_dump.end_versionstamp,
            });
        }

        let mut dumps = vec![&self.full_dump];
        dumps.extend(
            self.incremental_dumps
                .iter()
                .take_while(|inc| inc.end_versionstamp <= target),
        );

        Ok(dumps)
    }
}
