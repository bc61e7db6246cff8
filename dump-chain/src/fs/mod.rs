//! File system helpers for locating dump artifacts.

pub mod walker;

pub use walker::{list_dump_artifacts, ArtifactKind, DumpArtifact};
