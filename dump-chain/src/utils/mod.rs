//! Utility modules for the dump chain library.

pub mod errors;

pub use errors::{DumpError, Result};
