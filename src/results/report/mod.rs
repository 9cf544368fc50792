//! Report generation module.

mod json;

use crate::results::Results;
use anyhow::Result;
use std::path::Path;

pub use self::json::Json;

/// Trait that represents a type that can generate a report.
pub trait Generator {
    /// Generates an actual report in the given folder.
    fn generate(&mut self, folder: &Path, results: &Results) -> Result<()>;
}
