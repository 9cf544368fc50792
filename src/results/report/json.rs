//! JSON report generation module.

use crate::results::{report::Generator, Results};
use anyhow::{Context, Result};
use log::debug;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// JSON report generator.
#[derive(Debug, Default)]
pub struct Json;

impl Json {
    /// Creates a new JSON report generator.
    pub fn new() -> Self {
        Self
    }
}

impl Generator for Json {
    fn generate(&mut self, folder: &Path, results: &Results) -> Result<()> {
        let path = folder.join("results.json");
        debug!("writing the JSON report to {}", path.display());

        let mut f = BufWriter::new(
            File::create(&path)
                .with_context(|| format!("could not create {}", path.display()))?,
        );
        serde_json::to_writer_pretty(&mut f, results)?;
        f.flush()?;

        Ok(())
    }
}
