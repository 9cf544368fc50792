//! Module containing the definition of error types.

use std::path::PathBuf;
use thiserror::Error;

/// Enumeration of the different error kinds.
#[derive(Debug, Error)]
pub enum Kind {
    /// Configuration error.
    #[error("there was an error in the configuration: {message}")]
    Config {
        /// Error message.
        message: String,
    },
    /// The supported SDK range is not consistent.
    #[error("invalid SDK range: {message}")]
    SdkRange {
        /// Error message.
        message: String,
    },
    /// Parsing error.
    #[error("there was an error in the parsing process: {message}")]
    Parse {
        /// Error message.
        message: String,
    },
    /// No manifest could be found in the package.
    #[error("no AndroidManifest.xml was found in {}", path.display())]
    ManifestNotFound {
        /// Path of the analyzed package.
        path: PathBuf,
    },
}
