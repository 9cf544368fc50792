use anyhow::{Context, Result};
use md5::Md5;
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::{fs, path::Path};

/// MD5, SHA-1 and SHA-256 digests of the analyzed file, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerPrint {
    md5: String,
    sha1: String,
    sha256: String,
}

impl FingerPrint {
    /// Creates a new fingerprint.
    pub fn new<P: AsRef<Path>>(package: P) -> Result<Self> {
        let path = package.as_ref();
        let buffer =
            fs::read(path).with_context(|| format!("could not read {}", path.display()))?;

        Ok(Self {
            md5: hex::encode(Md5::digest(&buffer)),
            sha1: hex::encode(Sha1::digest(&buffer)),
            sha256: hex::encode(Sha256::digest(&buffer)),
        })
    }
}
