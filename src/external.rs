//! External tools and network checks.
//!
//! Every operation here is optional: failures are logged and reported as missing information,
//! they never abort the analysis.

use crate::static_analysis::rules::links::{AssetLinkStatus, AssetLinkVerifier};
use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{blocking::Client, StatusCode};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

/// Runs a command, returning its standard output when it succeeds.
fn run<I, S>(program: &Path, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("could not execute {}", program.display()))?;

    if !output.status.success() {
        anyhow::bail!(
            "{} returned an error: {}",
            program.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Verifies the signature of an APK with `apksigner`, returning the signer certificates.
pub fn verify_signature(apksigner: &Path, package: &Path, min_sdk: u32) -> Option<String> {
    let min_sdk = min_sdk.to_string();
    let args = [
        OsStr::new("verify"),
        OsStr::new("--print-certs"),
        OsStr::new("--verbose"),
        OsStr::new("--min-sdk-version"),
        OsStr::new(&min_sdk),
        package.as_os_str(),
    ];

    match run(apksigner, args) {
        Ok(output) => {
            debug!("signature of {} verified", package.display());
            Some(output)
        }
        Err(e) => {
            warn!("could not verify the signature: {:#}", e);
            None
        }
    }
}

/// Pulls the backup of an installed application with `adb backup`.
///
/// The device asks the user to confirm the backup.
pub fn adb_backup(adb: &Path, app_id: &str, destination: &Path) -> Option<PathBuf> {
    let args = [
        OsStr::new("backup"),
        OsStr::new("-f"),
        destination.as_os_str(),
        OsStr::new(app_id),
    ];

    match run(adb, args) {
        Ok(_) if destination.exists() => Some(destination.to_path_buf()),
        Ok(_) => {
            warn!("adb did not write the backup of {}", app_id);
            None
        }
        Err(e) => {
            warn!("could not pull the backup of {}: {:#}", app_id, e);
            None
        }
    }
}

/// Looks for the Digital Asset Links file of app link hosts over HTTPS.
#[derive(Debug)]
pub struct ReqwestVerifier {
    client: Client,
}

impl ReqwestVerifier {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("could not create the HTTP client")?;
        Ok(Self { client })
    }
}

/// URL of the Digital Asset Links file of a host.
fn asset_links_url(host: &str) -> String {
    format!("https://{}/.well-known/assetlinks.json", host)
}

impl AssetLinkVerifier for ReqwestVerifier {
    fn verify(&self, host: &str) -> AssetLinkStatus {
        let url = asset_links_url(host);
        match self.client.get(&url).send() {
            Ok(response) if response.status().is_success() => AssetLinkStatus::Published,
            Ok(response) => {
                if response.status() != StatusCode::NOT_FOUND {
                    debug!("{} answered {}", url, response.status());
                }
                AssetLinkStatus::Missing
            }
            Err(e) => {
                warn!("could not reach {}: {}", url, e);
                AssetLinkStatus::Unverifiable
            }
        }
    }
}
