//! Configuration module.
//!
//! Handles and configures the initial settings and variables needed to run the program. The
//! configuration is read from a TOML file and then decorated with the command line arguments,
//! which take precedence.

use crate::{
    criticality::Criticality, error::Kind, policy::SdkRange, sdk_number::LATEST_API_LEVEL,
    static_analysis::manifest::Manifest,
};
use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Paths of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct External {
    apksigner: PathBuf,
    adb: PathBuf,
    adb_backup_path: PathBuf,
}

impl Default for External {
    fn default() -> Self {
        Self {
            apksigner: PathBuf::from("apksigner"),
            adb: PathBuf::from("adb"),
            adb_backup_path: PathBuf::from("/tmp/backup.tar"),
        }
    }
}

/// Config structure.
///
/// Contains configuration related fields. It is used for storing the configuration parameters
/// and checking their values. Implements the `Default` trait.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Minimal SDK version. Falls back to the manifest.
    min_sdk_version: Option<u32>,
    /// Target SDK version. Falls back to the manifest.
    target_sdk_version: Option<u32>,
    /// Maximal SDK version. Falls back to the manifest.
    max_sdk_version: Option<u32>,
    /// Minimal criticality of the findings printed to the console.
    min_criticality: Criticality,
    /// Whether to generate the JSON report.
    json: bool,
    /// Folder where the reports are stored.
    results_folder: PathBuf,
    /// Whether to check the Digital Asset Links files of app link hosts.
    check_asset_links: bool,
    /// Whether to run `apksigner` on APK archives.
    verify_signature: bool,
    external: External,
    /// Packages to analyze.
    #[serde(skip)]
    packages: Vec<PathBuf>,
    #[serde(skip)]
    verbose: bool,
    #[serde(skip)]
    quiet: bool,
    /// Installed package to pull an ADB backup of.
    #[serde(skip)]
    adb_backup_package: Option<String>,
    /// Configuration files that were loaded.
    #[serde(skip)]
    loaded_files: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_sdk_version: None,
            target_sdk_version: None,
            max_sdk_version: None,
            min_criticality: Criticality::Info,
            json: false,
            results_folder: PathBuf::from("results"),
            check_asset_links: true,
            verify_signature: true,
            external: External::default(),
            packages: Vec::new(),
            verbose: false,
            quiet: false,
            adb_backup_package: None,
            loaded_files: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from the given TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let code = fs::read_to_string(path)
            .with_context(|| format!("could not read the configuration file {}", path.display()))?;
        let mut config: Self = toml::from_str(&code).map_err(|e| Kind::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.loaded_files.push(path.to_path_buf());
        Ok(config)
    }

    /// Modifies the options from the CLI.
    pub fn decorate_with_cli(&mut self, cli: &ArgMatches) -> Result<()> {
        if let Some(packages) = cli.get_many::<PathBuf>("package") {
            self.packages = packages.cloned().collect();
        }
        if let Some(&min) = cli.get_one::<u32>("min-sdk-version") {
            self.min_sdk_version = Some(min);
        }
        if let Some(&target) = cli.get_one::<u32>("target-sdk-version") {
            self.target_sdk_version = Some(target);
        }
        if let Some(&max) = cli.get_one::<u32>("max-sdk-version") {
            self.max_sdk_version = Some(max);
        }
        if let Some(criticality) = cli.get_one::<String>("min-criticality") {
            self.min_criticality = Criticality::from_str(criticality)?;
        }
        if let Some(folder) = cli.get_one::<PathBuf>("results") {
            self.results_folder = folder.clone();
        }
        if let Some(app_id) = cli.get_one::<String>("adb-backup") {
            self.adb_backup_package = Some(app_id.clone());
        }

        self.json = self.json || cli.get_flag("json");
        self.check_asset_links = self.check_asset_links && !cli.get_flag("no-network");
        self.verify_signature = self.verify_signature && !cli.get_flag("no-signature");
        self.verbose = cli.get_flag("verbose");
        self.quiet = cli.get_flag("quiet");
        if self.quiet && self.min_criticality < Criticality::Warning {
            self.min_criticality = Criticality::Warning;
        }

        Ok(())
    }

    /// Computes the supported SDK range of the manifest.
    ///
    /// Configured versions win. Missing ones come from `<uses-sdk>`: the minimal version
    /// defaults to 1, the target to the minimal version and the maximal one to the latest known
    /// API level.
    pub fn sdk_range(&self, manifest: &Manifest) -> Result<SdkRange> {
        let declared = manifest.uses_sdk();
        let non_zero = |v: Option<u32>| v.filter(|&v| v != 0);

        let min = self
            .min_sdk_version
            .or_else(|| non_zero(declared.min))
            .unwrap_or(1);
        let target = self
            .target_sdk_version
            .or_else(|| non_zero(declared.target));
        let max = self
            .max_sdk_version
            .or_else(|| non_zero(declared.max))
            .unwrap_or_else(|| LATEST_API_LEVEL.max(min).max(target.unwrap_or(min)));

        SdkRange::new(min, target, max)
    }

    pub fn packages(&self) -> &[PathBuf] {
        &self.packages
    }

    pub fn min_criticality(&self) -> Criticality {
        self.min_criticality
    }

    pub fn has_to_generate_json(&self) -> bool {
        self.json
    }

    pub fn results_folder(&self) -> &Path {
        &self.results_folder
    }

    pub fn is_check_asset_links(&self) -> bool {
        self.check_asset_links
    }

    pub fn is_verify_signature(&self) -> bool {
        self.verify_signature
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn apksigner(&self) -> &Path {
        &self.external.apksigner
    }

    pub fn adb(&self) -> &Path {
        &self.external.adb
    }

    pub fn adb_backup_path(&self) -> &Path {
        &self.external.adb_backup_path
    }

    pub fn adb_backup_package(&self) -> Option<&str> {
        self.adb_backup_package.as_deref()
    }

    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }
}
