//! Results collection and report generation.

mod console;
mod fingerprint;
mod report;

pub use self::{console::describe, fingerprint::FingerPrint};

use self::report::{Generator, Json};
use crate::{
    config::Config, criticality::Criticality, policy::SdkRange,
    static_analysis::{package::Package, Fact},
};
use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, warn};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Sink of the analysis facts.
pub trait Reporter {
    /// Records the result of one rule.
    fn record(&mut self, fact: Fact);
}

impl Reporter for Vec<Fact> {
    fn record(&mut self, fact: Fact) {
        self.push(fact);
    }
}

/// Results of the analysis of one package.
pub struct Results {
    app_package: String,
    app_file: PathBuf,
    range: SdkRange,
    fingerprint: Option<FingerPrint>,
    signature: Option<String>,
    adb_backup: Option<PathBuf>,
    min_criticality: Criticality,
    facts: Vec<Fact>,
}

impl Results {
    /// Creates the results of the given package, fingerprinting the analyzed file.
    pub fn init(package: &Package, range: SdkRange, min_criticality: Criticality) -> Self {
        let fingerprint = match FingerPrint::new(package.file()) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("could not fingerprint {}: {:#}", package.file().display(), e);
                None
            }
        };

        Self {
            app_package: package.manifest().package().to_owned(),
            app_file: package.file().to_path_buf(),
            range,
            fingerprint,
            signature: None,
            adb_backup: None,
            min_criticality,
            facts: Vec::new(),
        }
    }

    pub fn app_package(&self) -> &str {
        &self.app_package
    }

    pub fn range(&self) -> SdkRange {
        self.range
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Stores the output of the signature verification.
    pub fn set_signature<S: Into<String>>(&mut self, output: S) {
        self.signature = Some(output.into());
    }

    /// Stores the location of the pulled ADB backup.
    pub fn set_adb_backup<P: Into<PathBuf>>(&mut self, path: P) {
        self.adb_backup = Some(path.into());
    }

    /// Every finding of the recorded facts, with its criticality.
    pub fn findings(&self) -> Vec<(Criticality, String)> {
        self.facts
            .iter()
            .flat_map(|fact| describe(fact, &self.range))
            .collect()
    }

    /// Folder where the reports of this package are written.
    pub fn report_folder(&self, config: &Config) -> PathBuf {
        config.results_folder().join(&self.app_package)
    }

    /// Generates the reports enabled in the configuration. Returns `false` when none is.
    pub fn generate_report(&self, config: &Config) -> Result<bool> {
        if !config.has_to_generate_json() {
            return Ok(false);
        }

        let path = self.report_folder(config);
        create_folder(&path)?;

        let mut json_reporter = Json::new();
        json_reporter
            .generate(&path, self)
            .context("there was an error generating the JSON report")?;
        debug!("JSON report generated in {}", path.display());

        Ok(true)
    }
}

impl Reporter for Results {
    fn record(&mut self, fact: Fact) {
        for (criticality, message) in describe(&fact, &self.range) {
            if criticality >= self.min_criticality {
                console::print(criticality, &message);
            }
        }
        self.facts.push(fact);
    }
}

fn create_folder(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("could not create the {} folder", path.display()))?;
    }
    Ok(())
}

impl Serialize for Results {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let now = Local::now();
        let findings = self.findings();
        let count = |criticality: Criticality| {
            findings.iter().filter(|(c, _)| *c == criticality).count()
        };

        let mut ser_struct = serializer.serialize_struct("Results", 13)?;
        ser_struct.serialize_field("analyzer_version", env!("CARGO_PKG_VERSION"))?;
        ser_struct.serialize_field("now", &now)?;
        ser_struct.serialize_field("now_rfc3339", &now.to_rfc3339())?;
        ser_struct.serialize_field("app_package", &self.app_package)?;
        ser_struct.serialize_field("app_file", &self.app_file)?;
        ser_struct.serialize_field("app_fingerprint", &self.fingerprint)?;
        ser_struct.serialize_field("sdk_range", &self.range)?;
        ser_struct.serialize_field("signature", &self.signature)?;
        ser_struct.serialize_field("adb_backup", &self.adb_backup)?;
        ser_struct.serialize_field("criticals_len", &count(Criticality::Critical))?;
        ser_struct.serialize_field("warnings_len", &count(Criticality::Warning))?;
        ser_struct.serialize_field("infos_len", &count(Criticality::Info))?;
        ser_struct.serialize_field("facts", &self.facts)?;
        ser_struct.end()
    }
}
