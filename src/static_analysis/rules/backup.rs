//! Backup exposure rules.

use crate::{
    policy::{PolicyOutcome, PolicyTrigger, Resolution, SdkRange},
    static_analysis::manifest::{Manifest, ResourceRef},
};
use serde::Serialize;
use std::fmt;

/// Checks if the application data can be extracted with `adb backup`.
///
/// `allowBackup` defaults to `true` on every version. From Android 12 the device excludes the
/// data of non debuggable applications, whatever the application targets.
pub fn adb_backup(manifest: &Manifest, range: &SdkRange) -> PolicyOutcome<bool> {
    let application = manifest.application();
    if application.allow_backup.is_false() {
        return PolicyOutcome::Single(false);
    }

    Resolution::InstallRangePinned.resolve(
        PolicyTrigger::ADB_BACKUP_RESTRICTION,
        range,
        || true,
        || application.debuggable.is_true(),
    )
}

/// State of Auto Backup to the cloud on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoBackup {
    /// No automatic cloud backup.
    Inactive,
    /// Backups are uploaded without end-to-end encryption.
    Unencrypted,
    /// Backups can be end-to-end encrypted with the screen lock.
    Encrypted,
}

impl AutoBackup {
    /// Checks if the data is backed up to the cloud at all.
    pub fn is_active(self) -> bool {
        self != Self::Inactive
    }
}

impl fmt::Display for AutoBackup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Unencrypted => write!(f, "unencrypted"),
            Self::Encrypted => write!(f, "encrypted"),
        }
    }
}

/// Checks if the application data is automatically backed up to the cloud, and whether the
/// backup can be end-to-end encrypted.
///
/// Auto Backup is used when backups are allowed and either no backup agent is implemented or
/// `fullBackupOnly` forces it. Encryption is a capability of the device OS only, so it is
/// resolved over every installable version, whatever the target.
pub fn auto_backup(manifest: &Manifest, range: &SdkRange) -> PolicyOutcome<AutoBackup> {
    let application = manifest.application();
    let opted_in = !application.allow_backup.is_false()
        && (application.full_backup_only.is_true() || application.backup_agent.is_none());
    if !opted_in {
        return PolicyOutcome::Single(AutoBackup::Inactive);
    }

    let device_range = range.device_range();
    Resolution::InstallRangePinned.resolve_outcome(
        PolicyTrigger::AUTO_BACKUP,
        range,
        || PolicyOutcome::Single(AutoBackup::Inactive),
        || {
            Resolution::InstallRangePinned.resolve(
                PolicyTrigger::BACKUP_ENCRYPTION,
                &device_range,
                || AutoBackup::Unencrypted,
                || AutoBackup::Encrypted,
            )
        },
    )
}

/// Custom backup agent class, to be reviewed manually.
pub fn backup_agent(manifest: &Manifest) -> Option<String> {
    manifest.application().backup_agent.clone()
}

/// Attribute holding the backup rules file on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RulesAttribute {
    FullBackupContent,
    DataExtractionRules,
}

impl fmt::Display for RulesAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullBackupContent => write!(f, "fullBackupContent"),
            Self::DataExtractionRules => write!(f, "dataExtractionRules"),
        }
    }
}

/// Backup rules file honored on a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RulesFile {
    pub attribute: RulesAttribute,
    /// Referenced file, `None` when the attribute does not reference a resource.
    pub file: Option<ResourceRef>,
}

/// Backup rules coverage over the supported range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRules {
    pub outcome: PolicyOutcome<RulesFile>,
    /// `1`: `fullBackupContent` rules apply somewhere, `2`: `dataExtractionRules` rules apply
    /// somewhere.
    pub coverage: u8,
}

/// Gets the rules files honored over the supported range.
///
/// Both attributes can be declared together: the device uses `dataExtractionRules` from
/// Android 12, and `fullBackupContent` below.
pub fn backup_rules(manifest: &Manifest, range: &SdkRange) -> BackupRules {
    let application = manifest.application();
    let declared = |reference: &Option<ResourceRef>| {
        reference.as_ref().filter(|r| r.is_reference()).cloned()
    };

    let outcome = Resolution::InstallRangePinned.resolve(
        PolicyTrigger::DATA_EXTRACTION_RULES,
        range,
        || RulesFile {
            attribute: RulesAttribute::FullBackupContent,
            file: declared(&application.full_backup_content),
        },
        || RulesFile {
            attribute: RulesAttribute::DataExtractionRules,
            file: declared(&application.data_extraction_rules),
        },
    );

    let coverage = outcome
        .values()
        .into_iter()
        .filter(|r| r.file.is_some())
        .fold(0, |mask, r| {
            mask | match r.attribute {
                RulesAttribute::FullBackupContent => 1,
                RulesAttribute::DataExtractionRules => 2,
            }
        });

    BackupRules { outcome, coverage }
}
