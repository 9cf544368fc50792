//! Backup rules documents referenced by `fullBackupContent` and `dataExtractionRules`.

use crate::{
    error::Kind,
    static_analysis::manifest::{TriBool, XmlElement},
};
use anyhow::Result;
use serde::Serialize;

/// Whether a rule adds or removes files from the backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Include,
    Exclude,
}

/// `<include>` or `<exclude>` rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BackupRule {
    pub kind: RuleKind,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// Only for includes: `clientSideEncryption` and/or `deviceToDeviceTransfer`.
    pub require_flags: Option<String>,
}

impl BackupRule {
    fn parse_all(parent: &XmlElement) -> Vec<Self> {
        parent
            .children()
            .iter()
            .filter_map(|element| {
                let kind = match element.tag() {
                    "include" => RuleKind::Include,
                    "exclude" => RuleKind::Exclude,
                    _ => return None,
                };
                Some(Self {
                    kind,
                    domain: element.attr("domain").map(str::to_owned),
                    path: element.attr("path").map(str::to_owned),
                    require_flags: element.attr("requireFlags").map(str::to_owned),
                })
            })
            .collect()
    }
}

/// `<full-backup-content>` document, used up to Android 11.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FullBackupContent {
    pub rules: Vec<BackupRule>,
}

impl FullBackupContent {
    /// Parses the document, either plain text or compiled binary XML.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = XmlElement::parse(bytes)?;
        check_root(&root, "full-backup-content")?;
        Ok(Self {
            rules: BackupRule::parse_all(&root),
        })
    }
}

/// `<cloud-backup>` or `<device-transfer>` section of the data extraction rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSection {
    /// Only meaningful for cloud backups.
    pub disable_if_no_encryption_capabilities: TriBool,
    pub rules: Vec<BackupRule>,
}

impl RuleSection {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            disable_if_no_encryption_capabilities: TriBool::from_attr(
                element.attr("disableIfNoEncryptionCapabilities"),
            ),
            rules: BackupRule::parse_all(element),
        }
    }
}

/// `<data-extraction-rules>` document, used from Android 12.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataExtractionRules {
    pub cloud_backup: Option<RuleSection>,
    pub device_transfer: Option<RuleSection>,
}

impl DataExtractionRules {
    /// Parses the document, either plain text or compiled binary XML.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = XmlElement::parse(bytes)?;
        check_root(&root, "data-extraction-rules")?;
        Ok(Self {
            cloud_backup: root.child("cloud-backup").map(RuleSection::from_element),
            device_transfer: root.child("device-transfer").map(RuleSection::from_element),
        })
    }
}

fn check_root(root: &XmlElement, expected: &str) -> Result<()> {
    if root.tag() == expected {
        Ok(())
    } else {
        Err(Kind::Parse {
            message: format!(
                "unexpected root element `{}` in backup rules, expected `{}`",
                root.tag(),
                expected
            ),
        }
        .into())
    }
}
