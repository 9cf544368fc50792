//! Static analysis of the application manifest and of the documents it references.
//!
//! The analysis runs every rule against the loaded package and streams the results, as
//! [`Fact`]s, into a [`Reporter`]. Rules never decide how their results are presented.

pub mod backup_rules;
pub mod manifest;
pub mod network_security;
pub mod package;
pub mod rules;

use self::{
    backup_rules::{DataExtractionRules, FullBackupContent},
    manifest::ResourceRef,
    package::Package,
    rules::{
        backup::{self, AutoBackup, BackupRules},
        cleartext::{self, Cleartext},
        components::{self, ExportedComponent, ExportedIntentFilter},
        info::{self, AppInfo, Dependency, SdkMismatch},
        links::{self, AppLink, AssetLinkVerifier, DeepLink},
        network::{self, NscCleartext, Pinning, TrustAnchors},
        permissions::{self, AuditedPermission, PermissionUsage, RequestedPermission},
    },
};
use crate::{
    policy::{PolicyOutcome, SdkRange},
    results::Reporter,
};
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

/// Inputs of an analysis run, besides the package itself.
pub struct AnalysisContext<'a> {
    /// Supported SDK range, already validated.
    pub range: SdkRange,
    /// Reference date for pin set expirations.
    pub today: NaiveDate,
    pub verifier: &'a dyn AssetLinkVerifier,
}

/// Result of one rule.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "rule", content = "result", rename_all = "snake_case")]
pub enum Fact {
    AppInfo(AppInfo),
    SdkMismatch(SdkMismatch),
    Dependencies(Vec<Dependency>),
    BuiltinPermissions(Vec<RequestedPermission>),
    CustomPermissions(Vec<AuditedPermission>),
    PermissionUsage(Vec<PermissionUsage>),
    Debuggable(bool),
    AdbBackup(PolicyOutcome<bool>),
    AutoBackup(PolicyOutcome<AutoBackup>),
    BackupAgent(Option<String>),
    BackupRules {
        rules: BackupRules,
        /// Parsed `fullBackupContent` document, when it could be loaded.
        full_backup_content: Option<FullBackupContent>,
        /// Parsed `dataExtractionRules` document, when it could be loaded.
        data_extraction_rules: Option<DataExtractionRules>,
    },
    CleartextTraffic(PolicyOutcome<Cleartext>),
    NetworkSecurityConfig(Option<ResourceRef>),
    NscCleartext(NscCleartext),
    NscTrustAnchors(TrustAnchors),
    NscPinning(Vec<Pinning>),
    ExportedComponents(Vec<ExportedComponent>),
    UnexportedProvidersWithGrant(Vec<String>),
    IntentFilters(Vec<ExportedIntentFilter>),
    DeepLinks(Vec<DeepLink>),
    AppLinks(Vec<AppLink>),
}

impl Fact {
    /// Stable name of the rule that produced the fact.
    pub fn rule_name(&self) -> &'static str {
        match self {
            Self::AppInfo(_) => "app_info",
            Self::SdkMismatch(_) => "sdk_mismatch",
            Self::Dependencies(_) => "dependencies",
            Self::BuiltinPermissions(_) => "builtin_permissions",
            Self::CustomPermissions(_) => "custom_permissions",
            Self::PermissionUsage(_) => "permission_usage",
            Self::Debuggable(_) => "debuggable",
            Self::AdbBackup(_) => "adb_backup",
            Self::AutoBackup(_) => "auto_backup",
            Self::BackupAgent(_) => "backup_agent",
            Self::BackupRules { .. } => "backup_rules",
            Self::CleartextTraffic(_) => "cleartext_traffic",
            Self::NetworkSecurityConfig(_) => "network_security_config",
            Self::NscCleartext(_) => "nsc_cleartext",
            Self::NscTrustAnchors(_) => "nsc_trust_anchors",
            Self::NscPinning(_) => "nsc_pinning",
            Self::ExportedComponents(_) => "exported_components",
            Self::UnexportedProvidersWithGrant(_) => "unexported_providers_with_grant",
            Self::IntentFilters(_) => "intent_filters",
            Self::DeepLinks(_) => "deep_links",
            Self::AppLinks(_) => "app_links",
        }
    }
}

/// Runs every rule on the package.
pub fn run(package: &Package, context: &AnalysisContext<'_>, reporter: &mut dyn Reporter) {
    let manifest = package.manifest();
    let range = &context.range;
    debug!(
        "analyzing {} for API levels {} to {}, targeting {}",
        manifest.package(),
        range.min(),
        range.max(),
        range.target()
    );

    reporter.record(Fact::AppInfo(info::app_info(manifest, range)));
    reporter.record(Fact::SdkMismatch(info::sdk_mismatch(manifest, range)));
    reporter.record(Fact::Dependencies(info::uses_entries(manifest)));

    reporter.record(Fact::BuiltinPermissions(permissions::builtin_permissions(
        manifest,
    )));
    reporter.record(Fact::CustomPermissions(permissions::custom_permissions(
        manifest,
    )));
    reporter.record(Fact::PermissionUsage(permissions::permission_usage(manifest)));

    reporter.record(Fact::Debuggable(info::debuggable(manifest)));

    let adb_backup = backup::adb_backup(manifest, range);
    let auto_backup = backup::auto_backup(manifest, range);
    let backup_possible = adb_backup.any(|&allowed| allowed) || auto_backup.any(|a| a.is_active());
    reporter.record(Fact::AdbBackup(adb_backup));
    reporter.record(Fact::AutoBackup(auto_backup));
    reporter.record(Fact::BackupAgent(backup::backup_agent(manifest)));
    if backup_possible {
        reporter.record(Fact::BackupRules {
            rules: backup::backup_rules(manifest, range),
            full_backup_content: package.full_backup_content().cloned(),
            data_extraction_rules: package.data_extraction_rules().cloned(),
        });
    } else {
        debug!("backups are disabled on every version, skipping the backup rules");
    }

    reporter.record(Fact::CleartextTraffic(cleartext::cleartext_traffic(
        manifest, range,
    )));
    reporter.record(Fact::NetworkSecurityConfig(
        network::network_security_config_file(manifest).cloned(),
    ));
    if let Some(nsc) = package.network_security_config() {
        reporter.record(Fact::NscCleartext(network::nsc_cleartext(nsc, range)));
        reporter.record(Fact::NscTrustAnchors(network::trust_anchors(nsc, range)));
        reporter.record(Fact::NscPinning(network::pinning(nsc, context.today)));
    }

    reporter.record(Fact::ExportedComponents(components::exported_components(
        manifest, range,
    )));
    reporter.record(Fact::UnexportedProvidersWithGrant(
        components::unexported_providers_with_grant(manifest, range),
    ));
    reporter.record(Fact::IntentFilters(components::intent_filters(
        manifest, range,
    )));
    reporter.record(Fact::DeepLinks(links::deep_links(manifest)));
    reporter.record(Fact::AppLinks(links::app_links(manifest, context.verifier)));
}
