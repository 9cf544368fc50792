//! Console presentation of the facts.
//!
//! This is the only place where a criticality is attached to a rule result.

use crate::{
    criticality::Criticality,
    policy::{PolicyOutcome, SdkRange},
    sdk_number::SdkNumber,
    static_analysis::{
        backup_rules::{BackupRule, RuleKind},
        rules::{
            backup::{AutoBackup, BackupRules},
            cleartext::Cleartext,
            info::{UsesKind, MAX_MISMATCH, MIN_MISMATCH, TARGET_MISMATCH},
            links::AssetLinkStatus,
            network::BaseAnchors,
            permissions::UsageIssue,
        },
        Fact,
    },
};
use log::{error, info, warn};

/// Prints a finding through the logger.
pub fn print(criticality: Criticality, message: &str) {
    match criticality {
        Criticality::Critical => error!("{}", message),
        Criticality::Warning => warn!("{}", message),
        Criticality::Info => info!("{}", message),
    }
}

/// Human readable API level interval.
fn versions(from: u32, to: u32) -> String {
    if from == to {
        SdkNumber::new(from).to_string()
    } else {
        format!("{} to {}", SdkNumber::new(from), SdkNumber::new(to))
    }
}

/// Describes the value of the outcome on every reachable API level interval.
fn per_version<T, F>(outcome: &PolicyOutcome<T>, range: &SdkRange, label: F) -> String
where
    F: Fn(&T) -> String,
{
    outcome
        .intervals(range.min(), range.max())
        .into_iter()
        .map(|(from, to, value)| format!("{} on {}", label(value), versions(from, to)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Criticality of an outcome that is only a problem when `bad` holds.
fn outcome_criticality<T, F>(outcome: &PolicyOutcome<T>, bad: F, worst: Criticality) -> Criticality
where
    F: Fn(&T) -> bool,
{
    if outcome.all(|v| bad(v)) {
        worst
    } else if outcome.any(|v| bad(v)) {
        Criticality::Warning.min(worst)
    } else {
        Criticality::Info
    }
}

fn describe_rule(rule: &BackupRule) -> String {
    let kind = match rule.kind {
        RuleKind::Include => "includes",
        RuleKind::Exclude => "excludes",
    };
    let mut description = format!(
        "{} `{}` in the `{}` domain",
        kind,
        rule.path.as_deref().unwrap_or("."),
        rule.domain.as_deref().unwrap_or("?")
    );
    if let Some(flags) = &rule.require_flags {
        description.push_str(&format!(" (requires {})", flags));
    }
    description
}

fn describe_backup_rules(
    rules: &BackupRules,
    range: &SdkRange,
    findings: &mut Vec<(Criticality, String)>,
) {
    for (from, to, file) in rules.outcome.intervals(range.min(), range.max()) {
        match &file.file {
            Some(reference) => findings.push((
                Criticality::Info,
                format!(
                    "backups on {} follow the `{}` rules of {}",
                    versions(from, to),
                    file.attribute,
                    reference
                ),
            )),
            None => findings.push((
                Criticality::Warning,
                format!(
                    "no `{}` rules for backups on {}: every file of the application is backed up",
                    file.attribute,
                    versions(from, to)
                ),
            )),
        }
    }
}

/// Converts a fact into findings, with their criticality.
pub fn describe(fact: &Fact, range: &SdkRange) -> Vec<(Criticality, String)> {
    let mut findings = Vec::new();

    match fact {
        Fact::AppInfo(app) => {
            findings.push((
                Criticality::Info,
                format!(
                    "package {}, version {} ({})",
                    app.package,
                    app.version_name.as_deref().unwrap_or("unknown"),
                    app.version_code.as_deref().unwrap_or("unknown")
                ),
            ));
            for stats in &app.components {
                findings.push((
                    Criticality::Info,
                    format!("{}: {} declared, {} exported", stats.kind, stats.total, stats.exported),
                ));
            }
        }
        Fact::SdkMismatch(mismatch) => {
            let declared = mismatch.declared;
            let checks = [
                (MIN_MISMATCH, "minSdkVersion", declared.min, range.min()),
                (TARGET_MISMATCH, "targetSdkVersion", declared.target, range.target()),
                (MAX_MISMATCH, "maxSdkVersion", declared.max, range.max()),
            ];
            for (bit, attribute, declared, analyzed) in checks {
                if mismatch.mask & bit != 0 {
                    findings.push((
                        Criticality::Warning,
                        format!(
                            "the manifest declares {} {}, but API {} is analyzed",
                            attribute,
                            declared.unwrap_or_default(),
                            analyzed
                        ),
                    ));
                }
            }
            if mismatch.declares_max() {
                findings.push((
                    Criticality::Warning,
                    "maxSdkVersion is declared: the application will be removed from devices \
                     upgraded past it"
                        .to_owned(),
                ));
            }
        }
        Fact::Dependencies(dependencies) => {
            for dependency in dependencies {
                let kind = match dependency.kind {
                    UsesKind::Library => "library",
                    UsesKind::NativeLibrary => "native library",
                    UsesKind::Feature => "feature",
                };
                findings.push((
                    Criticality::Info,
                    format!(
                        "uses {} {}{}",
                        kind,
                        dependency.name,
                        if dependency.required { "" } else { " (optional)" }
                    ),
                ));
            }
        }
        Fact::BuiltinPermissions(permissions) => {
            let dangerous: Vec<_> = permissions.iter().filter(|p| p.dangerous).collect();
            for permission in &dangerous {
                findings.push((
                    Criticality::Warning,
                    format!("dangerous permission requested: {}", permission.name),
                ));
            }
            findings.push((
                Criticality::Info,
                format!(
                    "{} permissions requested, {} of them dangerous",
                    permissions.len(),
                    dangerous.len()
                ),
            ));
        }
        Fact::CustomPermissions(permissions) => {
            for permission in permissions {
                if permission.attacker_reachable {
                    findings.push((
                        Criticality::Warning,
                        format!(
                            "custom permission {} has the `{}` protection level: any \
                             application can obtain it",
                            permission.name, permission.protection_level
                        ),
                    ));
                } else {
                    findings.push((
                        Criticality::Info,
                        format!(
                            "custom permission {} ({})",
                            permission.name, permission.protection_level
                        ),
                    ));
                }
            }
        }
        Fact::PermissionUsage(usages) => {
            for usage in usages {
                let criticality = match usage.issue {
                    UsageIssue::DeclaredNotUsed => Criticality::Warning,
                    UsageIssue::UsedNotDeclared | UsageIssue::WrongAttribute => {
                        Criticality::Critical
                    }
                };
                let location = usage
                    .component
                    .as_ref()
                    .map(|c| format!(" in {}", c))
                    .unwrap_or_default();
                findings.push((
                    criticality,
                    format!("permission {} is {}{}", usage.permission, usage.issue, location),
                ));
            }
        }
        Fact::Debuggable(true) => findings.push((
            Criticality::Critical,
            "the application is debuggable".to_owned(),
        )),
        Fact::Debuggable(false) => {}
        Fact::AdbBackup(outcome) => findings.push((
            outcome_criticality(outcome, |&allowed| allowed, Criticality::Critical),
            format!(
                "ADB backup: {}",
                per_version(outcome, range, |&allowed| {
                    String::from(if allowed { "allowed" } else { "blocked" })
                })
            ),
        )),
        Fact::AutoBackup(outcome) => findings.push((
            outcome_criticality(
                outcome,
                |&a| a == AutoBackup::Unencrypted,
                Criticality::Warning,
            ),
            format!("auto backup: {}", per_version(outcome, range, ToString::to_string)),
        )),
        Fact::BackupAgent(Some(agent)) => findings.push((
            Criticality::Warning,
            format!("custom backup agent {} should be reviewed", agent),
        )),
        Fact::BackupAgent(None) => {}
        Fact::BackupRules {
            rules,
            full_backup_content,
            data_extraction_rules,
        } => {
            describe_backup_rules(rules, range, &mut findings);
            if let Some(content) = full_backup_content {
                for rule in &content.rules {
                    findings.push((
                        Criticality::Info,
                        format!("fullBackupContent {}", describe_rule(rule)),
                    ));
                }
            }
            if let Some(extraction) = data_extraction_rules {
                let sections = [
                    ("cloud backup", &extraction.cloud_backup),
                    ("device transfer", &extraction.device_transfer),
                ];
                for (name, section) in sections {
                    for rule in section.iter().flat_map(|s| &s.rules) {
                        findings.push((
                            Criticality::Info,
                            format!("{} {}", name, describe_rule(rule)),
                        ));
                    }
                }
                if let Some(cloud) = &extraction.cloud_backup {
                    if !cloud.disable_if_no_encryption_capabilities.is_true() {
                        findings.push((
                            Criticality::Info,
                            "cloud backups are uploaded even without end-to-end encryption"
                                .to_owned(),
                        ));
                    }
                }
            }
        }
        Fact::CleartextTraffic(outcome) => findings.push((
            outcome_criticality(outcome, |&c| c == Cleartext::Permitted, Criticality::Warning),
            format!(
                "cleartext traffic: {}",
                per_version(outcome, range, ToString::to_string)
            ),
        )),
        Fact::NetworkSecurityConfig(file) => findings.push((
            Criticality::Info,
            match file {
                Some(file) => format!("network security configuration: {}", file),
                None => "no network security configuration".to_owned(),
            },
        )),
        Fact::NscCleartext(cleartext) => {
            if cleartext.base_permitted {
                findings.push((
                    Criticality::Warning,
                    format!(
                        "the network security configuration permits cleartext traffic by \
                         default{}",
                        if cleartext.defaulted {
                            " (platform default)"
                        } else {
                            ""
                        }
                    ),
                ));
            }
            for domain in &cleartext.permitted_domains {
                findings.push((
                    Criticality::Warning,
                    format!("cleartext traffic is permitted for {}", domain),
                ));
            }
            for domain in &cleartext.forbidden_domains {
                findings.push((
                    Criticality::Info,
                    format!("cleartext traffic is forbidden for {}", domain),
                ));
            }
        }
        Fact::NscTrustAnchors(anchors) => {
            let base = match &anchors.base {
                BaseAnchors::Declared(certificates) => certificates
                    .iter()
                    .map(|c| c.src.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                BaseAnchors::Default(outcome) => per_version(outcome, range, ToString::to_string),
            };
            let criticality = if anchors.base.trusts_user() {
                Criticality::Warning
            } else {
                Criticality::Info
            };
            findings.push((criticality, format!("trusted certificates: {}", base)));
            for domain in anchors.user_trusting_domains() {
                findings.push((
                    Criticality::Warning,
                    format!("user installed certificates are trusted for {}", domain),
                ));
            }
            if let Some(overrides) = &anchors.debug_overrides {
                findings.push((
                    Criticality::Info,
                    format!(
                        "debug builds also trust: {}",
                        overrides
                            .iter()
                            .map(|c| c.src.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                ));
            }
        }
        Fact::NscPinning(pinning) => {
            for pin in pinning {
                findings.push((
                    Criticality::Info,
                    format!("{} certificate pins for {}", pin.pins, pin.domain),
                ));
                if pin.expired == Some(true) {
                    findings.push((
                        Criticality::Warning,
                        format!(
                            "the pins of {} expired on {}",
                            pin.domain,
                            pin.expiration.as_deref().unwrap_or_default()
                        ),
                    ));
                }
                if !pin.override_pins.is_empty() {
                    findings.push((
                        Criticality::Warning,
                        format!(
                            "the pins of {} can be bypassed by {} certificates",
                            pin.domain,
                            pin.override_pins.join(", ")
                        ),
                    ));
                }
            }
        }
        Fact::ExportedComponents(components) => {
            for component in components {
                if component.unprotected {
                    findings.push((
                        Criticality::Warning,
                        format!(
                            "exported {} {} is not protected by any permission",
                            component.kind, component.name
                        ),
                    ));
                } else {
                    findings.push((
                        Criticality::Info,
                        format!("exported {} {}", component.kind, component.name),
                    ));
                }
            }
        }
        Fact::UnexportedProvidersWithGrant(providers) => {
            for provider in providers {
                findings.push((
                    Criticality::Warning,
                    format!(
                        "provider {} is not exported but grants URI permissions",
                        provider
                    ),
                ));
            }
        }
        Fact::IntentFilters(filters) => {
            for filter in filters {
                let mut items = filter.actions.clone();
                items.extend(filter.categories.iter().cloned());
                items.extend(filter.uris.iter().cloned());
                items.extend(filter.mime_types.iter().cloned());
                findings.push((
                    Criticality::Info,
                    format!("{} {} handles {}", filter.kind, filter.component, items.join(", ")),
                ));
            }
        }
        Fact::DeepLinks(links) => {
            for link in links {
                findings.push((
                    Criticality::Info,
                    format!(
                        "{} link to {}: {}",
                        if link.auto_verify { "app" } else { "deep" },
                        link.component,
                        link.uris.join(", ")
                    ),
                ));
            }
        }
        Fact::AppLinks(links) => {
            for link in links {
                let criticality = match link.status {
                    AssetLinkStatus::Missing | AssetLinkStatus::Unverifiable => {
                        Criticality::Warning
                    }
                    AssetLinkStatus::Published | AssetLinkStatus::NotChecked => Criticality::Info,
                };
                findings.push((
                    criticality,
                    format!("app link host {}: asset links {}", link.host, link.status),
                ));
            }
        }
    }

    findings
}
