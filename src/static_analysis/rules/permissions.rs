//! Builtin and custom permission rules.

use crate::static_analysis::manifest::{Manifest, ProtectionLevel};
use lazy_static::lazy_static;
use serde::Serialize;
use std::{collections::HashSet, fmt};

lazy_static! {
    /// Builtin permissions with the `dangerous` protection level.
    static ref DANGEROUS_PERMISSIONS: HashSet<&'static str> = [
        "android.permission.ACCEPT_HANDOVER",
        "android.permission.ACCESS_BACKGROUND_LOCATION",
        "android.permission.ACCESS_COARSE_LOCATION",
        "android.permission.ACCESS_FINE_LOCATION",
        "android.permission.ACCESS_MEDIA_LOCATION",
        "android.permission.ACTIVITY_RECOGNITION",
        "android.permission.ADD_VOICEMAIL",
        "android.permission.ANSWER_PHONE_CALLS",
        "android.permission.BLUETOOTH_ADVERTISE",
        "android.permission.BLUETOOTH_CONNECT",
        "android.permission.BLUETOOTH_SCAN",
        "android.permission.BODY_SENSORS",
        "android.permission.BODY_SENSORS_BACKGROUND",
        "android.permission.CALL_PHONE",
        "android.permission.CAMERA",
        "android.permission.GET_ACCOUNTS",
        "android.permission.NEARBY_WIFI_DEVICES",
        "android.permission.POST_NOTIFICATIONS",
        "android.permission.PROCESS_OUTGOING_CALLS",
        "android.permission.READ_CALENDAR",
        "android.permission.READ_CALL_LOG",
        "android.permission.READ_CONTACTS",
        "android.permission.READ_EXTERNAL_STORAGE",
        "android.permission.READ_MEDIA_AUDIO",
        "android.permission.READ_MEDIA_IMAGES",
        "android.permission.READ_MEDIA_VIDEO",
        "android.permission.READ_MEDIA_VISUAL_USER_SELECTED",
        "android.permission.READ_PHONE_NUMBERS",
        "android.permission.READ_PHONE_STATE",
        "android.permission.READ_SMS",
        "android.permission.RECEIVE_MMS",
        "android.permission.RECEIVE_SMS",
        "android.permission.RECEIVE_WAP_PUSH",
        "android.permission.RECORD_AUDIO",
        "android.permission.SEND_SMS",
        "android.permission.USE_SIP",
        "android.permission.UWB_RANGING",
        "android.permission.WRITE_CALENDAR",
        "android.permission.WRITE_CALL_LOG",
        "android.permission.WRITE_CONTACTS",
        "android.permission.WRITE_EXTERNAL_STORAGE",
        "com.android.voicemail.permission.ADD_VOICEMAIL",
    ]
    .iter()
    .copied()
    .collect();
}

/// Checks if the builtin permission is in the dangerous permission catalogue.
pub fn is_dangerous(permission: &str) -> bool {
    DANGEROUS_PERMISSIONS.contains(permission)
}

/// Permission requested with `<uses-permission>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestedPermission {
    pub name: String,
    pub dangerous: bool,
}

/// Lists the requested permissions, flagging the dangerous ones.
pub fn builtin_permissions(manifest: &Manifest) -> Vec<RequestedPermission> {
    manifest
        .uses_permissions()
        .iter()
        .map(|name| RequestedPermission {
            name: name.clone(),
            dangerous: is_dangerous(name),
        })
        .collect()
}

/// Custom permission with its audit result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditedPermission {
    pub name: String,
    pub protection_level: ProtectionLevel,
    /// Whether any application can obtain it, at most with user consent.
    pub attacker_reachable: bool,
}

/// Lists the custom permissions. `normal` and `dangerous` ones can be obtained by a malicious
/// application.
pub fn custom_permissions(manifest: &Manifest) -> Vec<AuditedPermission> {
    manifest
        .permissions()
        .iter()
        .map(|p| AuditedPermission {
            name: p.name().to_owned(),
            protection_level: p.protection_level().clone(),
            attacker_reachable: p.protection_level().is_attacker_reachable(),
        })
        .collect()
}

/// Kind of custom permission misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageIssue {
    /// Declared with `<permission>` but never used.
    DeclaredNotUsed,
    /// Protects a component but is never declared, so any application can declare it first.
    UsedNotDeclared,
    /// Set through `android:uses-permission` on a component. The attribute is ignored, so the
    /// component is not protected at all.
    WrongAttribute,
}

impl fmt::Display for UsageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeclaredNotUsed => write!(f, "declared but never used"),
            Self::UsedNotDeclared => write!(f, "used but never declared"),
            Self::WrongAttribute => {
                write!(f, "set with `uses-permission` instead of `permission`")
            }
        }
    }
}

/// Custom permission misuse finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionUsage {
    pub permission: String,
    pub issue: UsageIssue,
    /// Component where the permission is used, if any.
    pub component: Option<String>,
}

/// Audits how custom permissions are declared and assigned.
pub fn permission_usage(manifest: &Manifest) -> Vec<PermissionUsage> {
    let declared: HashSet<&str> = manifest.permissions().iter().map(|p| p.name()).collect();
    let application = manifest.application();

    let mut used: HashSet<&str> = manifest
        .components()
        .iter()
        .flat_map(|c| c.permissions().chain(c.uses_permission_attribute()))
        .collect();
    used.extend(application.permission.as_deref());
    used.extend(manifest.uses_permissions().iter().map(String::as_str));

    let mut findings: Vec<PermissionUsage> = manifest
        .permissions()
        .iter()
        .filter(|p| !used.contains(p.name()))
        .map(|p| PermissionUsage {
            permission: p.name().to_owned(),
            issue: UsageIssue::DeclaredNotUsed,
            component: None,
        })
        .collect();

    let mut reported = HashSet::new();
    for component in manifest.components() {
        for permission in component.permissions() {
            if !permission.starts_with("android.")
                && !declared.contains(permission)
                && reported.insert(permission)
            {
                findings.push(PermissionUsage {
                    permission: permission.to_owned(),
                    issue: UsageIssue::UsedNotDeclared,
                    component: Some(component.name().to_owned()),
                });
            }
        }

        if let Some(permission) = component.uses_permission_attribute() {
            findings.push(PermissionUsage {
                permission: permission.to_owned(),
                issue: UsageIssue::WrongAttribute,
                component: Some(component.name().to_owned()),
            });
        }
    }

    findings
}
