//! Exported component rules.

use super::links::link_components;
use crate::{
    policy::SdkRange,
    static_analysis::manifest::{Component, ComponentKind, Manifest, TriBool},
};
use serde::Serialize;

/// Last API level where providers are exported by default.
const PROVIDER_EXPORTED_DEFAULT_MAX: u32 = 16;

/// Checks if other applications can start or bind to the component.
///
/// An explicit `exported` attribute wins. Otherwise components are exported when they declare an
/// intent filter, and providers are exported when the application can run on Android 4.1 or
/// lower.
pub fn is_exported(component: &Component, range: &SdkRange) -> bool {
    match component.exported() {
        TriBool::True => true,
        TriBool::False => false,
        TriBool::Unset if component.kind() == ComponentKind::Provider => {
            range.min() <= PROVIDER_EXPORTED_DEFAULT_MAX
        }
        TriBool::Unset => !component.intent_filters().is_empty(),
    }
}

/// Exported component with its permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedComponent {
    pub name: String,
    pub kind: ComponentKind,
    pub permission: Option<String>,
    pub read_permission: Option<String>,
    pub write_permission: Option<String>,
    /// Whether any application can use the component without holding a permission.
    pub unprotected: bool,
}

/// Lists the exported components, except deep and app link handlers which must be reachable
/// without permission.
pub fn exported_components(manifest: &Manifest, range: &SdkRange) -> Vec<ExportedComponent> {
    let links = link_components(manifest);

    manifest
        .components()
        .iter()
        .filter(|c| is_exported(c, range) && !links.contains(c.name()))
        .map(|c| {
            let unprotected = if c.kind() == ComponentKind::Provider {
                c.permission().is_none()
                    && c.read_permission().is_none()
                    && c.write_permission().is_none()
            } else {
                c.permission().is_none()
            };

            ExportedComponent {
                name: c.name().to_owned(),
                kind: c.kind(),
                permission: c.permission().map(str::to_owned),
                read_permission: c.read_permission().map(str::to_owned),
                write_permission: c.write_permission().map(str::to_owned),
                unprotected,
            }
        })
        .collect()
}

/// Lists the unexported providers granting URI permissions, which other applications can still
/// access through the URIs the application shares.
pub fn unexported_providers_with_grant(manifest: &Manifest, range: &SdkRange) -> Vec<String> {
    manifest
        .components_of(ComponentKind::Provider)
        .filter(|p| !is_exported(p, range) && p.grant_uri_permissions().is_true())
        .map(|p| p.name().to_owned())
        .collect()
}

/// Intent filter of an exported component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedIntentFilter {
    pub component: String,
    pub kind: ComponentKind,
    pub actions: Vec<String>,
    pub categories: Vec<String>,
    pub uris: Vec<String>,
    pub mime_types: Vec<String>,
}

/// Lists the intent filters of the exported components.
pub fn intent_filters(manifest: &Manifest, range: &SdkRange) -> Vec<ExportedIntentFilter> {
    manifest
        .components()
        .iter()
        .filter(|c| is_exported(c, range))
        .flat_map(|c| {
            c.intent_filters().iter().map(move |filter| ExportedIntentFilter {
                component: c.name().to_owned(),
                kind: c.kind(),
                actions: filter.actions().to_vec(),
                categories: filter.categories().to_vec(),
                uris: filter.uris(),
                mime_types: filter.mime_types().into_iter().map(str::to_owned).collect(),
            })
        })
        .collect()
}
