//! General application information.

use super::components::is_exported;
use crate::{
    policy::SdkRange,
    static_analysis::manifest::{ComponentKind, Manifest, UsesEntry, UsesSdk},
};
use serde::Serialize;

/// Number of declared and exported components of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComponentStats {
    pub kind: ComponentKind,
    pub total: usize,
    pub exported: usize,
}

/// Package identity and component statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub package: String,
    pub version_code: Option<String>,
    pub version_name: Option<String>,
    pub components: Vec<ComponentStats>,
}

/// Component kinds listed in the statistics. Aliases are counted with activities.
const STATS_KINDS: [ComponentKind; 4] = [
    ComponentKind::Activity,
    ComponentKind::Receiver,
    ComponentKind::Provider,
    ComponentKind::Service,
];

pub fn app_info(manifest: &Manifest, range: &SdkRange) -> AppInfo {
    let components = STATS_KINDS
        .iter()
        .map(|&kind| {
            let of_kind: Vec<_> = manifest
                .components()
                .iter()
                .filter(|c| {
                    c.kind() == kind
                        || (kind == ComponentKind::Activity
                            && c.kind() == ComponentKind::ActivityAlias)
                })
                .collect();
            ComponentStats {
                kind,
                total: of_kind.len(),
                exported: of_kind.iter().filter(|c| is_exported(c, range)).count(),
            }
        })
        .collect();

    AppInfo {
        package: manifest.package().to_owned(),
        version_code: manifest.version_code().map(str::to_owned),
        version_name: manifest.version_name().map(str::to_owned),
        components,
    }
}

/// The minimal SDK version differs from the declared one.
pub const MIN_MISMATCH: u8 = 1;
/// The maximal SDK version differs from the declared one.
pub const MAX_MISMATCH: u8 = 2;
/// The target SDK version differs from the declared one.
pub const TARGET_MISMATCH: u8 = 4;

/// Comparison between the analyzed range and the manifest `<uses-sdk>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SdkMismatch {
    pub declared: UsesSdk,
    /// Combination of [`MIN_MISMATCH`], [`MAX_MISMATCH`] and [`TARGET_MISMATCH`].
    pub mask: u8,
}

impl SdkMismatch {
    /// Whether the manifest declares `maxSdkVersion`, which is discouraged.
    pub fn declares_max(&self) -> bool {
        self.declared.max.map_or(false, |max| max != 0)
    }
}

/// Compares the analyzed range with the versions declared in `<uses-sdk>`.
pub fn sdk_mismatch(manifest: &Manifest, range: &SdkRange) -> SdkMismatch {
    let declared = manifest.uses_sdk();
    SdkMismatch {
        declared,
        mask: mismatch_mask(declared, range.min(), range.target(), range.max()),
    }
}

/// Mismatch mask. Absent or `0` declared versions never mismatch.
pub(crate) fn mismatch_mask(declared: UsesSdk, min: u32, target: u32, max: u32) -> u8 {
    let differs = |declared: Option<u32>, actual: u32| match declared {
        Some(v) if v != 0 => v != actual,
        _ => false,
    };

    let mut mask = 0;
    if differs(declared.min, min) {
        mask |= MIN_MISMATCH;
    }
    if differs(declared.max, max) {
        mask |= MAX_MISMATCH;
    }
    if differs(declared.target, target) {
        mask |= TARGET_MISMATCH;
    }
    mask
}

/// Kind of `<uses-*>` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsesKind {
    Library,
    NativeLibrary,
    Feature,
}

/// Library or feature the application depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub kind: UsesKind,
    pub name: String,
    pub required: bool,
}

/// Lists the shared libraries, native libraries and features used by the application.
pub fn uses_entries(manifest: &Manifest) -> Vec<Dependency> {
    let entries = |kind: UsesKind, entries: &[UsesEntry]| -> Vec<Dependency> {
        entries
            .iter()
            .map(|e| Dependency {
                kind,
                name: e.name().to_owned(),
                required: e.is_required(),
            })
            .collect()
    };

    let mut result = entries(UsesKind::Library, manifest.uses_libraries());
    result.extend(entries(UsesKind::NativeLibrary, manifest.uses_native_libraries()));
    result.extend(entries(UsesKind::Feature, manifest.uses_features()));
    result
}

/// Checks if the application is debuggable. Unset means `false`.
pub fn debuggable(manifest: &Manifest) -> bool {
    manifest.application().debuggable.unwrap_or(false)
}
