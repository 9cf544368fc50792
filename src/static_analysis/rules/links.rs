//! Deep link and app link rules.

use crate::static_analysis::manifest::{ComponentKind, Manifest};
use serde::Serialize;
use std::{collections::HashSet, fmt};

/// Intent filter opening URIs from a web browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepLink {
    pub component: String,
    pub kind: ComponentKind,
    pub uris: Vec<String>,
    /// Whether the filter requests `autoVerify`, making it an app link.
    pub auto_verify: bool,
}

/// Lists every deep link of the manifest, app links included.
pub fn deep_links(manifest: &Manifest) -> Vec<DeepLink> {
    manifest
        .components()
        .iter()
        .flat_map(|c| {
            c.intent_filters()
                .iter()
                .filter(|f| f.is_deep_link())
                .map(move |f| DeepLink {
                    component: c.name().to_owned(),
                    kind: c.kind(),
                    uris: f.uris(),
                    auto_verify: f.auto_verify().is_true(),
                })
        })
        .collect()
}

/// Names of the components handling deep or app links.
pub fn link_components(manifest: &Manifest) -> HashSet<&str> {
    manifest
        .components()
        .iter()
        .filter(|c| c.intent_filters().iter().any(|f| f.is_deep_link()))
        .map(|c| c.name())
        .collect()
}

/// Result of looking for the Digital Asset Links file of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetLinkStatus {
    /// `https://<host>/.well-known/assetlinks.json` exists.
    Published,
    /// The host answered, but without the file.
    Missing,
    /// The host could not be reached.
    Unverifiable,
    /// Network checks are disabled.
    NotChecked,
}

impl fmt::Display for AssetLinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published => write!(f, "published"),
            Self::Missing => write!(f, "missing"),
            Self::Unverifiable => write!(f, "unverifiable"),
            Self::NotChecked => write!(f, "not checked"),
        }
    }
}

/// Checks the Digital Asset Links file of app link hosts.
pub trait AssetLinkVerifier {
    /// Checks the given host. Wildcards are already stripped.
    fn verify(&self, host: &str) -> AssetLinkStatus;
}

/// Verifier used when network checks are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerification;

impl AssetLinkVerifier for NoVerification {
    fn verify(&self, _host: &str) -> AssetLinkStatus {
        AssetLinkStatus::NotChecked
    }
}

/// Verified host of an app link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppLink {
    /// Host as declared, wildcard included.
    pub host: String,
    pub status: AssetLinkStatus,
}

/// Lists the distinct hosts of the app links, with the status of their Digital Asset Links
/// file.
pub fn app_links<V: AssetLinkVerifier + ?Sized>(manifest: &Manifest, verifier: &V) -> Vec<AppLink> {
    let mut hosts: Vec<&str> = Vec::new();
    for component in manifest.components() {
        for filter in component.intent_filters() {
            if !filter.is_deep_link() || !filter.auto_verify().is_true() {
                continue;
            }
            for host in filter.hosts() {
                if !hosts.contains(&host) {
                    hosts.push(host);
                }
            }
        }
    }

    hosts
        .into_iter()
        .map(|host| AppLink {
            host: host.to_owned(),
            status: verifier.verify(host.strip_prefix("*.").unwrap_or(host)),
        })
        .collect()
}
