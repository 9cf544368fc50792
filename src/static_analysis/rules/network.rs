//! Network security configuration rules.

use crate::{
    policy::{by_target, PolicyOutcome, PolicyTrigger, Resolution, SdkRange},
    static_analysis::{
        manifest::{Manifest, ResourceRef},
        network_security::{Certificate, DomainSetting, NetworkSecurityConfig},
    },
};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Date format of the `expiration` attribute of pin sets.
const EXPIRATION_FORMAT: &str = "%Y-%m-%d";

/// Network security configuration declared by the application, if any.
pub fn network_security_config_file(manifest: &Manifest) -> Option<&ResourceRef> {
    manifest.application().network_security_config.as_ref()
}

/// Cleartext policy of the network security configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NscCleartext {
    /// Policy for domains without a domain configuration.
    pub base_permitted: bool,
    /// Whether `base_permitted` is the platform default rather than a declared value.
    pub defaulted: bool,
    pub permitted_domains: Vec<String>,
    pub forbidden_domains: Vec<String>,
}

/// Gets the cleartext policy of the configuration.
///
/// Without an explicit `cleartextTrafficPermitted` in the base configuration, the default
/// follows the target SDK: permitted up to Android 8.1, forbidden from Android 9.
pub fn nsc_cleartext(nsc: &NetworkSecurityConfig, range: &SdkRange) -> NscCleartext {
    let declared = nsc
        .base_config()
        .and_then(|b| b.cleartext_traffic_permitted.as_option());
    let base_permitted = declared.unwrap_or_else(|| {
        by_target(PolicyTrigger::CLEARTEXT_DEFAULT, range, || true, || false)
    });

    let (permitted, forbidden): (Vec<_>, Vec<_>) = nsc
        .cleartext_domains(base_permitted)
        .into_iter()
        .partition(|d| d.value);

    NscCleartext {
        base_permitted,
        defaulted: declared.is_none(),
        permitted_domains: permitted.into_iter().map(|d| d.domain).collect(),
        forbidden_domains: forbidden.into_iter().map(|d| d.domain).collect(),
    }
}

/// Trust anchors used when the configuration declares none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultTrustAnchors {
    SystemAndUser,
    SystemOnly,
}

impl DefaultTrustAnchors {
    /// Number of trusted certificate sources.
    pub fn sources(self) -> usize {
        match self {
            Self::SystemAndUser => 2,
            Self::SystemOnly => 1,
        }
    }

    pub fn trusts_user(self) -> bool {
        self == Self::SystemAndUser
    }
}

impl fmt::Display for DefaultTrustAnchors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SystemAndUser => write!(f, "system and user certificates"),
            Self::SystemOnly => write!(f, "system certificates"),
        }
    }
}

/// Trust anchors of the base configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "anchors", rename_all = "snake_case")]
pub enum BaseAnchors {
    Declared(Vec<Certificate>),
    /// Platform default, which depends on the device API level.
    Default(PolicyOutcome<DefaultTrustAnchors>),
}

impl BaseAnchors {
    /// Checks if user installed certificate authorities are trusted on some reachable version.
    pub fn trusts_user(&self) -> bool {
        match self {
            Self::Declared(anchors) => anchors.iter().any(Certificate::is_user),
            Self::Default(outcome) => outcome.any(|d| d.trusts_user()),
        }
    }
}

/// Trust anchors of the whole configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustAnchors {
    pub base: BaseAnchors,
    /// Effective anchors of every configured domain. `None` means the base anchors apply.
    pub domains: Vec<DomainSetting<Option<Vec<Certificate>>>>,
    /// Extra anchors of debuggable builds.
    pub debug_overrides: Option<Vec<Certificate>>,
}

impl TrustAnchors {
    /// Domains trusting user installed certificate authorities through their own anchors.
    pub fn user_trusting_domains(&self) -> Vec<&str> {
        self.domains
            .iter()
            .filter(|d| {
                d.value
                    .as_ref()
                    .map_or(false, |anchors| anchors.iter().any(Certificate::is_user))
            })
            .map(|d| d.domain.as_str())
            .collect()
    }
}

/// Gets the trust anchors of the configuration.
///
/// User installed certificate authorities are trusted by default up to Android 6. From Android 7
/// only system ones are, whatever the target of the application.
pub fn trust_anchors(nsc: &NetworkSecurityConfig, range: &SdkRange) -> TrustAnchors {
    let declared = nsc.base_trust_anchors();
    let base = if declared.is_empty() {
        BaseAnchors::Default(Resolution::InstallRangePinned.resolve(
            PolicyTrigger::USER_TRUST_ANCHORS,
            range,
            || DefaultTrustAnchors::SystemAndUser,
            || DefaultTrustAnchors::SystemOnly,
        ))
    } else {
        BaseAnchors::Declared(declared.to_vec())
    };

    let inherited = Some(declared).filter(|d| !d.is_empty());
    let domains = nsc
        .domain_trust_anchors(inherited)
        .into_iter()
        .map(|d| DomainSetting {
            domain: d.domain,
            value: d.value.map(<[Certificate]>::to_vec),
        })
        .collect();

    TrustAnchors {
        base,
        domains,
        debug_overrides: nsc.debug_overrides().map(<[Certificate]>::to_vec),
    }
}

/// Certificate pinning of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pinning {
    pub domain: String,
    /// Expiration date, as written in the configuration.
    pub expiration: Option<String>,
    /// `None` without expiration date, or when the date cannot be parsed.
    pub expired: Option<bool>,
    pub pins: usize,
    /// Sources of the trust anchors allowed to bypass the pins.
    pub override_pins: Vec<String>,
}

/// Lists the pinned domains of the configuration, with the pin set expiration relative to
/// `today`.
pub fn pinning(nsc: &NetworkSecurityConfig, today: NaiveDate) -> Vec<Pinning> {
    let declared = nsc.base_trust_anchors();
    let anchors = nsc.domain_trust_anchors(Some(declared).filter(|d| !d.is_empty()));

    nsc.domain_pin_sets()
        .into_iter()
        .filter_map(|setting| {
            let pin_set = setting.value?;
            let override_pins = anchors
                .iter()
                .find(|a| a.domain == setting.domain)
                .and_then(|a| a.value)
                .map(|certs| {
                    certs
                        .iter()
                        .filter(|c| c.override_pins)
                        .map(|c| c.src.clone())
                        .collect()
                })
                .unwrap_or_default();
            let expired = pin_set
                .expiration
                .as_deref()
                .and_then(|e| NaiveDate::parse_from_str(e.trim(), EXPIRATION_FORMAT).ok())
                .map(|date| date < today);

            Some(Pinning {
                domain: setting.domain,
                expiration: pin_set.expiration.clone(),
                expired,
                pins: pin_set.pins.len(),
                override_pins,
            })
        })
        .collect()
}
