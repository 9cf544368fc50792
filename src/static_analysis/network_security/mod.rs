//! Network security configuration document.
//!
//! See <https://developer.android.com/training/articles/security-config>. Domain configurations
//! nest, and a nested configuration inherits every setting it does not declare from its parent.


use crate::{
    error::Kind,
    static_analysis::manifest::{TriBool, XmlElement},
};
use anyhow::Result;
use serde::Serialize;
use std::fmt;

/// `<certificates>` trust anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Certificate {
    /// `system`, `user` or a raw resource with the certificates.
    pub src: String,
    /// Whether the anchor bypasses certificate pinning.
    pub override_pins: bool,
}

impl Certificate {
    /// Trust anchors of the given element. `override_pins` is the value for certificates that
    /// do not declare `overridePins`, which is `true` only inside `<debug-overrides>`.
    fn parse_anchors(element: &XmlElement, override_pins: bool) -> Vec<Self> {
        element
            .children_named("trust-anchors")
            .flat_map(|anchors| anchors.children_named("certificates"))
            .map(|cert| Self {
                src: cert.attr("src").unwrap_or_default().to_owned(),
                override_pins: TriBool::from_attr(cert.attr("overridePins"))
                    .unwrap_or(override_pins),
            })
            .collect()
    }

    /// Checks if the anchor trusts user installed certificate authorities.
    pub fn is_user(&self) -> bool {
        self.src == "user"
    }
}

/// `<domain>` of a domain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Domain {
    pub name: String,
    pub include_subdomains: bool,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.include_subdomains {
            write!(f, "*.{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// `<pin-set>` of a domain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PinSet {
    /// Expiration date, `yyyy-MM-dd`, as written in the document.
    pub expiration: Option<String>,
    /// `(digest, value)` pairs.
    pub pins: Vec<(String, String)>,
}

impl PinSet {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            expiration: element.attr("expiration").map(str::to_owned),
            pins: element
                .children_named("pin")
                .map(|pin| {
                    (
                        pin.attr("digest").unwrap_or("SHA-256").to_owned(),
                        pin.text().to_owned(),
                    )
                })
                .collect(),
        }
    }
}

/// `<base-config>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseConfig {
    pub cleartext_traffic_permitted: TriBool,
    pub trust_anchors: Vec<Certificate>,
}

/// `<domain-config>` element, with its nested configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainConfig {
    pub cleartext_traffic_permitted: TriBool,
    pub domains: Vec<Domain>,
    pub trust_anchors: Vec<Certificate>,
    pub pin_set: Option<PinSet>,
    pub domain_configs: Vec<DomainConfig>,
}

impl DomainConfig {
    fn parse_all(parent: &XmlElement) -> Vec<Self> {
        parent
            .children_named("domain-config")
            .map(|element| Self {
                cleartext_traffic_permitted: TriBool::from_attr(
                    element.attr("cleartextTrafficPermitted"),
                ),
                domains: element
                    .children_named("domain")
                    .map(|d| Domain {
                        name: d.text().to_owned(),
                        include_subdomains: TriBool::from_attr(d.attr("includeSubdomains"))
                            .unwrap_or(false),
                    })
                    .collect(),
                trust_anchors: Certificate::parse_anchors(element, false),
                pin_set: element.child("pin-set").map(PinSet::from_element),
                domain_configs: Self::parse_all(element),
            })
            .collect()
    }
}

/// Network security configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSecurityConfig {
    base_config: Option<BaseConfig>,
    domain_configs: Vec<DomainConfig>,
    debug_overrides: Option<Vec<Certificate>>,
}

/// Effective setting of one domain, after inheritance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainSetting<T> {
    pub domain: String,
    pub value: T,
}

impl NetworkSecurityConfig {
    /// Parses a network security configuration, either plain text or compiled binary XML.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::from_element(&XmlElement::parse(bytes)?)
    }

    pub fn from_element(root: &XmlElement) -> Result<Self> {
        if root.tag() != "network-security-config" {
            return Err(Kind::Parse {
                message: format!(
                    "unexpected root element `{}` in the network security configuration",
                    root.tag()
                ),
            }
            .into());
        }

        Ok(Self {
            base_config: root.child("base-config").map(|base| BaseConfig {
                cleartext_traffic_permitted: TriBool::from_attr(
                    base.attr("cleartextTrafficPermitted"),
                ),
                trust_anchors: Certificate::parse_anchors(base, false),
            }),
            domain_configs: DomainConfig::parse_all(root),
            debug_overrides: root
                .child("debug-overrides")
                .map(|overrides| Certificate::parse_anchors(overrides, true)),
        })
    }

    pub fn new(
        base_config: Option<BaseConfig>,
        domain_configs: Vec<DomainConfig>,
        debug_overrides: Option<Vec<Certificate>>,
    ) -> Self {
        Self {
            base_config,
            domain_configs,
            debug_overrides,
        }
    }

    pub fn base_config(&self) -> Option<&BaseConfig> {
        self.base_config.as_ref()
    }

    pub fn domain_configs(&self) -> &[DomainConfig] {
        &self.domain_configs
    }

    pub fn debug_overrides(&self) -> Option<&[Certificate]> {
        self.debug_overrides.as_deref()
    }

    /// Trust anchors declared in the base configuration. Empty when none is declared.
    pub fn base_trust_anchors(&self) -> &[Certificate] {
        self.base_config
            .as_ref()
            .map(|b| b.trust_anchors.as_slice())
            .unwrap_or_default()
    }

    /// Effective cleartext policy of every configured domain.
    ///
    /// Top level domain configurations without `cleartextTrafficPermitted` inherit `base`.
    pub fn cleartext_domains(&self, base: bool) -> Vec<DomainSetting<bool>> {
        let mut result = Vec::new();
        collect_cleartext(&self.domain_configs, base, &mut result);
        result
    }

    /// Effective trust anchors of every configured domain.
    ///
    /// Top level domain configurations without trust anchors inherit `inherited`. `None` means
    /// the platform default anchors apply.
    pub fn domain_trust_anchors<'a>(
        &'a self,
        inherited: Option<&'a [Certificate]>,
    ) -> Vec<DomainSetting<Option<&'a [Certificate]>>> {
        let mut result = Vec::new();
        collect_anchors(&self.domain_configs, inherited, &mut result);
        result
    }

    /// Effective pin set of every configured domain.
    pub fn domain_pin_sets(&self) -> Vec<DomainSetting<Option<&PinSet>>> {
        let mut result = Vec::new();
        collect_pin_sets(&self.domain_configs, None, &mut result);
        result
    }
}

fn collect_cleartext(
    configs: &[DomainConfig],
    inherited: bool,
    result: &mut Vec<DomainSetting<bool>>,
) {
    for config in configs {
        let permitted = config.cleartext_traffic_permitted.unwrap_or(inherited);
        result.extend(config.domains.iter().map(|d| DomainSetting {
            domain: d.to_string(),
            value: permitted,
        }));
        collect_cleartext(&config.domain_configs, permitted, result);
    }
}

fn collect_anchors<'a>(
    configs: &'a [DomainConfig],
    inherited: Option<&'a [Certificate]>,
    result: &mut Vec<DomainSetting<Option<&'a [Certificate]>>>,
) {
    for config in configs {
        let anchors = if config.trust_anchors.is_empty() {
            inherited
        } else {
            Some(config.trust_anchors.as_slice())
        };
        result.extend(config.domains.iter().map(|d| DomainSetting {
            domain: d.to_string(),
            value: anchors,
        }));
        collect_anchors(&config.domain_configs, anchors, result);
    }
}

fn collect_pin_sets<'a>(
    configs: &'a [DomainConfig],
    inherited: Option<&'a PinSet>,
    result: &mut Vec<DomainSetting<Option<&'a PinSet>>>,
) {
    for config in configs {
        let pin_set = config.pin_set.as_ref().or(inherited);
        result.extend(config.domains.iter().map(|d| DomainSetting {
            domain: d.to_string(),
            value: pin_set,
        }));
        collect_pin_sets(&config.domain_configs, pin_set, result);
    }
}
