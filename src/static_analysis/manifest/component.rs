//! Application components, intent filters and declared permissions.

use super::{xml::XmlElement, TriBool};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// Intent action of filters that open URIs.
pub const ACTION_VIEW: &str = "android.intent.action.VIEW";
/// Intent category of filters reachable from a web browser.
pub const CATEGORY_BROWSABLE: &str = "android.intent.category.BROWSABLE";

/// Kind of application component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Activity,
    ActivityAlias,
    Receiver,
    Provider,
    Service,
}

impl ComponentKind {
    /// Every component kind, in report order.
    pub const ALL: [Self; 5] = [
        Self::Activity,
        Self::ActivityAlias,
        Self::Receiver,
        Self::Provider,
        Self::Service,
    ];

    /// Manifest tag of the component kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::ActivityAlias => "activity-alias",
            Self::Receiver => "receiver",
            Self::Provider => "provider",
            Self::Service => "service",
        }
    }

    /// Gets the component kind declared by a manifest tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Application component (`<activity>`, `<activity-alias>`, `<receiver>`, `<provider>` or
/// `<service>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    kind: ComponentKind,
    name: String,
    exported: TriBool,
    permission: Option<String>,
    read_permission: Option<String>,
    write_permission: Option<String>,
    grant_uri_permissions: TriBool,
    uses_permission_attribute: Option<String>,
    intent_filters: Vec<IntentFilter>,
}

impl Component {
    pub(super) fn from_element(kind: ComponentKind, element: &XmlElement) -> Self {
        Self {
            kind,
            name: element
                .attr("name")
                .or_else(|| element.attr("targetActivity"))
                .unwrap_or_default()
                .to_owned(),
            exported: TriBool::from_attr(element.attr("exported")),
            permission: element.attr("permission").map(str::to_owned),
            read_permission: element.attr("readPermission").map(str::to_owned),
            write_permission: element.attr("writePermission").map(str::to_owned),
            grant_uri_permissions: TriBool::from_attr(element.attr("grantUriPermissions")),
            uses_permission_attribute: element.attr("uses-permission").map(str::to_owned),
            intent_filters: element
                .children_named("intent-filter")
                .map(IntentFilter::from_element)
                .collect(),
        }
    }

    /// Creates a component without attributes.
    pub fn new<S: Into<String>>(kind: ComponentKind, name: S) -> Self {
        Self {
            kind,
            name: name.into(),
            exported: TriBool::Unset,
            permission: None,
            read_permission: None,
            write_permission: None,
            grant_uri_permissions: TriBool::Unset,
            uses_permission_attribute: None,
            intent_filters: Vec::new(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Fully qualified name, as written in the manifest.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the component name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn exported(&self) -> TriBool {
        self.exported
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn read_permission(&self) -> Option<&str> {
        self.read_permission.as_deref()
    }

    pub fn write_permission(&self) -> Option<&str> {
        self.write_permission.as_deref()
    }

    pub fn grant_uri_permissions(&self) -> TriBool {
        self.grant_uri_permissions
    }

    /// Permission set through the non-standard `android:uses-permission` attribute, which the
    /// platform ignores.
    pub fn uses_permission_attribute(&self) -> Option<&str> {
        self.uses_permission_attribute.as_deref()
    }

    pub fn intent_filters(&self) -> &[IntentFilter] {
        &self.intent_filters
    }

    /// Every permission protecting the component through a standard attribute.
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permission
            .iter()
            .chain(self.read_permission.iter())
            .chain(self.write_permission.iter())
            .map(String::as_str)
    }

    pub fn set_exported(&mut self, exported: TriBool) {
        self.exported = exported;
    }

    pub fn set_permission<S: Into<String>>(&mut self, permission: S) {
        self.permission = Some(permission.into());
    }

    pub fn set_read_permission<S: Into<String>>(&mut self, permission: S) {
        self.read_permission = Some(permission.into());
    }

    pub fn set_write_permission<S: Into<String>>(&mut self, permission: S) {
        self.write_permission = Some(permission.into());
    }

    pub fn set_grant_uri_permissions(&mut self, grant: TriBool) {
        self.grant_uri_permissions = grant;
    }

    pub fn set_uses_permission_attribute<S: Into<String>>(&mut self, permission: S) {
        self.uses_permission_attribute = Some(permission.into());
    }

    pub fn add_intent_filter(&mut self, filter: IntentFilter) {
        self.intent_filters.push(filter);
    }
}

/// `<intent-filter>` of a component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentFilter {
    actions: Vec<String>,
    categories: Vec<String>,
    data: Vec<IntentData>,
    auto_verify: TriBool,
}

impl IntentFilter {
    fn from_element(element: &XmlElement) -> Self {
        let names = |tag: &str| -> Vec<String> {
            element
                .children_named(tag)
                .filter_map(|e| e.attr("name"))
                .map(str::to_owned)
                .collect()
        };

        Self {
            actions: names("action"),
            categories: names("category"),
            data: element
                .children_named("data")
                .map(IntentData::from_element)
                .collect(),
            auto_verify: TriBool::from_attr(element.attr("autoVerify")),
        }
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn data(&self) -> &[IntentData] {
        &self.data
    }

    pub fn auto_verify(&self) -> TriBool {
        self.auto_verify
    }

    pub fn with_action<S: Into<String>>(mut self, action: S) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_data(mut self, data: IntentData) -> Self {
        self.data.push(data);
        self
    }

    pub fn with_auto_verify(mut self, auto_verify: TriBool) -> Self {
        self.auto_verify = auto_verify;
        self
    }

    /// Checks if the filter is a deep link: it opens browsable URIs with at least one scheme.
    pub fn is_deep_link(&self) -> bool {
        self.actions.iter().any(|a| a == ACTION_VIEW)
            && self.categories.iter().any(|c| c == CATEGORY_BROWSABLE)
            && !self.schemes().is_empty()
    }

    /// Distinct schemes of the `<data>` elements, in declaration order.
    pub fn schemes(&self) -> Vec<&str> {
        distinct(self.data.iter().filter_map(|d| d.scheme.as_deref()))
    }

    /// Distinct hosts of the `<data>` elements, in declaration order.
    pub fn hosts(&self) -> Vec<&str> {
        distinct(self.data.iter().filter_map(|d| d.host.as_deref()))
    }

    /// Distinct ports of the `<data>` elements, in declaration order.
    pub fn ports(&self) -> Vec<&str> {
        distinct(self.data.iter().filter_map(|d| d.port.as_deref()))
    }

    /// Distinct paths of the `<data>` elements. Prefixes get a trailing `*`.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for data in &self.data {
            let candidates = [
                data.path.clone(),
                data.path_prefix.as_ref().map(|p| format!("{}*", p)),
                data.path_pattern.clone(),
            ];
            for path in candidates.iter().flatten() {
                if !paths.contains(path) {
                    paths.push(path.clone());
                }
            }
        }
        paths
    }

    /// Distinct MIME types of the `<data>` elements.
    pub fn mime_types(&self) -> Vec<&str> {
        distinct(self.data.iter().filter_map(|d| d.mime_type.as_deref()))
    }

    /// Every URI matched by the filter: schemes × hosts × ports × paths.
    ///
    /// The `<data>` elements of a filter are merged by the platform, so a host declared in one
    /// element applies to the schemes of every other element.
    pub fn uris(&self) -> Vec<String> {
        let hosts = self.hosts();
        let ports = self.ports();
        let paths = self.paths();

        let mut uris = Vec::new();
        for scheme in self.schemes() {
            if hosts.is_empty() {
                uris.push(format!("{}://", scheme));
                continue;
            }
            for host in &hosts {
                let authorities: Vec<String> = if ports.is_empty() {
                    vec![(*host).to_owned()]
                } else {
                    ports.iter().map(|p| format!("{}:{}", host, p)).collect()
                };
                for authority in &authorities {
                    if paths.is_empty() {
                        uris.push(format!("{}://{}", scheme, authority));
                    }
                    for path in &paths {
                        uris.push(format!("{}://{}{}", scheme, authority, path));
                    }
                }
            }
        }
        uris
    }
}

fn distinct<'a, I: Iterator<Item = &'a str>>(values: I) -> Vec<&'a str> {
    let mut result = Vec::new();
    for value in values {
        if !result.contains(&value) {
            result.push(value);
        }
    }
    result
}

/// `<data>` element of an intent filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentData {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
    pub path_prefix: Option<String>,
    pub path_pattern: Option<String>,
    pub mime_type: Option<String>,
}

impl IntentData {
    fn from_element(element: &XmlElement) -> Self {
        let attr = |name: &str| element.attr(name).map(str::to_owned);
        Self {
            scheme: attr("scheme"),
            host: attr("host"),
            port: attr("port"),
            path: attr("path"),
            path_prefix: attr("pathPrefix"),
            path_pattern: attr("pathPattern"),
            mime_type: attr("mimeType"),
        }
    }
}

/// Base protection level of a custom permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProtectionLevel {
    Normal,
    Dangerous,
    Signature,
    SignatureOrSystem,
    Internal,
    /// Unknown protection level, as written in the manifest.
    Other(String),
}

impl ProtectionLevel {
    /// Checks if any application can obtain the permission, at most with user consent.
    pub fn is_attacker_reachable(&self) -> bool {
        matches!(self, Self::Normal | Self::Dangerous)
    }

    fn from_base(base: u32) -> Option<Self> {
        match base {
            0 => Some(Self::Normal),
            1 => Some(Self::Dangerous),
            2 => Some(Self::Signature),
            3 => Some(Self::SignatureOrSystem),
            4 => Some(Self::Internal),
            _ => None,
        }
    }
}

impl Default for ProtectionLevel {
    fn default() -> Self {
        Self::Normal
    }
}

impl FromStr for ProtectionLevel {
    type Err = std::convert::Infallible;

    /// Parses the textual (`signature|privileged`) or the compiled numeric form. Only the base
    /// level is kept.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let numeric = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => s.parse::<u32>().ok(),
        };
        if let Some(level) = numeric.and_then(|n| Self::from_base(n & 0xf)) {
            return Ok(level);
        }

        // Flags such as `instant` or `privileged` can come before the base level.
        Ok(s.split('|')
            .find_map(|flag| match flag.trim() {
                "normal" => Some(Self::Normal),
                "dangerous" => Some(Self::Dangerous),
                "signature" => Some(Self::Signature),
                "signatureOrSystem" => Some(Self::SignatureOrSystem),
                "internal" => Some(Self::Internal),
                _ => None,
            })
            .unwrap_or_else(|| Self::Other(s.to_owned())))
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Dangerous => write!(f, "dangerous"),
            Self::Signature => write!(f, "signature"),
            Self::SignatureOrSystem => write!(f, "signatureOrSystem"),
            Self::Internal => write!(f, "internal"),
            Self::Other(level) => write!(f, "{}", level),
        }
    }
}

/// Custom permission declared with `<permission>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomPermission {
    name: String,
    protection_level: ProtectionLevel,
}

impl CustomPermission {
    pub(super) fn from_element(element: &XmlElement) -> Self {
        Self {
            name: element.attr("name").unwrap_or_default().to_owned(),
            protection_level: element
                .attr("protectionLevel")
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn new<S: Into<String>>(name: S, protection_level: ProtectionLevel) -> Self {
        Self {
            name: name.into(),
            protection_level,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn protection_level(&self) -> &ProtectionLevel {
        &self.protection_level
    }
}

/// `<uses-library>`, `<uses-native-library>` or `<uses-feature>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesEntry {
    name: String,
    required: TriBool,
}

impl UsesEntry {
    pub(super) fn from_element(element: &XmlElement) -> Option<Self> {
        // `<uses-feature android:glEsVersion="…"/>` declares no name.
        let name = element.attr("name").or_else(|| element.attr("glEsVersion"))?;
        Some(Self {
            name: name.to_owned(),
            required: TriBool::from_attr(element.attr("required")),
        })
    }

    pub fn new<S: Into<String>>(name: S, required: TriBool) -> Self {
        Self {
            name: name.into(),
            required,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the entry is mandatory at runtime. Defaults to `true`.
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }
}
