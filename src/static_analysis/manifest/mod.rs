//! Typed, read-only view over an `AndroidManifest.xml` file.

mod component;
mod resource;
mod resource_table;
pub mod xml;

pub use self::{
    component::{
        Component, ComponentKind, CustomPermission, IntentData, IntentFilter, ProtectionLevel,
        UsesEntry, ACTION_VIEW, CATEGORY_BROWSABLE,
    },
    resource::ResourceRef,
    resource_table::{ResourceTable, TableEntry},
    xml::XmlElement,
};

use crate::error::Kind;
use anyhow::Result;
use log::warn;
use serde::{Serialize, Serializer};
use std::fmt;

/// Three-valued manifest boolean.
///
/// `Unset` means the attribute is absent and the platform default applies. That default is rule
/// specific and often depends on the API level, so it must never be read as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriBool {
    True,
    False,
    Unset,
}

impl TriBool {
    /// Reads an optional attribute value. Anything but `true` or `false` is `Unset`.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("true") => Self::True,
            Some("false") => Self::False,
            _ => Self::Unset,
        }
    }

    pub fn is_true(self) -> bool {
        self == Self::True
    }

    pub fn is_false(self) -> bool {
        self == Self::False
    }

    pub fn is_unset(self) -> bool {
        self == Self::Unset
    }

    /// Gets the declared value, if any.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unset => None,
        }
    }

    /// Gets the declared value, or the given default when unset.
    pub fn unwrap_or(self, default: bool) -> bool {
        self.as_option().unwrap_or(default)
    }
}

impl Default for TriBool {
    fn default() -> Self {
        Self::Unset
    }
}

impl From<bool> for TriBool {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl Serialize for TriBool {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_option().serialize(serializer)
    }
}

impl fmt::Display for TriBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Unset => write!(f, "unset"),
        }
    }
}

/// Versions declared in `<uses-sdk>`. Absent or unparseable values are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsesSdk {
    pub min: Option<u32>,
    pub target: Option<u32>,
    pub max: Option<u32>,
}

impl UsesSdk {
    fn from_element(element: &XmlElement) -> Self {
        let version = |name: &str| {
            element.attr(name).and_then(|v| match v.trim().parse::<u32>() {
                Ok(version) => Some(version),
                Err(e) => {
                    warn!(
                        "the `{}` attribute in the manifest is not a valid API level ({}): {}",
                        name, v, e
                    );
                    None
                }
            })
        };

        Self {
            min: version("minSdkVersion"),
            target: version("targetSdkVersion"),
            max: version("maxSdkVersion"),
        }
    }
}

/// Security relevant attributes of the `<application>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Application {
    pub allow_backup: TriBool,
    pub full_backup_only: TriBool,
    pub debuggable: TriBool,
    pub uses_cleartext_traffic: TriBool,
    pub backup_agent: Option<String>,
    pub full_backup_content: Option<ResourceRef>,
    pub data_extraction_rules: Option<ResourceRef>,
    pub network_security_config: Option<ResourceRef>,
    pub permission: Option<String>,
    pub label: Option<ResourceRef>,
}

impl Application {
    fn from_element(element: &XmlElement) -> Self {
        let reference = |name: &str| element.attr(name).map(ResourceRef::resolve);
        Self {
            allow_backup: TriBool::from_attr(element.attr("allowBackup")),
            full_backup_only: TriBool::from_attr(element.attr("fullBackupOnly")),
            debuggable: TriBool::from_attr(element.attr("debuggable")),
            uses_cleartext_traffic: TriBool::from_attr(element.attr("usesCleartextTraffic")),
            backup_agent: element
                .attr("backupAgent")
                .filter(|a| !a.trim().is_empty())
                .map(str::to_owned),
            full_backup_content: reference("fullBackupContent"),
            data_extraction_rules: reference("dataExtractionRules"),
            network_security_config: reference("networkSecurityConfig"),
            permission: element.attr("permission").map(str::to_owned),
            label: reference("label"),
        }
    }
}

/// Manifest representation.
///
/// Built once per analyzed package, and never modified by the analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    package: String,
    version_code: Option<String>,
    version_name: Option<String>,
    uses_sdk: UsesSdk,
    application: Application,
    uses_permissions: Vec<String>,
    permissions: Vec<CustomPermission>,
    uses_libraries: Vec<UsesEntry>,
    uses_native_libraries: Vec<UsesEntry>,
    uses_features: Vec<UsesEntry>,
    components: Vec<Component>,
}

impl Manifest {
    /// Parses a manifest, either plain text or compiled binary XML.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::from_element(&XmlElement::parse(bytes)?)
    }

    /// Parses a plain text manifest.
    pub fn from_xml_str(code: &str) -> Result<Self> {
        Self::from_element(&XmlElement::from_text(code)?)
    }

    /// Builds the manifest view from its XML tree.
    pub fn from_element(root: &XmlElement) -> Result<Self> {
        if root.tag() != "manifest" {
            return Err(Kind::Parse {
                message: format!(
                    "the root element of the manifest is `{}`, expected `manifest`",
                    root.tag()
                ),
            }
            .into());
        }

        let mut manifest = Self {
            package: root.attr("package").unwrap_or_default().to_owned(),
            version_code: root.attr("versionCode").map(str::to_owned),
            version_name: root.attr("versionName").map(str::to_owned),
            ..Self::default()
        };

        for element in root.children() {
            match element.tag() {
                "uses-sdk" => manifest.uses_sdk = UsesSdk::from_element(element),
                "uses-permission" | "uses-permission-sdk-23" => {
                    if let Some(name) = element.attr("name") {
                        manifest.uses_permissions.push(name.to_owned());
                    }
                }
                "permission" => manifest
                    .permissions
                    .push(CustomPermission::from_element(element)),
                "uses-feature" => manifest
                    .uses_features
                    .extend(UsesEntry::from_element(element)),
                "application" => manifest.load_application(element),
                _ => {}
            }
        }

        Ok(manifest)
    }

    fn load_application(&mut self, element: &XmlElement) {
        self.application = Application::from_element(element);

        for child in element.children() {
            match child.tag() {
                "uses-library" => self.uses_libraries.extend(UsesEntry::from_element(child)),
                "uses-native-library" => self
                    .uses_native_libraries
                    .extend(UsesEntry::from_element(child)),
                tag => {
                    if let Some(kind) = ComponentKind::from_tag(tag) {
                        self.components.push(Component::from_element(kind, child));
                    }
                }
            }
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn set_package<S: Into<String>>(&mut self, package: S) {
        self.package = package.into();
    }

    pub fn version_code(&self) -> Option<&str> {
        self.version_code.as_deref()
    }

    pub fn version_name(&self) -> Option<&str> {
        self.version_name.as_deref()
    }

    pub fn uses_sdk(&self) -> UsesSdk {
        self.uses_sdk
    }

    pub fn set_uses_sdk(&mut self, uses_sdk: UsesSdk) {
        self.uses_sdk = uses_sdk;
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn application_mut(&mut self) -> &mut Application {
        &mut self.application
    }

    /// Maps the numeric references of a compiled manifest through the resource table.
    pub fn resolve_references(&mut self, table: &ResourceTable) {
        let application = &mut self.application;
        for reference in [
            &mut application.full_backup_content,
            &mut application.data_extraction_rules,
            &mut application.network_security_config,
            &mut application.label,
        ]
        .into_iter()
        .flatten()
        {
            *reference = table.resolve(reference);
        }
    }

    /// Checks if any application reference is a numeric one of a compiled manifest.
    pub fn has_compiled_references(&self) -> bool {
        let application = &self.application;
        [
            &application.full_backup_content,
            &application.data_extraction_rules,
            &application.network_security_config,
            &application.label,
        ]
        .into_iter()
        .flatten()
        .any(|r| r.id().is_some())
    }

    /// Builtin or third party permissions requested with `<uses-permission>`.
    pub fn uses_permissions(&self) -> &[String] {
        &self.uses_permissions
    }

    pub fn add_uses_permission<S: Into<String>>(&mut self, permission: S) {
        self.uses_permissions.push(permission.into());
    }

    /// Custom permissions declared with `<permission>`.
    pub fn permissions(&self) -> &[CustomPermission] {
        &self.permissions
    }

    pub fn add_permission(&mut self, permission: CustomPermission) {
        self.permissions.push(permission);
    }

    pub fn uses_libraries(&self) -> &[UsesEntry] {
        &self.uses_libraries
    }

    pub fn uses_native_libraries(&self) -> &[UsesEntry] {
        &self.uses_native_libraries
    }

    pub fn uses_features(&self) -> &[UsesEntry] {
        &self.uses_features
    }

    pub fn add_uses_library(&mut self, entry: UsesEntry) {
        self.uses_libraries.push(entry);
    }

    pub fn add_uses_native_library(&mut self, entry: UsesEntry) {
        self.uses_native_libraries.push(entry);
    }

    pub fn add_uses_feature(&mut self, entry: UsesEntry) {
        self.uses_features.push(entry);
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Components of the given kind, in declaration order.
    pub fn components_of(&self, kind: ComponentKind) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(move |c| c.kind() == kind)
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }
}
