//! Resource reference resolution.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

lazy_static! {
    /// `@[package:]type/name` reference syntax.
    static ref REFERENCE: Regex =
        Regex::new(r"^@\+?(?:(?P<package>[\w.]+):)?(?P<type>\w+)/(?P<name>[\w.]+)$")
            .expect("invalid resource reference regex");
}

/// Resolved value of a manifest attribute that may point to a resource.
///
/// Resolution never fails: references that cannot be mapped to a file are kept as they were
/// written, so the analysis can still report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResourceRef {
    /// `@xml/…` or `@raw/…` reference, resolved to its path inside the package.
    File(String),
    /// `@string/…` reference. The value depends on the device configuration, and can only be
    /// resolved with the resource table.
    DeferredString(String),
    /// Any other reference, including numeric references of compiled manifests.
    Unresolved(String),
    /// Plain value, not a reference.
    Literal(String),
}

impl ResourceRef {
    /// Resolves an attribute value.
    pub fn resolve(value: &str) -> Self {
        if !value.starts_with('@') {
            return Self::Literal(value.to_owned());
        }

        let caps = match REFERENCE.captures(value) {
            Some(caps) => caps,
            None => return Self::Unresolved(value.to_owned()),
        };
        // Framework resources are not shipped in the package.
        if caps.name("package").is_some() {
            return Self::Unresolved(value.to_owned());
        }

        let name = &caps["name"];
        match &caps["type"] {
            "xml" => Self::File(format!("res/xml/{}.xml", name)),
            "raw" => Self::File(format!("res/raw/{}", name)),
            "string" => Self::DeferredString(name.to_owned()),
            _ => Self::Unresolved(value.to_owned()),
        }
    }

    /// Path of the referenced file inside the package, if resolved.
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::File(path) => Some(path),
            _ => None,
        }
    }

    /// Identifier of a numeric reference of a compiled manifest: `@0x7f130000` or `@7F130000`.
    pub fn id(&self) -> Option<u32> {
        match self {
            Self::Unresolved(value) => {
                let hex = value.strip_prefix('@')?;
                let hex = hex.strip_prefix("0x").unwrap_or(hex);
                u32::from_str_radix(hex, 16).ok()
            }
            _ => None,
        }
    }

    /// Checks if the value references a resource, resolved or not.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path),
            Self::DeferredString(name) => write!(f, "@string/{}", name),
            Self::Unresolved(value) | Self::Literal(value) => write!(f, "{}", value),
        }
    }
}
