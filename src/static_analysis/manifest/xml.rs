//! Minimal owned XML tree shared by text and binary (AXML) documents.

use crate::error::Kind;
use anyhow::{Context, Result};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::{collections::BTreeMap, str};

/// Magic bytes at the beginning of a compiled binary XML document.
const AXML_MAGIC: [u8; 4] = [0x03, 0x00, 0x08, 0x00];

/// XML element with normalized attribute names.
///
/// Attributes in the `android` namespace (or without namespace) are stored by their local name,
/// so `android:allowBackup` becomes `allowBackup`. Any other prefix is kept: `tools:ignore`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    /// Parses a document, either plain text XML or compiled binary XML.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(&AXML_MAGIC) {
            Self::from_axml(bytes)
        } else {
            let text = str::from_utf8(bytes).context("the XML document is not valid UTF-8")?;
            Self::from_text(text)
        }
    }

    /// Parses a plain text XML document.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        let _ = reader.trim_text(true);

        let mut stack: Vec<Self> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => stack.push(Self::from_start(e)?),
                Event::Empty(ref e) => {
                    let element = Self::from_start(e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(element),
                            None => root = Some(element),
                        }
                    }
                }
                Event::Text(ref t) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        root.ok_or_else(|| {
            Kind::Parse {
                message: "the XML document has no root element".to_owned(),
            }
            .into()
        })
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let tag = str::from_utf8(start.name().as_ref())
            .context("invalid UTF-8 for element name")?
            .to_owned();

        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = str::from_utf8(attr.key.as_ref()).context("invalid UTF-8 for attribute name")?;
            let value = attr.unescape_value()?;
            let _ = attributes.insert(normalize_key(key), value.into_owned());
        }

        Ok(Self {
            tag,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Converts a compiled binary XML document.
    pub fn from_axml(bytes: &[u8]) -> Result<Self> {
        let document = axmldecoder::parse(bytes).map_err(|e| Kind::Parse {
            message: format!("invalid binary XML document: {}", e),
        })?;

        match document.get_root() {
            Some(axmldecoder::Node::Element(root)) => Ok(Self::from_axml_element(root)),
            _ => Err(Kind::Parse {
                message: "the binary XML document has no root element".to_owned(),
            }
            .into()),
        }
    }

    fn from_axml_element(element: &axmldecoder::Element) -> Self {
        let attributes = element
            .get_attributes()
            .iter()
            .map(|(key, value)| (normalize_key(key), decode_axml_value(value)))
            .collect();

        let mut converted = Self {
            tag: element.get_tag().to_owned(),
            attributes,
            children: Vec::new(),
            text: String::new(),
        };
        for node in element.get_children() {
            match node {
                axmldecoder::Node::Element(child) => {
                    converted.children.push(Self::from_axml_element(child))
                }
                axmldecoder::Node::Cdata(cdata) => converted.text.push_str(cdata.get_data().trim()),
            }
        }
        converted
    }

    /// Creates an element, for building trees by hand.
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Adds an attribute, normalizing its name.
    pub fn with_attribute<K: AsRef<str>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        let _ = self
            .attributes
            .insert(normalize_key(key.as_ref()), value.into());
        self
    }

    /// Adds a child element.
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the text content.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Gets the value of an attribute by its normalized name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Iterates over the direct children with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Gets the first direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Trimmed text content of the element.
    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

/// Rewrites a typed value rendered by `axmldecoder` in the syntax of text manifests.
///
/// References come as `ResourceValueType::Reference/<decimal id>` and become `@0x7f0f0001`.
/// Integers typed as hexadecimal come as `0x` followed by *decimal* digits.
fn decode_axml_value(value: &str) -> String {
    let typed = |prefix: &str| {
        value
            .strip_prefix(prefix)
            .and_then(|id| id.parse::<u32>().ok())
    };

    if let Some(id) = typed("ResourceValueType::Reference/") {
        format!("@0x{:08x}", id)
    } else if let Some(id) = typed("ResourceValueType::Attribute/") {
        format!("?0x{:08x}", id)
    } else if let Some(n) = typed("0x") {
        format!("0x{:x}", n)
    } else {
        value.to_owned()
    }
}

/// Normalizes an attribute name, dropping the `android` namespace prefix.
fn normalize_key(key: &str) -> String {
    match key.split_once(':') {
        Some(("android", local)) => local.to_owned(),
        _ => key.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_axml_value, XmlElement};

    #[test]
    fn it_parses_text_documents() {
        let doc = r#"<?xml version="1.0" encoding="utf-8"?>
            <manifest xmlns:android="http://schemas.android.com/apk/res/android"
                xmlns:tools="http://schemas.android.com/tools" package="com.example">
                <application android:allowBackup="false" tools:ignore="AllowBackup">
                    <activity android:name=".Main"/>
                </application>
                <domain includeSubdomains="true">example.com</domain>
            </manifest>"#;

        let root = XmlElement::from_text(doc).unwrap();
        assert_eq!(root.tag(), "manifest");
        assert_eq!(root.attr("package"), Some("com.example"));

        let application = root.child("application").unwrap();
        assert_eq!(application.attr("allowBackup"), Some("false"));
        assert_eq!(application.attr("tools:ignore"), Some("AllowBackup"));
        assert_eq!(application.children_named("activity").count(), 1);

        let domain = root.child("domain").unwrap();
        assert_eq!(domain.text(), "example.com");
        assert_eq!(domain.attr("includeSubdomains"), Some("true"));
    }

    #[test]
    fn it_rejects_empty_documents() {
        assert!(XmlElement::from_text("").is_err());
        assert!(XmlElement::parse(&[0x03, 0x00, 0x08, 0x00, 0x00]).is_err());
    }

    #[test]
    fn it_decodes_axml_values() {
        assert_eq!(
            decode_axml_value("ResourceValueType::Reference/2131951616"),
            "@0x7f130000"
        );
        assert_eq!(
            decode_axml_value("ResourceValueType::Attribute/16842752"),
            "?0x01010000"
        );
        // dangerous|instant
        assert_eq!(decode_axml_value("0x4097"), "0x1001");
        assert_eq!(decode_axml_value("0x18"), "0x12");
        assert_eq!(decode_axml_value("true"), "true");
        assert_eq!(decode_axml_value("23"), "23");
        assert_eq!(decode_axml_value("0xzz"), "0xzz");
        assert_eq!(
            decode_axml_value("ResourceValueType::Float/1065353216"),
            "ResourceValueType::Float/1065353216"
        );
    }

    #[test]
    fn it_builds_by_hand() {
        let element = XmlElement::new("application")
            .with_attribute("android:debuggable", "true")
            .with_child(XmlElement::new("service").with_text("  x  "));
        assert_eq!(element.attr("debuggable"), Some("true"));
        assert_eq!(element.child("service").unwrap().text(), "x");
    }
}
