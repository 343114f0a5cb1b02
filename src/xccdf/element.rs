//! Small element types: Ident, Reference, Warning, profile notes, metadata

use std::io::Write;

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::decode::{self, DecodeNode, Scope};
use super::encode::{Attrs, EncodeNode, XmlWriter};
use super::namespace;
use crate::error::{Result, XccdfError};

/// Identifier in an external naming scheme (`ident`)
///
/// STIG rules carry their CCI here (`system="http://cyber.mil/cci"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    /// Naming-scheme URI (required)
    pub system: String,
    pub value: String,
}

impl Ident {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            value: value.into(),
        }
    }

    /// CCI ident as written by the STIG export
    pub fn cci(value: impl Into<String>) -> Self {
        Self::new(namespace::CCI_IDENT_SYSTEM, value)
    }

    /// Whether the ident uses the legacy (pre-CCI) naming scheme
    pub fn legacy(&self) -> bool {
        self.system == namespace::LEGACY_IDENT_SYSTEM
    }

    /// Whether the ident is a control-correlation identifier
    pub fn is_cci(&self) -> bool {
        self.system == namespace::CCI_IDENT_SYSTEM
    }
}

impl DecodeNode for Ident {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            system: decode::required_attr(node, "system", path)?,
            value: decode::opaque_text(node).trim().to_string(),
        })
    }
}

impl EncodeNode for Ident {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        if self.system.trim().is_empty() {
            return Err(XccdfError::missing("ident", "@system"));
        }
        w.text_element("ident", &Attrs::new().with("system", &self.system), &self.value)
    }
}

/// Dublin Core metadata carried by a reference
///
/// Fields are written in the order DISA benchmarks use: title, publisher,
/// type, subject, identifier, then the remaining elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DublinCore {
    pub title: Option<String>,
    pub publisher: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub subject: Option<String>,
    pub identifier: Option<String>,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub contributor: Option<String>,
    pub date: Option<String>,
    pub format: Option<String>,
    pub source: Option<String>,
    pub language: Option<String>,
    pub relation: Option<String>,
    pub coverage: Option<String>,
    pub rights: Option<String>,
}

impl DublinCore {
    /// Element names paired with their values, in write order
    pub fn fields(&self) -> [(&'static str, Option<&str>); 15] {
        [
            ("title", self.title.as_deref()),
            ("publisher", self.publisher.as_deref()),
            ("type", self.type_.as_deref()),
            ("subject", self.subject.as_deref()),
            ("identifier", self.identifier.as_deref()),
            ("creator", self.creator.as_deref()),
            ("description", self.description.as_deref()),
            ("contributor", self.contributor.as_deref()),
            ("date", self.date.as_deref()),
            ("format", self.format.as_deref()),
            ("source", self.source.as_deref()),
            ("language", self.language.as_deref()),
            ("relation", self.relation.as_deref()),
            ("coverage", self.coverage.as_deref()),
            ("rights", self.rights.as_deref()),
        ]
    }

    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        Some(match name {
            "title" => &mut self.title,
            "publisher" => &mut self.publisher,
            "type" => &mut self.type_,
            "subject" => &mut self.subject,
            "identifier" => &mut self.identifier,
            "creator" => &mut self.creator,
            "description" => &mut self.description,
            "contributor" => &mut self.contributor,
            "date" => &mut self.date,
            "format" => &mut self.format,
            "source" => &mut self.source,
            "language" => &mut self.language,
            "relation" => &mut self.relation,
            "coverage" => &mut self.coverage,
            "rights" => &mut self.rights,
            _ => return None,
        })
    }

    /// Read the Dublin Core children of `node`; the first of each name wins
    pub(crate) fn from_children(node: Node<'_, '_>, path: &str) -> Self {
        let mut dc = Self::default();
        for child in node.children().filter(|c| c.is_element()) {
            let name = child.tag_name().name();
            if child.tag_name().namespace() != Some(namespace::DC) {
                tracing::debug!(
                    path = %path,
                    element = name,
                    namespace = ?child.tag_name().namespace(),
                    "Ignoring child outside the Dublin Core namespace"
                );
                continue;
            }
            if let Some(slot) = dc.slot(name) {
                if slot.is_none() {
                    *slot = Some(decode::opaque_text(child).trim().to_string());
                }
            }
        }
        dc
    }

    /// Write each non-blank field as a `dc:` element
    pub(crate) fn write_fields<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        for (name, value) in self.fields() {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                w.text_element(&format!("dc:{}", name), &Attrs::new(), v)?;
            }
        }
        Ok(())
    }

    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.map_or(true, |v| v.trim().is_empty()))
    }
}

/// Bibliographic reference (`reference`)
///
/// Either free text or a set of Dublin Core fields. `override_` manages
/// inheritance between a generic guide and a derived benchmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub href: Option<String>,
    #[serde(rename = "override")]
    pub override_: Option<bool>,
    pub dc: DublinCore,
    /// Free-text content when no Dublin Core fields are present
    pub text: Option<String>,
}

impl DecodeNode for Reference {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        let has_elements = node.children().any(|c| c.is_element());
        let text = if has_elements {
            None
        } else {
            Some(decode::opaque_text(node).trim().to_string()).filter(|t| !t.is_empty())
        };

        Ok(Self {
            href: decode::attr_string(node, "href"),
            override_: decode::bool_attr(node, "override", path)?,
            dc: DublinCore::from_children(node, path),
            text,
        })
    }
}

impl EncodeNode for Reference {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .opt("href", self.href.as_deref())
            .flag("override", self.override_);

        if self.dc.is_empty() {
            return match self.text.as_deref() {
                Some(t) if !t.trim().is_empty() => w.text_element("reference", &attrs, t),
                _ => w.empty("reference", &attrs),
            };
        }

        w.start("reference", &attrs)?;
        self.dc.write_fields(w)?;
        w.end("reference")
    }
}

/// Warning attached to an item (`warning`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// functionality, performance, hardware, legal, regulatory, management,
    /// audit, dependency, or general
    pub category: Option<String>,
    pub lang: Option<String>,
    pub text: String,
}

impl DecodeNode for Warning {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, _path: &str) -> Result<Self> {
        Ok(Self {
            category: decode::attr_string(node, "category"),
            lang: decode::lang(node),
            text: decode::opaque_text(node),
        })
    }
}

impl EncodeNode for Warning {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .opt("category", self.category.as_deref())
            .lang(self.lang.as_deref());
        w.text_element("warning", &attrs, &self.text)
    }
}

/// Profile-specific note on a rule (`profile-note`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileNote {
    pub tag: String,
    pub lang: Option<String>,
    pub text: String,
}

impl DecodeNode for ProfileNote {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            tag: decode::required_attr(node, "tag", path)?,
            lang: decode::lang(node),
            text: decode::opaque_text(node),
        })
    }
}

impl EncodeNode for ProfileNote {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new().with("tag", &self.tag).lang(self.lang.as_deref());
        w.text_element("profile-note", &attrs, &self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeProfile;

    fn decode_root<T: DecodeNode>(xml: &str) -> Result<T> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        let scope = Scope::for_root(root, DecodeProfile::Full);
        T::decode_node(root, &scope, "Benchmark/Group/Rule/x")
    }

    #[test]
    fn test_legacy_ident() {
        let ident: Ident = decode_root(r#"<ident system="http://cyber.mil/legacy">V-1234</ident>"#).unwrap();
        assert!(ident.legacy());
        assert!(!ident.is_cci());
        assert_eq!(ident.value, "V-1234");

        let cci = Ident::cci("CCI-000366");
        assert!(!cci.legacy());
        assert!(cci.is_cci());
    }

    #[test]
    fn test_ident_requires_system() {
        let err = decode_root::<Ident>("<ident>CCI-000366</ident>").unwrap_err();
        assert_eq!(err.path(), Some("Benchmark/Group/Rule/x"));
    }

    #[test]
    fn test_ident_encode_requires_system() {
        let mut w = XmlWriter::new(Vec::new());
        let err = Ident::new(" ", "CCI-000366").encode_node(&mut w).unwrap_err();
        assert_eq!(err.path(), Some("ident"));

        Ident::cci("CCI-000366").encode_node(&mut w).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert_eq!(out, r#"<ident system="http://cyber.mil/cci">CCI-000366</ident>"#);
    }

    #[test]
    fn test_reference_dublin_core() {
        let xml = r#"<reference href="https://cyber.mil" xmlns:dc="http://purl.org/dc/elements/1.1/">
            <dc:title>DPMS Target Widget</dc:title>
            <dc:publisher>DISA</dc:publisher>
            <dc:identifier>1234</dc:identifier>
        </reference>"#;
        let r: Reference = decode_root(xml).unwrap();
        assert_eq!(r.href.as_deref(), Some("https://cyber.mil"));
        assert_eq!(r.dc.title.as_deref(), Some("DPMS Target Widget"));
        assert_eq!(r.dc.publisher.as_deref(), Some("DISA"));
        assert_eq!(r.dc.identifier.as_deref(), Some("1234"));
        assert!(r.text.is_none());
    }

    #[test]
    fn test_reference_wrong_dc_namespace_is_blank() {
        let xml = r#"<reference xmlns:dc="http://purl.org/dc/terms/">
            <dc:title>Misdeclared</dc:title>
        </reference>"#;
        let r: Reference = decode_root(xml).unwrap();
        assert!(r.dc.is_empty());
        assert!(r.text.is_none());
    }

    #[test]
    fn test_reference_encode_skips_blank_fields() {
        let r = Reference {
            href: Some("https://cyber.mil".to_string()),
            dc: DublinCore {
                title: Some("DPMS Target Widget".to_string()),
                subject: Some("  ".to_string()),
                publisher: Some("DISA".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut w = XmlWriter::new(Vec::new());
        r.encode_node(&mut w).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert!(out.contains("<dc:title>DPMS Target Widget</dc:title>"));
        assert!(out.contains("<dc:publisher>DISA</dc:publisher>"));
        assert!(!out.contains("dc:subject"));
        assert!(out.find("dc:title").unwrap() < out.find("dc:publisher").unwrap());
    }
}
