//! Scalar schema types
//!
//! The smallest XCCDF building blocks: id references, selector/content
//! pairs, localized text, status, version, and notices.

use std::io::Write;

use chrono::NaiveDate;
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::decode::{self, DecodeNode, Scope};
use super::encode::{Attrs, EncodeNode, XmlWriter};
use crate::error::{Result, XccdfError};
use crate::parse::format_xsd_number;

/// Reference to another item by id (`idrefType`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idref {
    /// Referenced id
    pub idref: String,
}

impl Idref {
    pub fn new(idref: impl Into<String>) -> Self {
        Self { idref: idref.into() }
    }

    pub(crate) fn decode(node: Node<'_, '_>, path: &str) -> Result<Self> {
        Ok(Self {
            idref: decode::required_attr(node, "idref", path)?,
        })
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut XmlWriter<W>, name: &str) -> Result<()> {
        w.empty(name, &Attrs::new().with("idref", &self.idref))
    }
}

/// Space-separated list of ids (`idrefListType`, used by `requires`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdrefList {
    pub idrefs: Vec<String>,
}

impl IdrefList {
    pub(crate) fn decode(node: Node<'_, '_>, path: &str) -> Result<Self> {
        let raw = decode::required_attr(node, "idref", path)?;
        Ok(Self {
            idrefs: raw.split_whitespace().map(str::to_string).collect(),
        })
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut XmlWriter<W>, name: &str) -> Result<()> {
        w.empty(name, &Attrs::new().with("idref", self.idrefs.join(" ")))
    }
}

/// Reference by URI (`uriidrefType`, used by `platform`)
///
/// Platform URIs are kept as opaque strings; CPE dictionaries are never
/// consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriRef {
    pub uri: String,
}

impl UriRef {
    pub(crate) fn decode(node: Node<'_, '_>, path: &str) -> Result<Self> {
        Ok(Self {
            uri: decode::required_attr(node, "idref", path)?,
        })
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut XmlWriter<W>, name: &str) -> Result<()> {
        w.empty(name, &Attrs::new().with("idref", &self.uri))
    }
}

/// String content with an optional selector (`selStringType`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelString {
    pub selector: Option<String>,
    pub value: String,
}

impl SelString {
    pub(crate) fn decode(node: Node<'_, '_>) -> Self {
        Self {
            selector: decode::attr_string(node, "selector"),
            value: decode::opaque_text(node),
        }
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut XmlWriter<W>, name: &str) -> Result<()> {
        let attrs = Attrs::new().opt("selector", self.selector.as_deref());
        w.text_element(name, &attrs, &self.value)
    }
}

/// Numeric content with an optional selector (`selNumType`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelNum {
    pub selector: Option<String>,
    pub value: f64,
}

impl SelNum {
    pub(crate) fn decode(node: Node<'_, '_>, path: &str) -> Result<Self> {
        Ok(Self {
            selector: decode::attr_string(node, "selector"),
            value: decode::number_text(node, path)?,
        })
    }

    pub(crate) fn encode<W: Write>(&self, w: &mut XmlWriter<W>, name: &str) -> Result<()> {
        let attrs = Attrs::new().opt("selector", self.selector.as_deref());
        w.text_element(name, &attrs, &format_xsd_number(self.value))
    }
}

/// Localized text with an inheritance override flag
///
/// Used for titles, descriptions, rationales, questions, and fixtext-like
/// content. Rich text (XHTML, `sub` markers) is held opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub lang: Option<String>,
    #[serde(rename = "override")]
    pub override_: Option<bool>,
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub(crate) fn attrs(&self) -> Attrs {
        Attrs::new().lang(self.lang.as_deref()).flag("override", self.override_)
    }
}

impl DecodeNode for Text {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            lang: decode::lang(node),
            override_: decode::bool_attr(node, "override", path)?,
            text: decode::opaque_text(node),
        })
    }
}

impl Text {
    pub(crate) fn encode<W: Write>(&self, w: &mut XmlWriter<W>, name: &str) -> Result<()> {
        w.text_element(name, &self.attrs(), &self.text)
    }

    pub(crate) fn encode_all<W: Write>(items: &[Self], w: &mut XmlWriter<W>, name: &str) -> Result<()> {
        items
            .iter()
            .filter(|t| !t.text.trim().is_empty())
            .try_for_each(|t| t.encode(w, name))
    }
}

/// Free text block carrying a required id (`plain-text`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainText {
    pub id: String,
    pub text: String,
}

impl DecodeNode for PlainText {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            id: decode::required_attr(node, "id", path)?,
            text: decode::opaque_text(node),
        })
    }
}

impl EncodeNode for PlainText {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        w.text_element("plain-text", &Attrs::new().with("id", &self.id), &self.text)
    }
}

/// Legal notice (`notice`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Option<String>,
    pub lang: Option<String>,
    pub text: String,
}

impl DecodeNode for Notice {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, _path: &str) -> Result<Self> {
        Ok(Self {
            id: decode::attr_string(node, "id"),
            lang: decode::lang(node),
            text: decode::opaque_text(node),
        })
    }
}

impl EncodeNode for Notice {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new().opt("id", self.id.as_deref()).lang(self.lang.as_deref());
        w.text_element("notice", &attrs, &self.text)
    }
}

/// Status values the schema enumerates
pub const STATUS_VALUES: [&str; 5] = ["accepted", "deprecated", "draft", "incomplete", "interim"];

/// Document or item status with an optional date (`status`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Raw status value (e.g., "accepted", "draft")
    pub status: String,
    pub date: Option<NaiveDate>,
}

impl Status {
    pub fn new(status: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            status: status.into(),
            date,
        }
    }

    /// Whether the status is one the schema enumerates
    pub fn is_known(&self) -> bool {
        STATUS_VALUES.contains(&self.status.trim())
    }
}

impl DecodeNode for Status {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        let date = decode::attr(node, "date")
            .map(|d| {
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").map_err(|e| {
                    XccdfError::violation(path, format!("@date {:?} is not a date: {}", d, e))
                })
            })
            .transpose()?;
        Ok(Self {
            status: decode::opaque_text(node).trim().to_string(),
            date,
        })
    }
}

impl EncodeNode for Status {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = match self.date {
            Some(date) => Attrs::new().with("date", date.format("%Y-%m-%d").to_string()),
            None => Attrs::new(),
        };
        w.text_element("status", &attrs, &self.status)
    }
}

/// Version string with optional update URI and timestamp (`version`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub value: String,
    pub time: Option<String>,
    pub update: Option<String>,
}

impl Version {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            time: None,
            update: None,
        }
    }
}

impl DecodeNode for Version {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        let value = decode::opaque_text(node).trim().to_string();
        if value.is_empty() {
            return Err(XccdfError::missing(path, "version content"));
        }
        Ok(Self {
            value,
            time: decode::attr_string(node, "time"),
            update: decode::attr_string(node, "update"),
        })
    }
}

impl EncodeNode for Version {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .opt("time", self.time.as_deref())
            .opt("update", self.update.as_deref());
        w.text_element("version", &attrs, &self.value)
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
        T::decode_node(root, &scope, "Benchmark/x")
    }

    #[test]
    fn test_version_requires_content() {
        let v: Version = decode_root(r#"<version time="2024-01-01T00:00:00"> 1 </version>"#).unwrap();
        assert_eq!(v.value, "1");
        assert_eq!(v.time.as_deref(), Some("2024-01-01T00:00:00"));

        let err = decode_root::<Version>("<version>  </version>").unwrap_err();
        assert!(matches!(err, XccdfError::SchemaViolation { .. }));
    }

    #[test]
    fn test_status_date() {
        let s: Status = decode_root(r#"<status date="2023-06-01">accepted</status>"#).unwrap();
        assert_eq!(s.status, "accepted");
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2023, 6, 1));
        assert!(s.is_known());

        assert!(decode_root::<Status>(r#"<status date="June">draft</status>"#).is_err());
    }

    #[test]
    fn test_text_lang_and_override() {
        let xml = r#"<title xml:lang="en-US" override="1">T</title>"#;
        let t: Text = decode_root(xml).unwrap();
        assert_eq!(t.lang.as_deref(), Some("en-US"));
        assert_eq!(t.override_, Some(true));
        assert_eq!(t.text, "T");
    }

    #[test]
    fn test_sel_num_rejects_text() {
        let doc = roxmltree::Document::parse("<lower-bound> abc </lower-bound>").unwrap();
        assert!(SelNum::decode(doc.root_element(), "Value/lower-bound").is_err());

        let doc = roxmltree::Document::parse(r#"<upper-bound selector="s"> 12 </upper-bound>"#).unwrap();
        let n = SelNum::decode(doc.root_element(), "Value/upper-bound").unwrap();
        assert_eq!(n.value, 12.0);
        assert_eq!(n.selector.as_deref(), Some("s"));
    }

    #[test]
    fn test_requires_splits_idrefs() {
        let doc = roxmltree::Document::parse(r#"<requires idref="R-1  R-2"/>"#).unwrap();
        let list = IdrefList::decode(doc.root_element(), "Rule/requires").unwrap();
        assert_eq!(list.idrefs, vec!["R-1", "R-2"]);
    }
}
