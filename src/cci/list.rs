//! DISA CCI list
//!
//! A CCI list maps control-correlation identifiers to the NIST 800-53
//! controls they implement, one reference per NIST revision. The list is
//! loaded once and then only read.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::nist::NistControl;
use crate::error::{Result, XccdfError};

/// Namespace of DISA CCI list documents
pub const CCI_LIST_NAMESPACE: &str = "http://iase.disa.mil/cci";

/// One NIST reference of a CCI item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CciReference {
    pub creator: Option<String>,
    pub title: Option<String>,
    /// NIST revision, e.g. "4"
    pub version: String,
    pub location: Option<String>,
    /// Control index, e.g. "AC-1 a 1"
    pub index: String,
}

impl CciReference {
    pub fn new(version: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            index: index.into(),
            ..Default::default()
        }
    }

    /// Order by version: numeric when both parse, lexical otherwise
    pub fn cmp_version(&self, other: &Self) -> Ordering {
        let (a, b) = (self.version.trim(), other.version.trim());
        match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        }
    }
}

/// One control-correlation identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CciItem {
    pub id: String,
    pub status: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub contributor: Option<String>,
    pub definition: Option<String>,
    pub item_type: Option<String>,
    pub references: Vec<CciReference>,
}

impl CciItem {
    pub fn new(id: impl Into<String>, references: Vec<CciReference>) -> Self {
        Self {
            id: id.into(),
            references,
            ..Default::default()
        }
    }

    /// Reference with the greatest version; the last one wins a tie
    pub fn latest_reference(&self) -> Option<&CciReference> {
        self.references.iter().fold(None, |best, r| match best {
            Some(b) if r.cmp_version(b) == Ordering::Less => Some(b),
            _ => Some(r),
        })
    }

    /// Structured control of the latest reference
    pub fn nist_control(&self) -> Option<NistControl> {
        self.latest_reference().and_then(|r| NistControl::parse(&r.index))
    }
}

/// A loaded CCI list, keyed by CCI id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CciList {
    pub version: Option<String>,
    pub publish_date: Option<NaiveDate>,
    items: BTreeMap<String, CciItem>,
}

impl CciList {
    /// Build a list from items; a later item replaces an earlier one with the same id
    pub fn from_items(items: impl IntoIterator<Item = CciItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
            ..Default::default()
        }
    }

    /// Decode a DISA `cci_list` document
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| XccdfError::malformed(format!("CCI list is not UTF-8: {}", e)))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        if root.tag_name().name() != "cci_list" {
            return Err(XccdfError::violation(
                "cci_list",
                format!("root element is {}, expected cci_list", root.tag_name().name()),
            ));
        }
        let ns = root.tag_name().namespace();
        if ns != Some(CCI_LIST_NAMESPACE) {
            tracing::debug!(namespace = ?ns, "CCI list root is outside the DISA CCI namespace");
        }

        let metadata = child(root, ns, "metadata");
        let mut list = Self {
            version: metadata.and_then(|m| text_of(m, ns, "version")),
            publish_date: metadata
                .map(|m| date_of(m, ns, "cci_list/metadata"))
                .transpose()?
                .flatten(),
            items: BTreeMap::new(),
        };

        let items = child(root, ns, "cci_items");
        for node in items.into_iter().flat_map(|n| children(n, ns, "cci_item")) {
            let item = decode_item(node, ns)?;
            list.items.insert(item.id.clone(), item);
        }

        tracing::debug!(
            version = ?list.version,
            items = list.items.len(),
            "Loaded CCI list"
        );
        Ok(list)
    }

    pub fn get(&self, id: &str) -> Option<&CciItem> {
        self.items.get(id.trim())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in id order
    pub fn iter(&self) -> impl Iterator<Item = &CciItem> {
        self.items.values()
    }

    /// See [`super::resolve`]
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<String>> {
        super::resolve(self, ids)
    }
}

fn children<'a, 'i: 'a>(
    node: Node<'a, 'i>,
    ns: Option<&'a str>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name && c.tag_name().namespace() == ns)
}

fn child<'a, 'i: 'a>(node: Node<'a, 'i>, ns: Option<&'a str>, name: &'a str) -> Option<Node<'a, 'i>> {
    children(node, ns, name).next()
}

fn text_of(node: Node<'_, '_>, ns: Option<&str>, name: &str) -> Option<String> {
    child(node, ns, name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn date_of(node: Node<'_, '_>, ns: Option<&str>, path: &str) -> Result<Option<NaiveDate>> {
    text_of(node, ns, "publishdate")
        .map(|d| {
            NaiveDate::parse_from_str(&d, "%Y-%m-%d").map_err(|e| {
                XccdfError::violation(path, format!("publishdate {:?} is not a date: {}", d, e))
            })
        })
        .transpose()
}

fn decode_item(node: Node<'_, '_>, ns: Option<&str>) -> Result<CciItem> {
    let id = node
        .attribute("id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| XccdfError::missing("cci_list/cci_items/cci_item", "@id"))?
        .to_string();
    let path = format!("cci_list/cci_items/cci_item[id={}]", id);

    let mut references = Vec::new();
    if let Some(refs) = child(node, ns, "references") {
        for r in children(refs, ns, "reference") {
            let attr = |name: &str| r.attribute(name).map(|v| v.trim().to_string());
            let rpath = format!("{}/references/reference", path);
            references.push(CciReference {
                creator: attr("creator"),
                title: attr("title"),
                version: attr("version")
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| XccdfError::missing(rpath.as_str(), "@version"))?,
                location: attr("location"),
                index: attr("index")
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| XccdfError::missing(rpath.as_str(), "@index"))?,
            });
        }
    }

    Ok(CciItem {
        status: text_of(node, ns, "status"),
        publish_date: date_of(node, ns, &path)?,
        contributor: text_of(node, ns, "contributor"),
        definition: text_of(node, ns, "definition"),
        item_type: text_of(node, ns, "type"),
        references,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<cci_list xmlns="http://iase.disa.mil/cci">
  <metadata>
    <version>2022-04-05</version>
    <publishdate>2022-04-05</publishdate>
  </metadata>
  <cci_items>
    <cci_item id="CCI-000001">
      <status>draft</status>
      <publishdate>2009-05-13</publishdate>
      <contributor>DISA FSO</contributor>
      <definition>Develop and document an access control policy.</definition>
      <type>policy</type>
      <references>
        <reference creator="NIST" title="NIST SP 800-53" version="3" location="http://csrc.nist.gov" index="AC-1 a" />
        <reference creator="NIST" title="NIST SP 800-53 Revision 4" version="4" location="http://csrc.nist.gov" index="AC-1" />
      </references>
    </cci_item>
    <cci_item id="CCI-000002">
      <status>draft</status>
      <references>
        <reference version="4" index="AC-1 a 1" />
        <reference version="10" index="AC-1 a 1 (a)" />
      </references>
    </cci_item>
  </cci_items>
</cci_list>"#;

    #[test]
    fn test_decode_list() {
        let list = CciList::decode(LIST.as_bytes()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.version.as_deref(), Some("2022-04-05"));
        assert_eq!(list.publish_date, NaiveDate::from_ymd_opt(2022, 4, 5));

        let item = list.get("CCI-000001").unwrap();
        assert_eq!(item.status.as_deref(), Some("draft"));
        assert_eq!(item.publish_date, NaiveDate::from_ymd_opt(2009, 5, 13));
        assert_eq!(item.item_type.as_deref(), Some("policy"));
        assert_eq!(item.references.len(), 2);
        assert_eq!(item.references[0].creator.as_deref(), Some("NIST"));
    }

    #[test]
    fn test_latest_reference_is_numeric() {
        let list = CciList::decode(LIST.as_bytes()).unwrap();
        let item = list.get("CCI-000002").unwrap();
        assert_eq!(item.latest_reference().unwrap().version, "10");

        let control = item.nist_control().unwrap();
        assert_eq!(control.base_id(), "AC-1");
        assert_eq!(control.enhancements, vec!["a", "1", "a"]);
    }

    #[test]
    fn test_latest_reference_ties_go_last() {
        let item = CciItem::new(
            "CCI-1",
            vec![CciReference::new("4", "AC-1"), CciReference::new("4.0", "AC-2")],
        );
        assert_eq!(item.latest_reference().unwrap().index, "AC-2");
        assert!(CciItem::new("CCI-2", Vec::new()).latest_reference().is_none());
    }

    #[test]
    fn test_lexical_version_fallback() {
        let item = CciItem::new(
            "CCI-1",
            vec![CciReference::new("Rev5", "AC-3"), CciReference::new("Rev4", "AC-1")],
        );
        assert_eq!(item.latest_reference().unwrap().index, "AC-3");
    }

    #[test]
    fn test_reference_requires_index() {
        let xml = r#"<cci_list xmlns="http://iase.disa.mil/cci"><cci_items>
            <cci_item id="CCI-9"><references><reference version="4"/></references></cci_item>
        </cci_items></cci_list>"#;
        let err = CciList::decode(xml.as_bytes()).unwrap_err();
        assert_eq!(err.path(), Some("cci_list/cci_items/cci_item[id=CCI-9]/references/reference"));
    }

    #[test]
    fn test_wrong_root() {
        assert!(CciList::decode(b"<Benchmark/>").is_err());
        assert!(CciList::decode(b"<cci_list").is_err());
    }
}
