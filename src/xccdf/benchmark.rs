//! Benchmark aggregate root
//!
//! [`Benchmark::decode`] and [`Benchmark::encode`] are the document-level
//! entry points; everything below the root goes through the per-type
//! [`DecodeNode`]/[`EncodeNode`] impls.
//!
//! # Usage
//!
//! ```ignore
//! use stig_xccdf::{Benchmark, DecodeConfig};
//!
//! let benchmark = Benchmark::decode_with(&bytes, &DecodeConfig::narrow())?;
//! for rule in benchmark.all_rules() {
//!     println!("{} {:?}", rule.id(), rule.severity);
//! }
//! let xml = benchmark.encode()?;
//! ```

use std::collections::HashSet;
use std::io::Write;

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::decode::{self, DecodeNode, Scope};
use super::element::{DublinCore, Reference};
use super::encode::{self, Attrs, EncodeNode, XmlWriter};
use super::item::{Group, Rule, Value, XccdfItem};
use super::model::Model;
use super::namespace;
use super::profile::Profile;
use super::types::{Notice, PlainText, Status, Text, UriRef, Version};
use crate::config::DecodeConfig;
use crate::error::{Result, XccdfError};

const ROOT_PATH: &str = "Benchmark";

/// A complete benchmark document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub id: String,
    pub resolved: Option<bool>,
    pub style: Option<String>,
    pub style_href: Option<String>,
    pub lang: Option<String>,
    pub status: Vec<Status>,
    pub dc_status: Vec<DublinCore>,
    pub title: Vec<Text>,
    pub description: Vec<Text>,
    pub notices: Vec<Notice>,
    pub front_matter: Vec<Text>,
    pub rear_matter: Vec<Text>,
    pub references: Vec<Reference>,
    pub plain_texts: Vec<PlainText>,
    pub platforms: Vec<UriRef>,
    pub version: Version,
    /// Raw metadata blocks
    pub metadata: Vec<String>,
    pub models: Vec<Model>,
    pub profiles: Vec<Profile>,
    pub values: Vec<Value>,
    pub groups: Vec<Group>,
    pub rules: Vec<Rule>,
}

impl Benchmark {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resolved: None,
            style: None,
            style_href: None,
            lang: None,
            status: Vec::new(),
            dc_status: Vec::new(),
            title: Vec::new(),
            description: Vec::new(),
            notices: Vec::new(),
            front_matter: Vec::new(),
            rear_matter: Vec::new(),
            references: Vec::new(),
            plain_texts: Vec::new(),
            platforms: Vec::new(),
            version: Version::new(version),
            metadata: Vec::new(),
            models: Vec::new(),
            profiles: Vec::new(),
            values: Vec::new(),
            groups: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Decode a document with the default (full) configuration
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, &DecodeConfig::default())
    }

    /// Decode a document
    ///
    /// Fails with `XmlMalformed` when the input is over the size limit, not
    /// UTF-8, or not well-formed, and with `SchemaViolation` when a required
    /// field is missing. A partial benchmark is never returned.
    pub fn decode_with(bytes: &[u8], config: &DecodeConfig) -> Result<Self> {
        if bytes.len() > config.max_document_size {
            return Err(XccdfError::malformed(format!(
                "document is {} bytes, limit is {}",
                bytes.len(),
                config.max_document_size
            )));
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|e| XccdfError::malformed(format!("document is not UTF-8: {}", e)))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        if root.tag_name().name() != "Benchmark" {
            return Err(XccdfError::violation(
                ROOT_PATH,
                format!("root element is {}, expected Benchmark", root.tag_name().name()),
            ));
        }
        let ns = root.tag_name().namespace();
        if ns != Some(namespace::XCCDF_1_1) && ns != Some(namespace::XCCDF_1_2) {
            tracing::debug!(namespace = ?ns, "Benchmark root is outside the XCCDF namespaces");
        }

        let scope = Scope::for_root(root, config.profile);
        let benchmark = Self::decode_node(root, &scope, ROOT_PATH)?;

        tracing::debug!(
            id = %benchmark.id,
            profile = %config.profile,
            profiles = benchmark.profiles.len(),
            groups = benchmark.groups.len(),
            rules = benchmark.all_rules().len(),
            "Decoded benchmark"
        );
        Ok(benchmark)
    }

    /// Encode as a standalone UTF-8 document
    pub fn encode(&self) -> Result<Vec<u8>> {
        let out = encode::to_document(self)?;
        tracing::debug!(
            id = %self.id,
            profiles = self.profiles.len(),
            groups = self.groups.len(),
            bytes = out.len(),
            "Encoded benchmark"
        );
        Ok(out)
    }

    /// First non-blank title
    pub fn title(&self) -> Option<&str> {
        self.title.iter().map(|t| t.text.trim()).find(|t| !t.is_empty())
    }

    /// Date of the first dated status
    pub fn status_date(&self) -> Option<chrono::NaiveDate> {
        self.status.iter().find_map(|s| s.date)
    }

    /// Every rule in the benchmark, top-level first, then groups depth first
    pub fn all_rules(&self) -> Vec<&Rule> {
        let mut out: Vec<&Rule> = self.rules.iter().collect();
        for g in &self.groups {
            out.extend(g.all_rules());
        }
        out
    }

    /// Rule by id
    pub fn find_rule(&self, id: &str) -> Option<&Rule> {
        self.all_rules().into_iter().find(|r| r.id() == id)
    }

    /// Ids of rules carrying both a check and a complex-check
    pub fn ambiguous_check_rules(&self) -> Vec<&str> {
        self.all_rules()
            .into_iter()
            .filter(|r| r.has_ambiguous_check())
            .map(|r| r.id())
            .collect()
    }

    /// `(profile id, idref)` for each select naming no Group or Rule
    pub fn dangling_selects(&self) -> Vec<(&str, &str)> {
        let mut ids: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&Group> = self.groups.iter().collect();
        while let Some(g) = stack.pop() {
            ids.insert(g.id());
            ids.extend(g.rules.iter().map(|r| r.id()));
            stack.extend(g.groups.iter());
        }
        ids.extend(self.rules.iter().map(|r| r.id()));

        self.profiles
            .iter()
            .flat_map(|p| p.selects.iter().map(move |s| (p.id.as_str(), s.idref.as_str())))
            .filter(|(_, idref)| !ids.contains(idref))
            .collect()
    }
}

impl DecodeNode for Benchmark {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        let id = decode::required_attr(node, "id", path)?;
        let mut versions: Vec<Version> = decode::decode_all(node, scope, path, "version")?;
        let version = match versions.len() {
            0 => return Err(XccdfError::missing(path, "version")),
            1 => versions.remove(0),
            n => {
                return Err(XccdfError::violation(
                    path,
                    format!("expected exactly one version, found {}", n),
                ))
            }
        };

        let mut benchmark = Self::new(id, "");
        benchmark.version = version;
        benchmark.status = decode::decode_all(node, scope, path, "status")?;
        benchmark.title = decode::decode_all(node, scope, path, "title")?;
        benchmark.description = decode::decode_all(node, scope, path, "description")?;
        benchmark.references = decode::decode_all(node, scope, path, "reference")?;
        benchmark.groups = decode::decode_all(node, scope, path, "Group")?;

        if scope.narrow() {
            return Ok(benchmark);
        }

        benchmark.resolved = decode::bool_attr(node, "resolved", path)?;
        benchmark.style = decode::attr_string(node, "style");
        benchmark.style_href = decode::attr_string(node, "style-href");
        benchmark.lang = decode::lang(node);
        benchmark.dc_status = decode::children(node, scope, "dc-status")
            .map(|n| DublinCore::from_children(n, &decode::child_path(path, "dc-status", None)))
            .collect();
        benchmark.notices = decode::decode_all(node, scope, path, "notice")?;
        benchmark.front_matter = decode::decode_all(node, scope, path, "front-matter")?;
        benchmark.rear_matter = decode::decode_all(node, scope, path, "rear-matter")?;
        benchmark.plain_texts = decode::decode_all(node, scope, path, "plain-text")?;
        benchmark.platforms = decode::children(node, scope, "platform")
            .map(|n| UriRef::decode(n, &decode::child_path(path, "platform", None)))
            .collect::<Result<Vec<_>>>()?;
        benchmark.metadata = decode::children(node, scope, "metadata")
            .map(decode::opaque_text)
            .collect();
        benchmark.models = decode::decode_all(node, scope, path, "model")?;
        benchmark.profiles = decode::decode_all(node, scope, path, "Profile")?;
        benchmark.values = decode::decode_all(node, scope, path, "Value")?;
        benchmark.rules = decode::decode_all(node, scope, path, "Rule")?;

        Ok(benchmark)
    }
}

impl EncodeNode for Benchmark {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(XccdfError::missing(ROOT_PATH, "@id"));
        }
        if self.version.value.trim().is_empty() {
            return Err(XccdfError::missing(ROOT_PATH, "version"));
        }
        let mut attrs = Attrs::new();
        for (name, uri) in namespace::ROOT_DECLARATIONS {
            attrs = attrs.with(name, uri);
        }
        let attrs = attrs
            .with("id", &self.id)
            .lang(self.lang.as_deref())
            .flag("resolved", self.resolved)
            .opt("style", self.style.as_deref())
            .opt("style-href", self.style_href.as_deref())
            .with("xsi:schemaLocation", namespace::SCHEMA_LOCATION)
            .with("xmlns", namespace::XCCDF_1_1);

        w.start("Benchmark", &attrs)?;
        w.all(&self.status)?;
        for dc in self.dc_status.iter().filter(|dc| !dc.is_empty()) {
            w.start("dc-status", &Attrs::new())?;
            dc.write_fields(w)?;
            w.end("dc-status")?;
        }
        Text::encode_all(&self.title, w, "title")?;
        Text::encode_all(&self.description, w, "description")?;
        w.all(&self.notices)?;
        Text::encode_all(&self.front_matter, w, "front-matter")?;
        Text::encode_all(&self.rear_matter, w, "rear-matter")?;
        w.all(&self.references)?;
        w.all(&self.plain_texts)?;
        for p in &self.platforms {
            p.encode(w, "platform")?;
        }
        self.version.encode_node(w)?;
        for m in &self.metadata {
            w.text_element("metadata", &Attrs::new(), m)?;
        }
        w.all(&self.models)?;
        w.all(&self.profiles)?;
        w.all(&self.values)?;
        w.all(&self.groups)?;
        w.all(&self.rules)?;
        w.end("Benchmark")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeProfile;
    use crate::xccdf::profile::Select;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Benchmark xmlns:dc="http://purl.org/dc/elements/1.1/" id="Widget_STIG" xml:lang="en"
    xmlns="http://checklists.nist.gov/xccdf/1.1">
  <status date="2024-03-01">accepted</status>
  <title>Widget Security Technical Implementation Guide</title>
  <description>Widget guidance.</description>
  <notice id="terms-of-use" xml:lang="en"></notice>
  <reference href="https://cyber.mil"><dc:publisher>DISA</dc:publisher></reference>
  <plain-text id="release-info">Release: 1 Benchmark Date: 01 Mar 2024</plain-text>
  <version>1</version>
  <model system="urn:xccdf:scoring:default"/>
  <Profile id="MAC-1_Classified">
    <title>I - Mission Critical Classified</title>
    <select idref="V-100" selected="true"/>
    <select idref="V-999" selected="true"/>
  </Profile>
  <Group id="V-100">
    <title>SRG-APP-000001</title>
    <Rule id="SV-100_rule" severity="high" weight="10.0">
      <version>WIDG-00-000010</version>
      <title>The widget must limit sessions.</title>
      <ident system="http://cyber.mil/cci">CCI-000054</ident>
      <fixtext fixref="F-100_fix">Configure the widget.</fixtext>
      <fix id="F-100_fix"/>
      <check system="C-100_chk"><check-content>Inspect it.</check-content></check>
    </Rule>
  </Group>
</Benchmark>
"#;

    #[test]
    fn test_decode_full() {
        let b = Benchmark::decode(DOC.as_bytes()).unwrap();
        assert_eq!(b.id, "Widget_STIG");
        assert_eq!(b.lang.as_deref(), Some("en"));
        assert_eq!(b.version.value, "1");
        assert_eq!(b.title(), Some("Widget Security Technical Implementation Guide"));
        assert_eq!(b.status_date(), chrono::NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(b.references[0].dc.publisher.as_deref(), Some("DISA"));
        assert_eq!(b.plain_texts[0].id, "release-info");
        assert_eq!(b.models.len(), 1);
        assert_eq!(b.profiles.len(), 1);
        assert_eq!(b.all_rules().len(), 1);
        assert!(b.find_rule("SV-100_rule").is_some());
    }

    #[test]
    fn test_decode_narrow_leaves_profiles_empty() {
        let b = Benchmark::decode_with(DOC.as_bytes(), &DecodeConfig::narrow()).unwrap();
        assert!(b.profiles.is_empty());
        assert!(b.models.is_empty());
        assert!(b.plain_texts.is_empty());
        assert_eq!(b.status_date(), chrono::NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(b.find_rule("SV-100_rule").unwrap().severity.as_deref(), Some("high"));
    }

    #[test]
    fn test_dangling_selects() {
        let b = Benchmark::decode(DOC.as_bytes()).unwrap();
        assert_eq!(b.dangling_selects(), vec![("MAC-1_Classified", "V-999")]);
    }

    #[test]
    fn test_malformed_input() {
        let err = Benchmark::decode(b"<Benchmark id=\"x\"><version>1</version>").unwrap_err();
        assert!(matches!(err, XccdfError::XmlMalformed { .. }));

        let err = Benchmark::decode(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, XccdfError::XmlMalformed { .. }));

        let config = DecodeConfig::builder().max_document_size(16).build();
        let err = Benchmark::decode_with(DOC.as_bytes(), &config).unwrap_err();
        assert!(matches!(err, XccdfError::XmlMalformed { .. }));
    }

    #[test]
    fn test_missing_version_is_violation() {
        let xml = r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.1" id="B"/>"#;
        let err = Benchmark::decode(xml.as_bytes()).unwrap_err();
        assert_eq!(err.path(), Some("Benchmark"));

        let xml = r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.1"><version>1</version></Benchmark>"#;
        let err = Benchmark::decode(xml.as_bytes()).unwrap_err();
        assert_eq!(err.path(), Some("Benchmark"));
    }

    #[test]
    fn test_second_version_is_violation() {
        let xml = r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.1" id="B">
            <version>1</version><version>2</version>
        </Benchmark>"#;
        let err = Benchmark::decode(xml.as_bytes()).unwrap_err();
        assert_eq!(err.path(), Some("Benchmark"));

        let err = Benchmark::decode_with(xml.as_bytes(), &DecodeConfig::narrow()).unwrap_err();
        assert!(matches!(err, XccdfError::SchemaViolation { .. }));
    }

    #[test]
    fn test_encode_rejects_blank_id_and_version() {
        let err = Benchmark::new("", "1").encode().unwrap_err();
        assert_eq!(err.path(), Some("Benchmark"));
        assert!(err.to_string().contains("@id"));

        let err = Benchmark::new("B", " ").encode().unwrap_err();
        assert!(err.to_string().contains("required version is missing"));
    }

    #[test]
    fn test_legacy_ident_in_document() {
        let xml = r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.1" id="B">
            <version>1</version>
            <Group id="V-1234">
              <Rule id="SV-1234_rule" severity="low">
                <ident system="http://cyber.mil/legacy">V-1234</ident>
                <ident system="http://cyber.mil/cci">CCI-000366</ident>
              </Rule>
            </Group>
        </Benchmark>"#;
        let b = Benchmark::decode(xml.as_bytes()).unwrap();
        let rule = b.find_rule("SV-1234_rule").unwrap();
        assert!(rule.idents[0].legacy());
        assert_eq!(rule.idents[0].value, "V-1234");
        assert_eq!(rule.ccis(), vec!["CCI-000366"]);
    }

    #[test]
    fn test_wrong_root_is_violation() {
        let err = Benchmark::decode(b"<Tailoring id=\"t\"/>").unwrap_err();
        assert!(matches!(err, XccdfError::SchemaViolation { .. }));
    }

    #[test]
    fn test_encode_round_trip() {
        let mut b = Benchmark::new("Widget_STIG", "2");
        b.title.push(Text::new("Widget & Gadget STIG"));
        b.status.push(Status::new("accepted", chrono::NaiveDate::from_ymd_opt(2024, 1, 5)));
        let mut profile = Profile::new("MAC-1_Classified", "I - Mission Critical Classified");
        profile.selects.push(Select::new("V-1", true));
        b.profiles.push(profile);
        let mut group = Group::new("V-1");
        group.rules.push(Rule::new("SV-1_rule"));
        b.groups.push(group);

        let bytes = b.encode().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(text.contains(r#"xmlns="http://checklists.nist.gov/xccdf/1.1""#));
        assert!(text.contains(r#"xmlns:dc="http://purl.org/dc/elements/1.1/""#));
        assert!(text.contains("Widget &amp; Gadget STIG"));

        let back = Benchmark::decode(&bytes).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_ambiguous_check_rules() {
        let xml = r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.1" id="B">
            <version>1</version>
            <Rule id="R-1"><check system="a"/><complex-check operator="OR"><check system="b"/></complex-check></Rule>
            <Rule id="R-2"><check system="a"/></Rule>
        </Benchmark>"#;
        let b = Benchmark::decode_with(xml.as_bytes(), &DecodeConfig::builder().profile(DecodeProfile::Full).build()).unwrap();
        assert_eq!(b.ambiguous_check_rules(), vec!["R-1"]);
        assert!(matches!(b.encode(), Err(XccdfError::AmbiguousCheckSpecification { .. })));
    }
}
