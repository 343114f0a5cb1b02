//! Check and ComplexCheck
//!
//! A rule is verified either by one or more `check` elements or by a single
//! `complex-check` combining nested checks with a boolean operator. The
//! schema does not stop a document from carrying both; decoding keeps both
//! so malformed guides stay inspectable, and [`super::Rule`] refuses to
//! encode them.

use std::io::Write;

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::decode::{self, DecodeNode, Scope};
use super::encode::{Attrs, EncodeNode, XmlWriter};
use crate::error::{Result, XccdfError};

/// Pointer to check content held outside the benchmark (`check-content-ref`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckContentRef {
    pub href: String,
    pub name: Option<String>,
}

impl DecodeNode for CheckContentRef {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            href: decode::required_attr(node, "href", path)?,
            name: decode::attr_string(node, "name"),
        })
    }
}

impl EncodeNode for CheckContentRef {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .opt("name", self.name.as_deref())
            .with("href", &self.href);
        w.empty("check-content-ref", &attrs)
    }
}

/// Value imported from the checking engine into results (`check-import`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckImport {
    pub import_name: String,
    pub text: String,
}

impl DecodeNode for CheckImport {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            import_name: decode::required_attr(node, "import-name", path)?,
            text: decode::opaque_text(node),
        })
    }
}

impl EncodeNode for CheckImport {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new().with("import-name", &self.import_name);
        if self.text.is_empty() {
            w.empty("check-import", &attrs)
        } else {
            w.text_element("check-import", &attrs, &self.text)
        }
    }
}

/// Mapping of a benchmark Value into a checking-engine variable (`check-export`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckExport {
    pub value_id: String,
    pub export_name: String,
}

impl DecodeNode for CheckExport {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            value_id: decode::required_attr(node, "value-id", path)?,
            export_name: decode::required_attr(node, "export-name", path)?,
        })
    }
}

impl EncodeNode for CheckExport {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .with("value-id", &self.value_id)
            .with("export-name", &self.export_name);
        w.empty("check-export", &attrs)
    }
}

/// A single check specification (`check`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Checking-system URI (required)
    pub system: String,
    pub id: Option<String>,
    pub selector: Option<String>,
    pub multi_check: Option<bool>,
    pub negate: Option<bool>,
    pub imports: Vec<CheckImport>,
    pub exports: Vec<CheckExport>,
    pub content_refs: Vec<CheckContentRef>,
    /// Inline check content, opaque
    pub content: Option<String>,
}

impl Check {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            ..Default::default()
        }
    }
}

impl DecodeNode for Check {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            system: decode::required_attr(node, "system", path)?,
            id: decode::attr_string(node, "id"),
            selector: decode::attr_string(node, "selector"),
            multi_check: decode::bool_attr(node, "multi-check", path)?,
            negate: decode::bool_attr(node, "negate", path)?,
            imports: decode::decode_all(node, scope, path, "check-import")?,
            exports: decode::decode_all(node, scope, path, "check-export")?,
            content_refs: decode::decode_all(node, scope, path, "check-content-ref")?,
            content: decode::first_child(node, scope, "check-content").map(decode::opaque_text),
        })
    }
}

impl EncodeNode for Check {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        if self.system.trim().is_empty() {
            return Err(XccdfError::missing("check", "@system"));
        }
        let attrs = Attrs::new()
            .with("system", &self.system)
            .opt("id", self.id.as_deref())
            .opt("selector", self.selector.as_deref())
            .flag("multi-check", self.multi_check)
            .flag("negate", self.negate);
        w.start("check", &attrs)?;
        w.all(&self.imports)?;
        w.all(&self.exports)?;
        w.all(&self.content_refs)?;
        w.opt_text_element("check-content", self.content.as_deref())?;
        w.end("check")
    }
}

/// Boolean operator combining the children of a complex check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckOperator {
    #[default]
    And,
    Or,
}

impl CheckOperator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One operand of a complex check, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckNode {
    Check(Check),
    Complex(ComplexCheck),
}

/// Boolean combination of checks (`complex-check`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexCheck {
    pub operator: CheckOperator,
    pub negate: bool,
    pub children: Vec<CheckNode>,
}

impl ComplexCheck {
    pub fn new(operator: CheckOperator, children: Vec<CheckNode>) -> Self {
        Self {
            operator,
            negate: false,
            children,
        }
    }

    /// Every leaf check, depth first
    pub fn leaves(&self) -> Vec<&Check> {
        let mut out = Vec::new();
        for child in &self.children {
            match child {
                CheckNode::Check(c) => out.push(c),
                CheckNode::Complex(cc) => out.extend(cc.leaves()),
            }
        }
        out
    }
}

impl DecodeNode for ComplexCheck {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        let raw_op = decode::required_attr(node, "operator", path)?;
        let operator = CheckOperator::parse(&raw_op).ok_or_else(|| {
            XccdfError::violation(path, format!("@operator must be AND or OR, got {:?}", raw_op))
        })?;

        let mut children = Vec::new();
        for child in node.children().filter(|c| c.is_element() && c.tag_name().namespace() == scope.ns) {
            match child.tag_name().name() {
                "check" => children.push(CheckNode::Check(Check::decode_node(
                    child,
                    scope,
                    &decode::child_path(path, "check", None),
                )?)),
                "complex-check" => children.push(CheckNode::Complex(ComplexCheck::decode_node(
                    child,
                    scope,
                    &decode::child_path(path, "complex-check", None),
                )?)),
                _ => {}
            }
        }

        Ok(Self {
            operator,
            negate: decode::bool_attr(node, "negate", path)?.unwrap_or(false),
            children,
        })
    }
}

impl EncodeNode for ComplexCheck {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .with("operator", self.operator.as_str())
            .flag("negate", self.negate.then_some(true));
        w.start("complex-check", &attrs)?;
        for child in &self.children {
            match child {
                CheckNode::Check(c) => c.encode_node(w)?,
                CheckNode::Complex(cc) => cc.encode_node(w)?,
            }
        }
        w.end("complex-check")
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
        T::decode_node(root, &scope, "Benchmark/Group[id=V-100]/Rule/check")
    }

    #[test]
    fn test_decode_check() {
        let xml = r#"<check system="C-100_chk">
            <check-content-ref name="M" href="Widget-STIG.xml"/>
            <check-content>Verify the widget is configured.</check-content>
        </check>"#;
        let check: Check = decode_root(xml).unwrap();
        assert_eq!(check.system, "C-100_chk");
        assert_eq!(check.content_refs.len(), 1);
        assert_eq!(check.content_refs[0].name.as_deref(), Some("M"));
        assert_eq!(check.content.as_deref(), Some("Verify the widget is configured."));
    }

    #[test]
    fn test_check_system_required() {
        let err = decode_root::<Check>("<check><check-content>x</check-content></check>").unwrap_err();
        assert_eq!(err.path(), Some("Benchmark/Group[id=V-100]/Rule/check"));
    }

    #[test]
    fn test_decode_nested_complex_check() {
        let xml = r#"<complex-check operator="OR" negate="true">
            <check system="urn:a"/>
            <complex-check operator="AND">
                <check system="urn:b"/>
                <check system="urn:c"/>
            </complex-check>
        </complex-check>"#;
        let cc: ComplexCheck = decode_root(xml).unwrap();
        assert_eq!(cc.operator, CheckOperator::Or);
        assert!(cc.negate);
        assert_eq!(cc.children.len(), 2);
        let systems: Vec<&str> = cc.leaves().iter().map(|c| c.system.as_str()).collect();
        assert_eq!(systems, vec!["urn:a", "urn:b", "urn:c"]);
    }

    #[test]
    fn test_complex_check_rejects_unknown_operator() {
        assert!(decode_root::<ComplexCheck>(r#"<complex-check operator="XOR"/>"#).is_err());
    }

    #[test]
    fn test_encode_check_order() {
        let check = Check {
            system: "C-1_chk".to_string(),
            content_refs: vec![CheckContentRef {
                href: "Widget-STIG.xml".to_string(),
                name: Some("M".to_string()),
            }],
            content: Some("Run the audit.".to_string()),
            ..Default::default()
        };
        let mut w = XmlWriter::new(Vec::new());
        check.encode_node(&mut w).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        let r = out.find("check-content-ref").unwrap();
        let c = out.find("<check-content>").unwrap();
        assert!(r < c);
        assert!(out.contains(r#"<check-content-ref name="M" href="Widget-STIG.xml"/>"#));
    }
}
