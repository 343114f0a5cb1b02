//! Node-level decoding helpers
//!
//! Every model type decodes through [`DecodeNode::decode_node`], one visible
//! function per type. The helpers here do the namespace-aware child lookup,
//! attribute parsing, and element-path bookkeeping those functions share.

use roxmltree::Node;

use super::namespace;
use crate::config::DecodeProfile;
use crate::error::{Result, XccdfError};
use crate::parse::{parse_xsd_bool, parse_xsd_number};

/// Decoding scope shared by every node of one document
#[derive(Debug, Clone, Copy)]
pub struct Scope<'s> {
    /// Namespace of the benchmark root; XCCDF children must match it
    pub ns: Option<&'s str>,

    /// Which fields to read
    pub profile: DecodeProfile,
}

impl<'s> Scope<'s> {
    /// Scope for a document whose root element is `root`
    pub fn for_root(root: Node<'s, '_>, profile: DecodeProfile) -> Self {
        Self {
            ns: root.tag_name().namespace(),
            profile,
        }
    }

    /// True when only the legacy subset is being read
    pub fn narrow(&self) -> bool {
        matches!(self.profile, DecodeProfile::Narrow)
    }
}

/// Decode a model type from its XML element
pub trait DecodeNode: Sized {
    /// Decode `node`, reporting violations against `path`
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self>;
}

/// Element children of `node` named `name` in the scope's namespace
pub fn children<'a, 'i: 'a>(
    node: Node<'a, 'i>,
    scope: &'a Scope<'a>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.children().filter(move |c| {
        c.is_element() && c.tag_name().name() == name && c.tag_name().namespace() == scope.ns
    })
}

/// First element child named `name` in the scope's namespace
pub fn first_child<'a, 'i: 'a>(
    node: Node<'a, 'i>,
    scope: &'a Scope<'a>,
    name: &'a str,
) -> Option<Node<'a, 'i>> {
    children(node, scope, name).next()
}

/// Decode every child named `name` into `T`
pub fn decode_all<T: DecodeNode>(
    node: Node<'_, '_>,
    scope: &Scope<'_>,
    path: &str,
    name: &str,
) -> Result<Vec<T>> {
    children(node, scope, name)
        .map(|child| T::decode_node(child, scope, &child_path(path, name, None)))
        .collect()
}

/// Decode the first child named `name` into `T`, if present
pub fn decode_first<T: DecodeNode>(
    node: Node<'_, '_>,
    scope: &Scope<'_>,
    path: &str,
    name: &str,
) -> Result<Option<T>> {
    first_child(node, scope, name)
        .map(|child| T::decode_node(child, scope, &child_path(path, name, None)))
        .transpose()
}

/// Element text, kept opaque
///
/// Pure text content is unescaped. Mixed content (embedded XHTML, `sub`
/// markers) is returned as the raw source between the element's tags so
/// nothing is lost or substituted.
pub fn opaque_text(node: Node<'_, '_>) -> String {
    if node.children().any(|c| c.is_element()) {
        match (node.first_child(), node.last_child()) {
            (Some(first), Some(last)) => {
                node.document().input_text()[first.range().start..last.range().end].to_string()
            }
            _ => String::new(),
        }
    } else {
        node.children()
            .filter(|c| c.is_text())
            .filter_map(|c| c.text())
            .collect()
    }
}

/// Trimmed text of the first child named `name`, if present and non-blank
pub fn child_text(node: Node<'_, '_>, scope: &Scope<'_>, name: &str) -> Option<String> {
    first_child(node, scope, name)
        .map(opaque_text)
        .filter(|t| !t.trim().is_empty())
}

/// Attribute value, if present
pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name)
}

/// Owned attribute value, if present
pub fn attr_string(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

/// `xml:lang` attribute, if present
pub fn lang(node: Node<'_, '_>) -> Option<String> {
    node.attribute((namespace::XML, "lang")).map(str::to_string)
}

/// Attribute the schema requires to be present and non-blank
pub fn required_attr(node: Node<'_, '_>, name: &str, path: &str) -> Result<String> {
    match node.attribute(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(XccdfError::missing(path, &format!("@{}", name))),
    }
}

/// Optional `xsd:boolean` attribute
pub fn bool_attr(node: Node<'_, '_>, name: &str, path: &str) -> Result<Option<bool>> {
    node.attribute(name)
        .map(|v| {
            parse_xsd_bool(v).ok_or_else(|| {
                XccdfError::violation(path, format!("@{} is not a boolean: {:?}", name, v))
            })
        })
        .transpose()
}

/// Optional numeric attribute; surrounding whitespace is ignored
pub fn number_attr(node: Node<'_, '_>, name: &str, path: &str) -> Result<Option<f64>> {
    node.attribute(name)
        .map(|v| {
            parse_xsd_number(v).ok_or_else(|| {
                XccdfError::violation(path, format!("@{} is not numeric: {:?}", name, v))
            })
        })
        .transpose()
}

/// Numeric element content; surrounding whitespace is ignored
pub fn number_text(node: Node<'_, '_>, path: &str) -> Result<f64> {
    let text = opaque_text(node);
    parse_xsd_number(&text)
        .ok_or_else(|| XccdfError::violation(path, format!("content is not numeric: {:?}", text)))
}

/// Path of a child element, with its id when known
///
/// `child_path("Benchmark", "Group", Some("V-100"))` is
/// `Benchmark/Group[id=V-100]`.
pub fn child_path(parent: &str, name: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{}/{}[id={}]", parent, name, id),
        None => format!("{}/{}", parent, name),
    }
}

/// Path of an element once its id is known
pub fn with_id(path: &str, id: &str) -> String {
    format!("{}[id={}]", path, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_root<T>(xml: &str, f: impl FnOnce(Node<'_, '_>, &Scope<'_>) -> T) -> T {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        let scope = Scope::for_root(root, DecodeProfile::Full);
        f(root, &scope)
    }

    #[test]
    fn test_children_match_root_namespace() {
        let xml = r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.1"
            xmlns:other="urn:other">
            <title>a</title><other:title>b</other:title><title>c</title>
        </Benchmark>"#;
        with_root(xml, |root, scope| {
            let titles: Vec<String> = children(root, scope, "title").map(opaque_text).collect();
            assert_eq!(titles, vec!["a", "c"]);
        });
    }

    #[test]
    fn test_opaque_text_keeps_markup() {
        let xml = r#"<Benchmark xmlns="http://checklists.nist.gov/xccdf/1.1"
            xmlns:xhtml="http://www.w3.org/1999/xhtml">
            <description>Set <sub idref="var_x"/> to &lt;5 <xhtml:b>now</xhtml:b></description>
            <title>A &amp; B</title>
        </Benchmark>"#;
        with_root(xml, |root, scope| {
            let desc = opaque_text(first_child(root, scope, "description").unwrap());
            assert_eq!(desc, r#"Set <sub idref="var_x"/> to &lt;5 <xhtml:b>now</xhtml:b>"#);
            let title = opaque_text(first_child(root, scope, "title").unwrap());
            assert_eq!(title, "A & B");
        });
    }

    #[test]
    fn test_required_attr_blank_is_violation() {
        with_root(r#"<Benchmark id="  "/>"#, |root, _| {
            let err = required_attr(root, "id", "Benchmark").unwrap_err();
            assert_eq!(err.path(), Some("Benchmark"));
        });
    }

    #[test]
    fn test_number_attr_trims_and_rejects() {
        with_root(r#"<Rule weight=" 10.0 " bad="x"/>"#, |root, _| {
            assert_eq!(number_attr(root, "weight", "Rule").unwrap(), Some(10.0));
            assert!(number_attr(root, "bad", "Rule").is_err());
            assert_eq!(number_attr(root, "missing", "Rule").unwrap(), None);
        });
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("Benchmark", "Group", Some("V-100")), "Benchmark/Group[id=V-100]");
        assert_eq!(child_path("Benchmark/Group[id=V-100]", "Rule", None), "Benchmark/Group[id=V-100]/Rule");
    }
}
