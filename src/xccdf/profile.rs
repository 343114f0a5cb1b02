//! Profiles and their tailoring selectors

use std::io::Write;

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::decode::{self, DecodeNode, Scope};
use super::element::Reference;
use super::encode::{Attrs, EncodeNode, XmlWriter};
use super::types::{Status, Text, UriRef, Version};
use crate::error::{Result, XccdfError};

/// Selects or deselects a Group/Rule for a profile (`select`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Select {
    pub idref: String,
    pub selected: bool,
}

impl Select {
    pub fn new(idref: impl Into<String>, selected: bool) -> Self {
        Self {
            idref: idref.into(),
            selected,
        }
    }
}

impl DecodeNode for Select {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            idref: decode::required_attr(node, "idref", path)?,
            selected: decode::bool_attr(node, "selected", path)?
                .ok_or_else(|| XccdfError::missing(path, "@selected"))?,
        })
    }
}

impl EncodeNode for Select {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .with("idref", &self.idref)
            .flag("selected", Some(self.selected));
        w.empty("select", &attrs)
    }
}

/// Overrides a Value for a profile (`set-value`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetValue {
    pub idref: String,
    pub value: String,
}

impl DecodeNode for SetValue {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            idref: decode::required_attr(node, "idref", path)?,
            value: decode::opaque_text(node),
        })
    }
}

impl EncodeNode for SetValue {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        w.text_element("set-value", &Attrs::new().with("idref", &self.idref), &self.value)
    }
}

/// Adjusts a Rule's weight, severity, role, or check selector (`refine-rule`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineRule {
    pub idref: String,
    pub weight: Option<f64>,
    pub selector: Option<String>,
    pub severity: Option<String>,
    pub role: Option<String>,
}

impl DecodeNode for RefineRule {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            idref: decode::required_attr(node, "idref", path)?,
            weight: decode::number_attr(node, "weight", path)?,
            selector: decode::attr_string(node, "selector"),
            severity: decode::attr_string(node, "severity"),
            role: decode::attr_string(node, "role"),
        })
    }
}

impl EncodeNode for RefineRule {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .with("idref", &self.idref)
            .number("weight", self.weight)
            .opt("selector", self.selector.as_deref())
            .opt("severity", self.severity.as_deref())
            .opt("role", self.role.as_deref());
        w.empty("refine-rule", &attrs)
    }
}

/// Adjusts a Value's selector or operator (`refine-value`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineValue {
    pub idref: String,
    pub selector: Option<String>,
    pub operator: Option<String>,
}

impl DecodeNode for RefineValue {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            idref: decode::required_attr(node, "idref", path)?,
            selector: decode::attr_string(node, "selector"),
            operator: decode::attr_string(node, "operator"),
        })
    }
}

impl EncodeNode for RefineValue {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .with("idref", &self.idref)
            .opt("selector", self.selector.as_deref())
            .opt("operator", self.operator.as_deref());
        w.empty("refine-value", &attrs)
    }
}

/// Named tailoring of a benchmark (`Profile`)
///
/// Every `select.idref` should name a Group or Rule of the same benchmark.
/// The type does not enforce that; use
/// [`super::Benchmark::dangling_selects`] to check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub abstract_: Option<bool>,
    pub prohibit_changes: Option<bool>,
    pub extends: Option<String>,
    pub note_tag: Option<String>,
    pub status: Vec<Status>,
    pub version: Option<Version>,
    pub title: Vec<Text>,
    pub description: Vec<Text>,
    pub references: Vec<Reference>,
    pub platforms: Vec<UriRef>,
    pub selects: Vec<Select>,
    pub set_values: Vec<SetValue>,
    pub refine_rules: Vec<RefineRule>,
    pub refine_values: Vec<RefineValue>,
}

impl Profile {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: vec![Text::new(title)],
            ..Default::default()
        }
    }

    /// Ids selected (selected = true) by this profile, in order
    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selects.iter().filter(|s| s.selected).map(|s| s.idref.as_str())
    }
}

impl DecodeNode for Profile {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        let id = decode::required_attr(node, "id", path)?;
        let path = decode::with_id(path, &id);
        let path = path.as_str();

        let platforms = decode::children(node, scope, "platform")
            .map(|p| UriRef::decode(p, &decode::child_path(path, "platform", None)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            abstract_: decode::bool_attr(node, "abstract", path)?,
            prohibit_changes: decode::bool_attr(node, "prohibitChanges", path)?,
            extends: decode::attr_string(node, "extends"),
            note_tag: decode::attr_string(node, "note-tag"),
            status: decode::decode_all(node, scope, path, "status")?,
            version: decode::decode_first(node, scope, path, "version")?,
            title: decode::decode_all(node, scope, path, "title")?,
            description: decode::decode_all(node, scope, path, "description")?,
            references: decode::decode_all(node, scope, path, "reference")?,
            platforms,
            selects: decode::decode_all(node, scope, path, "select")?,
            set_values: decode::decode_all(node, scope, path, "set-value")?,
            refine_rules: decode::decode_all(node, scope, path, "refine-rule")?,
            refine_values: decode::decode_all(node, scope, path, "refine-value")?,
            id,
        })
    }
}

impl EncodeNode for Profile {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .with("id", &self.id)
            .flag("abstract", self.abstract_)
            .flag("prohibitChanges", self.prohibit_changes)
            .opt("extends", self.extends.as_deref())
            .opt("note-tag", self.note_tag.as_deref());
        w.start("Profile", &attrs)?;
        w.all(&self.status)?;
        if let Some(v) = &self.version {
            v.encode_node(w)?;
        }
        Text::encode_all(&self.title, w, "title")?;
        Text::encode_all(&self.description, w, "description")?;
        w.all(&self.references)?;
        for p in &self.platforms {
            p.encode(w, "platform")?;
        }
        w.all(&self.selects)?;
        w.all(&self.set_values)?;
        w.all(&self.refine_values)?;
        w.all(&self.refine_rules)?;
        w.end("Profile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeProfile;

    fn decode_profile(xml: &str) -> Result<Profile> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        let scope = Scope::for_root(root, DecodeProfile::Full);
        Profile::decode_node(root, &scope, "Benchmark/Profile")
    }

    #[test]
    fn test_decode_profile_selectors() {
        let xml = r#"<Profile id="MAC-1_Classified">
            <title>I - Mission Critical Classified</title>
            <select idref="V-100" selected="true"/>
            <select idref="V-101" selected="false"/>
            <set-value idref="var_timeout">900</set-value>
            <refine-rule idref="SV-100_rule" weight=" 5 " severity="high"/>
            <refine-value idref="var_timeout" selector="strict"/>
        </Profile>"#;
        let p = decode_profile(xml).unwrap();
        assert_eq!(p.id, "MAC-1_Classified");
        assert_eq!(p.title[0].text, "I - Mission Critical Classified");
        assert_eq!(p.selects.len(), 2);
        assert_eq!(p.selected_ids().collect::<Vec<_>>(), vec!["V-100"]);
        assert_eq!(p.set_values[0].value, "900");
        assert_eq!(p.refine_rules[0].weight, Some(5.0));
        assert_eq!(p.refine_values[0].selector.as_deref(), Some("strict"));
    }

    #[test]
    fn test_select_requires_selected_flag() {
        let err = decode_profile(r#"<Profile id="P"><select idref="V-1"/></Profile>"#).unwrap_err();
        assert_eq!(err.path(), Some("Benchmark/Profile[id=P]/select"));
    }

    #[test]
    fn test_profile_requires_id() {
        let err = decode_profile("<Profile><title>t</title></Profile>").unwrap_err();
        assert_eq!(err.path(), Some("Benchmark/Profile"));
    }
}
