//! Fix and FixText
//!
//! The schema leaves `strategy`, `disruption`, and `complexity` as free
//! strings, so the raw value is kept for round trips. Typed accessors map
//! the conventional vocabularies, treating absent or unrecognised values as
//! `Unknown`.

use std::io::Write;

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::decode::{self, DecodeNode, Scope};
use super::encode::{Attrs, EncodeNode, XmlWriter};
use crate::error::Result;

/// Remediation strategy vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixStrategy {
    #[default]
    Unknown,
    Configure,
    Patch,
    Policy,
    Disable,
    Enable,
    Restrict,
    Update,
    Combination,
}

impl FixStrategy {
    pub fn from_attr(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("configure") => Self::Configure,
            Some("patch") => Self::Patch,
            Some("policy") => Self::Policy,
            Some("disable") => Self::Disable,
            Some("enable") => Self::Enable,
            Some("restrict") => Self::Restrict,
            Some("update") => Self::Update,
            Some("combination") => Self::Combination,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Configure => "configure",
            Self::Patch => "patch",
            Self::Policy => "policy",
            Self::Disable => "disable",
            Self::Enable => "enable",
            Self::Restrict => "restrict",
            Self::Update => "update",
            Self::Combination => "combination",
        }
    }
}

/// Disruption/complexity rating vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
}

impl Rating {
    pub fn from_attr(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("low") => Self::Low,
            Some("medium") => Self::Medium,
            Some("high") => Self::High,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes shared by `fix` and `fixtext`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixAttributes {
    pub reboot: Option<bool>,
    pub strategy: Option<String>,
    pub disruption: Option<String>,
    pub complexity: Option<String>,
}

impl FixAttributes {
    fn decode(node: Node<'_, '_>, path: &str) -> Result<Self> {
        Ok(Self {
            reboot: decode::bool_attr(node, "reboot", path)?,
            strategy: decode::attr_string(node, "strategy"),
            disruption: decode::attr_string(node, "disruption"),
            complexity: decode::attr_string(node, "complexity"),
        })
    }

    fn append(&self, attrs: Attrs) -> Attrs {
        attrs
            .flag("reboot", self.reboot)
            .opt("strategy", self.strategy.as_deref())
            .opt("disruption", self.disruption.as_deref())
            .opt("complexity", self.complexity.as_deref())
    }

    pub fn strategy(&self) -> FixStrategy {
        FixStrategy::from_attr(self.strategy.as_deref())
    }

    pub fn disruption(&self) -> Rating {
        Rating::from_attr(self.disruption.as_deref())
    }

    pub fn complexity(&self) -> Rating {
        Rating::from_attr(self.complexity.as_deref())
    }
}

/// Machine-applicable remediation (`fix`)
///
/// STIG exports write an empty `fix` whose id is the `fixref` target of
/// the rule's `fixtext`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    pub id: Option<String>,
    pub system: Option<String>,
    pub platform: Option<String>,
    pub attributes: FixAttributes,
    pub content: Option<String>,
}

impl Fix {
    /// Empty placeholder fix carrying only an id
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

impl DecodeNode for Fix {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            id: decode::attr_string(node, "id"),
            system: decode::attr_string(node, "system"),
            platform: decode::attr_string(node, "platform"),
            attributes: FixAttributes::decode(node, path)?,
            content: Some(decode::opaque_text(node)).filter(|t| !t.trim().is_empty()),
        })
    }
}

impl EncodeNode for Fix {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .opt("id", self.id.as_deref())
            .opt("system", self.system.as_deref())
            .opt("platform", self.platform.as_deref());
        let attrs = self.attributes.append(attrs);
        match self.content.as_deref() {
            Some(c) if !c.trim().is_empty() => w.text_element("fix", &attrs, c),
            _ => w.empty("fix", &attrs),
        }
    }
}

/// Prose remediation instructions (`fixtext`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixText {
    pub fixref: Option<String>,
    pub lang: Option<String>,
    pub override_: Option<bool>,
    pub attributes: FixAttributes,
    pub text: String,
}

impl FixText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

impl DecodeNode for FixText {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            fixref: decode::attr_string(node, "fixref"),
            lang: decode::lang(node),
            override_: decode::bool_attr(node, "override", path)?,
            attributes: FixAttributes::decode(node, path)?,
            text: decode::opaque_text(node),
        })
    }
}

impl EncodeNode for FixText {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .lang(self.lang.as_deref())
            .opt("fixref", self.fixref.as_deref())
            .flag("override", self.override_);
        let attrs = self.attributes.append(attrs);
        w.text_element("fixtext", &attrs, &self.text)
    }
}
