//! Item hierarchy: Group, Rule, Value
//!
//! All three share the attributes and leading children of the abstract
//! XCCDF Item ([`Item`]); Group and Rule add the selectable-item children
//! ([`Selectable`]). [`XccdfItem`] gives uniform access across the family.

use std::io::Write;

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::check::{Check, ComplexCheck};
use super::decode::{self, DecodeNode, Scope};
use super::element::{Ident, ProfileNote, Reference, Warning};
use super::encode::{Attrs, EncodeNode, XmlWriter};
use super::fix::{Fix, FixText};
use super::types::{Idref, IdrefList, SelNum, SelString, Status, Text, UriRef, Version};
use crate::error::{Result, XccdfError};

/// Attributes and children shared by every item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub abstract_: Option<bool>,
    pub hidden: Option<bool>,
    pub extends: Option<String>,
    pub cluster_id: Option<String>,
    pub prohibit_changes: Option<bool>,
    pub resolved: Option<bool>,
    pub status: Vec<Status>,
    pub version: Option<Version>,
    pub title: Vec<Text>,
    pub description: Vec<Text>,
    pub warnings: Vec<Warning>,
    pub questions: Vec<Text>,
    pub references: Vec<Reference>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Decode the shared part of an item, returning it with the item's path
    fn decode(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<(Self, String)> {
        let id = decode::required_attr(node, "id", path)?;
        let path = decode::with_id(path, &id);
        let p = path.as_str();

        let mut item = Self {
            id,
            version: decode::decode_first(node, scope, p, "version")?,
            title: decode::decode_all(node, scope, p, "title")?,
            description: decode::decode_all(node, scope, p, "description")?,
            ..Default::default()
        };

        if !scope.narrow() {
            item.abstract_ = decode::bool_attr(node, "abstract", p)?;
            item.hidden = decode::bool_attr(node, "hidden", p)?;
            item.extends = decode::attr_string(node, "extends");
            item.cluster_id = decode::attr_string(node, "cluster-id");
            item.prohibit_changes = decode::bool_attr(node, "prohibitChanges", p)?;
            item.resolved = decode::bool_attr(node, "resolved", p)?;
            item.status = decode::decode_all(node, scope, p, "status")?;
            item.warnings = decode::decode_all(node, scope, p, "warning")?;
            item.questions = decode::decode_all(node, scope, p, "question")?;
            item.references = decode::decode_all(node, scope, p, "reference")?;
        }

        Ok((item, path))
    }

    fn attrs(&self) -> Attrs {
        Attrs::new()
            .with("id", &self.id)
            .flag("abstract", self.abstract_)
            .flag("hidden", self.hidden)
            .opt("extends", self.extends.as_deref())
            .opt("cluster-id", self.cluster_id.as_deref())
            .flag("prohibitChanges", self.prohibit_changes)
            .flag("resolved", self.resolved)
    }

    fn encode_children<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        w.all(&self.status)?;
        if let Some(v) = &self.version {
            v.encode_node(w)?;
        }
        Text::encode_all(&self.title, w, "title")?;
        Text::encode_all(&self.description, w, "description")?;
        w.all(&self.warnings)?;
        Text::encode_all(&self.questions, w, "question")?;
        w.all(&self.references)
    }
}

/// Children and attributes of selectable items (Group, Rule)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selectable {
    pub selected: Option<bool>,
    pub weight: Option<f64>,
    pub rationale: Vec<Text>,
    pub platforms: Vec<UriRef>,
    pub requires: Vec<IdrefList>,
    pub conflicts: Vec<Idref>,
}

impl Selectable {
    fn decode(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        let weight = decode::number_attr(node, "weight", path)?;
        if scope.narrow() {
            return Ok(Self {
                weight,
                ..Default::default()
            });
        }

        let platforms = decode::children(node, scope, "platform")
            .map(|n| UriRef::decode(n, &decode::child_path(path, "platform", None)))
            .collect::<Result<Vec<_>>>()?;
        let requires = decode::children(node, scope, "requires")
            .map(|n| IdrefList::decode(n, &decode::child_path(path, "requires", None)))
            .collect::<Result<Vec<_>>>()?;
        let conflicts = decode::children(node, scope, "conflicts")
            .map(|n| Idref::decode(n, &decode::child_path(path, "conflicts", None)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            selected: decode::bool_attr(node, "selected", path)?,
            weight,
            rationale: decode::decode_all(node, scope, path, "rationale")?,
            platforms,
            requires,
            conflicts,
        })
    }

    fn append(&self, attrs: Attrs) -> Attrs {
        attrs.flag("selected", self.selected).number("weight", self.weight)
    }

    fn encode_children<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        Text::encode_all(&self.rationale, w, "rationale")?;
        for p in &self.platforms {
            p.encode(w, "platform")?;
        }
        for r in &self.requires {
            r.encode(w, "requires")?;
        }
        for c in &self.conflicts {
            c.encode(w, "conflicts")?;
        }
        Ok(())
    }
}

/// Uniform access to Group, Rule, and Value
pub trait XccdfItem {
    fn item(&self) -> &Item;

    fn id(&self) -> &str {
        &self.item().id
    }

    /// First non-blank title, trimmed
    fn title(&self) -> Option<&str> {
        self.item()
            .title
            .iter()
            .map(|t| t.text.trim())
            .find(|t| !t.is_empty())
    }

    /// First non-blank description, untrimmed
    fn description(&self) -> Option<&str> {
        self.item()
            .description
            .iter()
            .map(|t| t.text.as_str())
            .find(|t| !t.trim().is_empty())
    }

    fn version(&self) -> Option<&str> {
        self.item().version.as_ref().map(|v| v.value.as_str())
    }
}

/// Atomic compliance statement (`Rule`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub item: Item,
    pub selectable: Selectable,
    pub role: Option<String>,
    /// Raw severity (unknown, info, low, medium, high)
    pub severity: Option<String>,
    pub multiple: Option<bool>,
    pub idents: Vec<Ident>,
    pub impact_metric: Option<String>,
    pub profile_notes: Vec<ProfileNote>,
    pub fixtexts: Vec<FixText>,
    pub fixes: Vec<Fix>,
    pub checks: Vec<Check>,
    pub complex_check: Option<ComplexCheck>,
}

impl Rule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            item: Item::new(id),
            ..Default::default()
        }
    }

    /// True when both a check and a complex-check are present
    ///
    /// Such rules decode but fail to encode.
    pub fn has_ambiguous_check(&self) -> bool {
        !self.checks.is_empty() && self.complex_check.is_some()
    }

    /// First check, if any
    pub fn check(&self) -> Option<&Check> {
        self.checks.first()
    }

    /// Inline content of the first check, if any
    pub fn check_content(&self) -> Option<&str> {
        self.check().and_then(|c| c.content.as_deref())
    }

    /// First fixtext body, if any
    pub fn fixtext(&self) -> Option<&str> {
        self.fixtexts.first().map(|f| f.text.as_str())
    }

    /// Values of the CCI idents, in order
    pub fn ccis(&self) -> Vec<&str> {
        self.idents
            .iter()
            .filter(|i| i.is_cci())
            .map(|i| i.value.as_str())
            .collect()
    }
}

impl XccdfItem for Rule {
    fn item(&self) -> &Item {
        &self.item
    }
}

impl DecodeNode for Rule {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        let (item, path) = Item::decode(node, scope, path)?;
        let p = path.as_str();

        let mut rule = Self {
            selectable: Selectable::decode(node, scope, p)?,
            severity: decode::attr_string(node, "severity"),
            idents: decode::decode_all(node, scope, p, "ident")?,
            fixtexts: decode::decode_all(node, scope, p, "fixtext")?,
            fixes: decode::decode_all(node, scope, p, "fix")?,
            checks: decode::decode_all(node, scope, p, "check")?,
            item,
            ..Default::default()
        };

        if !scope.narrow() {
            rule.role = decode::attr_string(node, "role");
            rule.multiple = decode::bool_attr(node, "multiple", p)?;
            rule.impact_metric = decode::child_text(node, scope, "impact-metric");
            rule.profile_notes = decode::decode_all(node, scope, p, "profile-note")?;
            rule.complex_check = decode::decode_first(node, scope, p, "complex-check")?;
            if rule.has_ambiguous_check() {
                tracing::debug!(
                    path = %path,
                    "Rule carries both check and complex-check; keeping both"
                );
            }
        }

        Ok(rule)
    }
}

impl EncodeNode for Rule {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        if self.has_ambiguous_check() {
            return Err(XccdfError::AmbiguousCheckSpecification {
                rule_id: self.item.id.clone(),
            });
        }

        let attrs = self
            .selectable
            .append(self.item.attrs())
            .opt("role", self.role.as_deref())
            .opt("severity", self.severity.as_deref())
            .flag("multiple", self.multiple);
        w.start("Rule", &attrs)?;
        self.item.encode_children(w)?;
        self.selectable.encode_children(w)?;
        w.all(&self.idents)?;
        w.opt_text_element("impact-metric", self.impact_metric.as_deref())?;
        w.all(&self.profile_notes)?;
        w.all(&self.fixtexts)?;
        w.all(&self.fixes)?;
        w.all(&self.checks)?;
        if let Some(cc) = &self.complex_check {
            cc.encode_node(w)?;
        }
        w.end("Rule")
    }
}

/// Container of rules and sub-groups (`Group`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub item: Item,
    pub selectable: Selectable,
    pub values: Vec<Value>,
    pub groups: Vec<Group>,
    pub rules: Vec<Rule>,
}

impl Group {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            item: Item::new(id),
            ..Default::default()
        }
    }

    /// Every rule in this group and its sub-groups, depth first
    pub fn all_rules(&self) -> Vec<&Rule> {
        let mut out: Vec<&Rule> = self.rules.iter().collect();
        for g in &self.groups {
            out.extend(g.all_rules());
        }
        out
    }
}

impl XccdfItem for Group {
    fn item(&self) -> &Item {
        &self.item
    }
}

impl DecodeNode for Group {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        let (item, path) = Item::decode(node, scope, path)?;
        let p = path.as_str();

        let mut group = Self {
            selectable: Selectable::decode(node, scope, p)?,
            rules: decode::decode_all(node, scope, p, "Rule")?,
            item,
            ..Default::default()
        };

        if !scope.narrow() {
            group.values = decode::decode_all(node, scope, p, "Value")?;
            group.groups = decode::decode_all(node, scope, p, "Group")?;
        }

        Ok(group)
    }
}

impl EncodeNode for Group {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = self.selectable.append(self.item.attrs());
        w.start("Group", &attrs)?;
        self.item.encode_children(w)?;
        self.selectable.encode_children(w)?;
        w.all(&self.values)?;
        w.all(&self.groups)?;
        w.all(&self.rules)?;
        w.end("Group")
    }
}

/// Fixed list of choices for a Value (`choices`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choices {
    pub selector: Option<String>,
    pub must_match: Option<bool>,
    pub choices: Vec<String>,
}

impl DecodeNode for Choices {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            selector: decode::attr_string(node, "selector"),
            must_match: decode::bool_attr(node, "mustMatch", path)?,
            choices: decode::children(node, scope, "choice")
                .map(decode::opaque_text)
                .collect(),
        })
    }
}

impl EncodeNode for Choices {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new()
            .opt("selector", self.selector.as_deref())
            .flag("mustMatch", self.must_match);
        w.start("choices", &attrs)?;
        for c in &self.choices {
            w.text_element("choice", &Attrs::new(), c)?;
        }
        w.end("choices")
    }
}

/// Tailorable parameter (`Value`)
///
/// Decoded for compatibility; the STIG export never produces one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub item: Item,
    /// string, number, or boolean
    pub value_type: Option<String>,
    pub operator: Option<String>,
    pub interactive: Option<bool>,
    pub values: Vec<SelString>,
    pub defaults: Vec<SelString>,
    pub matches: Vec<SelString>,
    pub lower_bounds: Vec<SelNum>,
    pub upper_bounds: Vec<SelNum>,
    pub choices: Vec<Choices>,
}

impl Value {
    /// Value content for a selector (`None` picks the unselected default)
    pub fn value_for(&self, selector: Option<&str>) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.selector.as_deref() == selector)
            .map(|v| v.value.as_str())
    }
}

impl XccdfItem for Value {
    fn item(&self) -> &Item {
        &self.item
    }
}

impl DecodeNode for Value {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        let (item, path) = Item::decode(node, scope, path)?;
        let p = path.as_str();

        let sel = |name: &str| -> Vec<SelString> {
            decode::children(node, scope, name).map(SelString::decode).collect()
        };
        let num = |name: &str| -> Result<Vec<SelNum>> {
            decode::children(node, scope, name)
                .map(|n| SelNum::decode(n, &decode::child_path(p, name, None)))
                .collect()
        };

        let values = sel("value");
        if values.is_empty() {
            return Err(XccdfError::missing(p, "value"));
        }

        Ok(Self {
            value_type: decode::attr_string(node, "type"),
            operator: decode::attr_string(node, "operator"),
            interactive: decode::bool_attr(node, "interactive", p)?,
            values,
            defaults: sel("default"),
            matches: sel("match"),
            lower_bounds: num("lower-bound")?,
            upper_bounds: num("upper-bound")?,
            choices: decode::decode_all(node, scope, p, "choices")?,
            item,
        })
    }
}

impl EncodeNode for Value {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        if self.values.is_empty() {
            return Err(XccdfError::missing(format!("Value[id={}]", self.item.id), "value"));
        }
        let attrs = self
            .item
            .attrs()
            .opt("type", self.value_type.as_deref())
            .opt("operator", self.operator.as_deref())
            .flag("interactive", self.interactive);
        w.start("Value", &attrs)?;
        self.item.encode_children(w)?;
        for v in &self.values {
            v.encode(w, "value")?;
        }
        for v in &self.defaults {
            v.encode(w, "default")?;
        }
        for v in &self.matches {
            v.encode(w, "match")?;
        }
        for v in &self.lower_bounds {
            v.encode(w, "lower-bound")?;
        }
        for v in &self.upper_bounds {
            v.encode(w, "upper-bound")?;
        }
        w.all(&self.choices)?;
        w.end("Value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeProfile;
    use crate::xccdf::check::{CheckNode, CheckOperator};

    fn decode_as<T: DecodeNode>(xml: &str, profile: DecodeProfile) -> Result<T> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        let scope = Scope::for_root(root, profile);
        T::decode_node(root, &scope, "Benchmark/Group")
    }

    const GROUP: &str = r#"<Group id="V-100">
        <title>SRG-APP-000001</title>
        <description>&lt;GroupDescription&gt;&lt;/GroupDescription&gt;</description>
        <Rule id="SV-100_rule" severity="medium" weight="10.0" role="full">
            <version>WIDG-00-000010</version>
            <title>The widget must limit sessions.</title>
            <description>&lt;VulnDiscussion&gt;Sessions matter.&lt;/VulnDiscussion&gt;</description>
            <reference><dc:title xmlns:dc="http://purl.org/dc/elements/1.1/">DPMS</dc:title></reference>
            <ident system="http://cyber.mil/cci">CCI-000054</ident>
            <fixtext fixref="F-100_fix">Configure the widget.</fixtext>
            <fix id="F-100_fix"/>
            <check system="C-100_chk">
                <check-content-ref name="M" href="Widget-STIG.xml"/>
                <check-content>Inspect the widget.</check-content>
            </check>
        </Rule>
        <Group id="V-200"><title>nested</title></Group>
    </Group>"#;

    #[test]
    fn test_decode_group_and_rule() {
        let group: Group = decode_as(GROUP, DecodeProfile::Full).unwrap();
        assert_eq!(group.id(), "V-100");
        assert_eq!(group.title(), Some("SRG-APP-000001"));
        assert_eq!(group.groups.len(), 1);

        let rule = &group.rules[0];
        assert_eq!(rule.id(), "SV-100_rule");
        assert_eq!(rule.severity.as_deref(), Some("medium"));
        assert_eq!(rule.selectable.weight, Some(10.0));
        assert_eq!(rule.role.as_deref(), Some("full"));
        assert_eq!(rule.version(), Some("WIDG-00-000010"));
        assert_eq!(rule.ccis(), vec!["CCI-000054"]);
        assert_eq!(rule.fixtext(), Some("Configure the widget."));
        assert_eq!(rule.check_content(), Some("Inspect the widget."));
        assert_eq!(rule.item.references.len(), 1);
        assert!(rule.description().unwrap().contains("<VulnDiscussion>"));
    }

    #[test]
    fn test_narrow_profile_skips_extras() {
        let group: Group = decode_as(GROUP, DecodeProfile::Narrow).unwrap();
        assert!(group.groups.is_empty());
        let rule = &group.rules[0];
        assert_eq!(rule.severity.as_deref(), Some("medium"));
        assert_eq!(rule.fixtext(), Some("Configure the widget."));
        assert!(rule.role.is_none());
        assert!(rule.item.references.is_empty());
    }

    #[test]
    fn test_rule_missing_check_system_names_path() {
        let xml = r#"<Group id="V-100"><Rule id="SV-100_rule"><check/></Rule></Group>"#;
        let err = decode_as::<Group>(xml, DecodeProfile::Full).unwrap_err();
        assert_eq!(err.path(), Some("Benchmark/Group[id=V-100]/Rule[id=SV-100_rule]/check"));
    }

    #[test]
    fn test_non_numeric_weight_is_violation() {
        let xml = r#"<Group id="V-1"><Rule id="R" weight="heavy"/></Group>"#;
        let err = decode_as::<Group>(xml, DecodeProfile::Full).unwrap_err();
        assert!(matches!(err, XccdfError::SchemaViolation { .. }));
    }

    #[test]
    fn test_infinite_weight_is_violation() {
        let xml = r#"<Group id="V-1"><Rule id="R" weight="inf"/></Group>"#;
        let err = decode_as::<Group>(xml, DecodeProfile::Narrow).unwrap_err();
        assert!(matches!(err, XccdfError::SchemaViolation { .. }));
    }

    #[test]
    fn test_both_check_forms_decode_leniently() {
        let xml = r#"<Group id="V-1"><Rule id="R">
            <check system="urn:a"/>
            <complex-check operator="AND"><check system="urn:b"/></complex-check>
        </Rule></Group>"#;
        let group: Group = decode_as(xml, DecodeProfile::Full).unwrap();
        assert!(group.rules[0].has_ambiguous_check());
    }

    #[test]
    fn test_encode_rejects_both_check_forms() {
        let mut rule = Rule::new("SV-1_rule");
        rule.checks.push(Check::new("urn:a"));
        rule.complex_check = Some(ComplexCheck::new(
            CheckOperator::And,
            vec![CheckNode::Check(Check::new("urn:b"))],
        ));

        let mut w = XmlWriter::new(Vec::new());
        let err = rule.encode_node(&mut w).unwrap_err();
        assert!(matches!(
            err,
            XccdfError::AmbiguousCheckSpecification { ref rule_id } if rule_id == "SV-1_rule"
        ));

        rule.checks.clear();
        let mut w = XmlWriter::new(Vec::new());
        rule.encode_node(&mut w).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert!(out.contains(r#"<complex-check operator="AND">"#));
    }

    #[test]
    fn test_value_requires_value_element() {
        let xml = r#"<Value id="var_x" type="number"><title>x</title></Value>"#;
        let err = decode_as::<Value>(xml, DecodeProfile::Full).unwrap_err();
        assert_eq!(err.path(), Some("Benchmark/Group[id=var_x]"));

        let xml = r#"<Value id="var_x" type="number">
            <value>5</value><value selector="strict">3</value>
            <lower-bound> 1 </lower-bound>
        </Value>"#;
        let v: Value = decode_as(xml, DecodeProfile::Full).unwrap();
        assert_eq!(v.value_for(None), Some("5"));
        assert_eq!(v.value_for(Some("strict")), Some("3"));
        assert_eq!(v.lower_bounds[0].value, 1.0);
    }
}
