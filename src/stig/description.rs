//! DISA rule description sub-fields
//!
//! A STIG rule description is a run of pseudo-elements
//! (`<VulnDiscussion>..</VulnDiscussion><FalsePositives>..` and so on)
//! stored as the text of one XCCDF `description`. Values are escaped when
//! the run is assembled, so the writer's own escaping adds a second layer
//! and [`DisaDescription::parse`] can split the text back into fields.

use serde::{Deserialize, Serialize};

/// Sub-field tags in the order they are written
pub const FIELD_TAGS: [&str; 11] = [
    "VulnDiscussion",
    "FalsePositives",
    "FalseNegatives",
    "Documentable",
    "Mitigations",
    "SeverityOverrideGuidance",
    "PotentialImpacts",
    "ThirdPartyTools",
    "MitigationControl",
    "Responsibility",
    "IAControls",
];

/// The eleven description sub-fields of a STIG rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisaDescription {
    pub vuln_discussion: Option<String>,
    pub false_positives: Option<String>,
    pub false_negatives: Option<String>,
    /// "true" or "false" in DISA content, kept as written
    pub documentable: Option<String>,
    pub mitigations: Option<String>,
    pub severity_override_guidance: Option<String>,
    pub potential_impacts: Option<String>,
    pub third_party_tools: Option<String>,
    pub mitigation_control: Option<String>,
    pub responsibility: Option<String>,
    pub ia_controls: Option<String>,
}

impl DisaDescription {
    /// Description carrying only a vulnerability discussion
    pub fn discussion(text: impl Into<String>) -> Self {
        Self {
            vuln_discussion: Some(text.into()),
            ..Default::default()
        }
    }

    /// Values paired with their tags, in write order
    pub fn fields(&self) -> [(&'static str, Option<&str>); 11] {
        [
            (FIELD_TAGS[0], self.vuln_discussion.as_deref()),
            (FIELD_TAGS[1], self.false_positives.as_deref()),
            (FIELD_TAGS[2], self.false_negatives.as_deref()),
            (FIELD_TAGS[3], self.documentable.as_deref()),
            (FIELD_TAGS[4], self.mitigations.as_deref()),
            (FIELD_TAGS[5], self.severity_override_guidance.as_deref()),
            (FIELD_TAGS[6], self.potential_impacts.as_deref()),
            (FIELD_TAGS[7], self.third_party_tools.as_deref()),
            (FIELD_TAGS[8], self.mitigation_control.as_deref()),
            (FIELD_TAGS[9], self.responsibility.as_deref()),
            (FIELD_TAGS[10], self.ia_controls.as_deref()),
        ]
    }

    fn slot(&mut self, tag: &str) -> Option<&mut Option<String>> {
        Some(match tag {
            "VulnDiscussion" => &mut self.vuln_discussion,
            "FalsePositives" => &mut self.false_positives,
            "FalseNegatives" => &mut self.false_negatives,
            "Documentable" => &mut self.documentable,
            "Mitigations" => &mut self.mitigations,
            "SeverityOverrideGuidance" => &mut self.severity_override_guidance,
            "PotentialImpacts" => &mut self.potential_impacts,
            "ThirdPartyTools" => &mut self.third_party_tools,
            "MitigationControl" => &mut self.mitigation_control,
            "Responsibility" => &mut self.responsibility,
            "IAControls" => &mut self.ia_controls,
            _ => return None,
        })
    }

    /// True when every sub-field is blank
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.map_or(true, |v| v.trim().is_empty()))
    }

    /// Assemble the description text; blank sub-fields produce no tag
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for (tag, value) in self.fields() {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                out.push_str(&format!("<{tag}>{}</{tag}>", quick_xml::escape::escape(v)));
            }
        }
        out
    }

    /// Split description text back into sub-fields
    ///
    /// Only the eleven known `<Tag>..</Tag>` pairs are recognised; anything
    /// between them, unknown tags included, is ignored. Sub-field values
    /// need not be well-formed: a bare `&` or `<` is kept as written. Text
    /// holding no known pair is taken whole as the vulnerability discussion.
    pub fn parse(text: &str) -> Self {
        let mut out = Self::default();
        let mut tagged = false;
        let mut rest = text;

        while let Some(open) = rest.find('<') {
            let after = &rest[open + 1..];
            let field = FIELD_TAGS.iter().find_map(move |tag| {
                let body = after.strip_prefix(tag)?.strip_prefix('>')?;
                let close = format!("</{}>", tag);
                let end = body.find(&close)?;
                Some((*tag, &body[..end], &body[end + close.len()..]))
            });
            match field {
                Some((tag, raw, tail)) => {
                    tagged = true;
                    let value = match quick_xml::escape::unescape(raw) {
                        Ok(v) => v.into_owned(),
                        Err(e) => {
                            tracing::debug!(tag, error = %e, "Sub-field is not escaped, kept as written");
                            raw.to_string()
                        }
                    };
                    if let Some(slot) = out.slot(tag) {
                        *slot = Some(value).filter(|v| !v.trim().is_empty());
                    }
                    rest = tail;
                }
                None => rest = after,
            }
        }

        if !tagged && !text.trim().is_empty() {
            return Self::discussion(text.trim());
        }
        out
    }
}
