//! STIG export: authored components to a ZIP of XCCDF documents
//!
//! Only released components are exported. Each component contributes one
//! Profile that selects all of its rules, and each rule becomes one Group
//! (`V-{rule_id}`) wrapping one Rule (`SV-{rule_id}_rule`) with its
//! description, ident, fixtext, fix placeholder, and check.
//!
//! Output is a pure function of the project and the configuration:
//! components are ordered by id, rules by rule id, and archive timestamps
//! are fixed, so exporting the same input twice yields identical bytes.
//!
//! # Usage
//!
//! ```ignore
//! use stig_xccdf::{ExportConfig, Exporter};
//!
//! let archive = Exporter::new(ExportConfig::from_env()).export(&project)?;
//! std::fs::write("stig.zip", &archive.bytes)?;
//! ```

use std::io::{Cursor, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::description::DisaDescription;
use super::severity::Severity;
use crate::config::{ExportConfig, ExportLayout};
use crate::error::{Result, XccdfError};
use crate::xccdf::{
    Benchmark, Check, CheckContentRef, DublinCore, Fix, FixText, Group, Ident, PlainText, Profile,
    Reference, Rule, Select, Status, Text, Version,
};

/// Publisher written on every benchmark reference
const PUBLISHER: &str = "DISA";

/// Source written on every benchmark reference
const SOURCE: &str = "STIG.DOD.MIL";

/// A project and its components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub components: Vec<Component>,
}

/// One authored component (a future STIG)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Component {
    pub id: u64,
    pub name: String,
    /// Short STIG prefix, e.g. "WIDG-00"
    pub prefix: String,
    pub version: Option<String>,
    pub release: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Only released components are exported
    pub released: bool,
    pub released_on: Option<NaiveDate>,
    pub rules: Vec<AuthoredRule>,
}

/// One authored requirement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthoredRule {
    pub rule_id: String,
    /// STIG id, e.g. "WIDG-00-000010"
    pub version: Option<String>,
    pub srg_id: Option<String>,
    pub title: String,
    pub severity: Severity,
    pub fixtext: Option<String>,
    /// CCI, e.g. "CCI-000054"
    pub ident: Option<String>,
    pub description: DisaDescription,
    pub check: AuthoredCheck,
    pub references: Vec<AuthoredReference>,
}

/// Check data of an authored rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthoredCheck {
    pub content_ref_name: Option<String>,
    pub content_ref_href: Option<String>,
    pub content: Option<String>,
}

/// One reference row of an authored rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthoredReference {
    pub href: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub subject: Option<String>,
    pub identifier: Option<String>,
    pub reference_type: Option<String>,
}

impl AuthoredReference {
    fn to_reference(&self) -> Reference {
        Reference {
            href: non_blank(self.href.as_deref()),
            dc: DublinCore {
                title: non_blank(self.title.as_deref()),
                publisher: non_blank(self.publisher.as_deref()),
                type_: non_blank(self.reference_type.as_deref()),
                subject: non_blank(self.subject.as_deref()),
                identifier: non_blank(self.identifier.as_deref()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// A finished export
#[derive(Debug, Clone)]
pub struct ExportArchive {
    /// ZIP bytes
    pub bytes: Vec<u8>,
    /// Entry paths, in archive order
    pub entries: Vec<String>,
}

/// Builds benchmark documents and archives from authored projects
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the released components of `project` as a ZIP archive
    pub fn export(&self, project: &Project) -> Result<ExportArchive> {
        let documents = self.benchmarks(project)?;

        let options = SimpleFileOptions::default()
            .compression_method(self.config.compression.method())
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = Vec::with_capacity(documents.len());
        for (path, benchmark) in &documents {
            let bytes = benchmark.encode()?;
            zip.start_file(path.as_str(), options)?;
            zip.write_all(&bytes)?;
            entries.push(path.clone());
        }
        let bytes = zip.finish()?.into_inner();

        tracing::info!(
            project = %project.name,
            entries = entries.len(),
            bytes = bytes.len(),
            "Exported STIG archive"
        );
        Ok(ExportArchive { bytes, entries })
    }

    /// Archive paths and benchmarks for the released components of `project`
    pub fn benchmarks(&self, project: &Project) -> Result<Vec<(String, Benchmark)>> {
        let mut released: Vec<&Component> =
            project.components.iter().filter(|c| c.released).collect();
        if released.is_empty() {
            return Err(XccdfError::NoPublishableComponent {
                project: project.name.clone(),
            });
        }
        released.sort_by_key(|c| c.id);

        let groups: Vec<Vec<&Component>> = match self.config.layout {
            ExportLayout::Combined => vec![released],
            ExportLayout::PerComponent => released.into_iter().map(|c| vec![c]).collect(),
        };

        let documents = groups
            .iter()
            .map(|components| {
                let prefix = components
                    .iter()
                    .map(|c| path_segment(&c.prefix))
                    .collect::<Vec<_>>()
                    .join("-");
                let path = self.entry_path(&project.name, &prefix);
                let benchmark = self.benchmark(project, components, &prefix);
                for (profile, idref) in benchmark.dangling_selects() {
                    tracing::warn!(profile, idref, "Profile selects an id with no Group or Rule");
                }
                (path, benchmark)
            })
            .collect();
        Ok(documents)
    }

    /// `{C}_{Project}_{Prefix}_Manual_STIG/{C}_{Project}_STIG_{Prefix}_Manual-xccdf.xml`
    fn entry_path(&self, project: &str, prefix: &str) -> String {
        let class = path_segment(&self.config.classification);
        let project = path_segment(project);
        format!(
            "{class}_{project}_{prefix}_Manual_STIG/{class}_{project}_STIG_{prefix}_Manual-xccdf.xml"
        )
    }

    fn benchmark(&self, project: &Project, components: &[&Component], prefix: &str) -> Benchmark {
        let lead = components[0];
        let single = components.len() == 1;

        let id = if single {
            format!("{}_{}_STIG", path_segment(&project.name), prefix)
        } else {
            format!("{}_STIG", path_segment(&project.name))
        };
        let version = non_blank(lead.version.as_deref()).unwrap_or_else(|| "1".to_string());
        let mut b = Benchmark::new(id, version);
        b.lang = Some("en".to_string());

        let date = self
            .config
            .benchmark_date
            .or_else(|| components.iter().filter_map(|c| c.released_on).max());
        b.status.push(Status::new("accepted", date));

        let title = if single {
            non_blank(lead.title.as_deref())
                .unwrap_or_else(|| format!("{} Security Technical Implementation Guide", lead.name))
        } else {
            format!("{} Security Technical Implementation Guide", project.name)
        };
        b.title.push(Text::new(title));
        if single {
            if let Some(d) = non_blank(lead.description.as_deref()) {
                b.description.push(Text::new(d));
            }
        }

        b.references.push(Reference {
            href: Some("https://cyber.mil".to_string()),
            dc: DublinCore {
                publisher: Some(PUBLISHER.to_string()),
                source: Some(SOURCE.to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        b.plain_texts.push(PlainText {
            id: "release-info".to_string(),
            text: release_info(lead.release.as_deref(), date),
        });

        for component in components {
            let mut rules: Vec<&AuthoredRule> = component.rules.iter().collect();
            rules.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));

            let mut profile = Profile::new(path_segment(&component.prefix), component.name.clone());
            for rule in &rules {
                profile.selects.push(Select::new(group_id(rule), true));
                b.groups.push(self.group(rule));
            }
            b.profiles.push(profile);
        }
        b
    }

    fn group(&self, rule: &AuthoredRule) -> Group {
        let mut group = Group::new(group_id(rule));
        if let Some(srg) = non_blank(rule.srg_id.as_deref()) {
            group.item.title.push(Text::new(srg));
        }
        group.rules.push(self.rule(rule));
        group
    }

    fn rule(&self, authored: &AuthoredRule) -> Rule {
        let id = &authored.rule_id;
        let fix_id = format!("F-{}_fix", id);

        let mut rule = Rule::new(format!("SV-{}_rule", id));
        rule.severity = authored.severity.as_xccdf().map(str::to_string);
        rule.selectable.weight = Some(self.config.weight);
        rule.item.version = non_blank(authored.version.as_deref()).map(Version::new);
        if !authored.title.trim().is_empty() {
            rule.item.title.push(Text::new(authored.title.clone()));
        }
        if !authored.description.is_empty() {
            rule.item.description.push(Text::new(authored.description.to_markup()));
        }
        rule.item.references = authored.references.iter().map(AuthoredReference::to_reference).collect();
        if let Some(cci) = non_blank(authored.ident.as_deref()) {
            rule.idents.push(Ident::cci(cci));
        }
        if let Some(text) = verbatim(authored.fixtext.as_deref()) {
            let mut fixtext = FixText::new(text);
            fixtext.fixref = Some(fix_id.clone());
            rule.fixtexts.push(fixtext);
        }
        rule.fixes.push(Fix::placeholder(fix_id));

        let mut check = Check::new(format!("C-{}_chk", id));
        if let Some(href) = non_blank(authored.check.content_ref_href.as_deref()) {
            check.content_refs.push(CheckContentRef {
                href,
                name: non_blank(authored.check.content_ref_name.as_deref()),
            });
        }
        check.content = verbatim(authored.check.content.as_deref());
        // A content-ref name without an href has nowhere to go
        if !check.content_refs.is_empty() || check.content.is_some() {
            rule.checks.push(check);
        }
        rule
    }
}

fn group_id(rule: &AuthoredRule) -> String {
    format!("V-{}", rule.rule_id)
}

fn release_info(release: Option<&str>, date: Option<NaiveDate>) -> String {
    let release = non_blank(release).unwrap_or_else(|| "1".to_string());
    match date {
        Some(d) => format!("Release: {} Benchmark Date: {}", release, d.format("%d %b %Y")),
        None => format!("Release: {}", release),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Untrimmed value, unless it is blank
fn verbatim(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

/// Path-safe form of a name: whitespace and separators become `_`
fn path_segment(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}
