//! Decode and export configuration
//!
//! Provides builder-pattern configuration for the decoder and the STIG
//! exporter, plus loading from environment variables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::parse::parse_size;

/// Default upper bound on an accepted document (64MB)
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 64 * 1024 * 1024;

/// Default rule weight written on exported rules
pub const DEFAULT_RULE_WEIGHT: f64 = 10.0;

/// Default classification marking for exported paths
pub const DEFAULT_CLASSIFICATION: &str = "U";

/// Which fields the decoder reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeProfile {
    /// Every element the model knows
    #[default]
    Full,

    /// Only the subset used for bulk ingestion of legacy benchmarks
    Narrow,
}

impl DecodeProfile {
    /// Parse from a case-insensitive name ("full", "narrow")
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "full" => Some(Self::Full),
            "narrow" | "legacy" => Some(Self::Narrow),
            _ => None,
        }
    }
}

impl std::fmt::Display for DecodeProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Narrow => write!(f, "narrow"),
        }
    }
}

/// Decoder configuration.
///
/// # Example
///
/// ```ignore
/// use stig_xccdf::{Benchmark, DecodeConfig, DecodeProfile};
///
/// let config = DecodeConfig::builder()
///     .profile(DecodeProfile::Narrow)
///     .max_document_size(16 * 1024 * 1024)
///     .build();
/// let benchmark = Benchmark::decode_with(&bytes, &config)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Fields to read
    pub profile: DecodeProfile,

    /// Largest accepted input in bytes; larger input is rejected as malformed
    pub max_document_size: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            profile: DecodeProfile::Full,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}

impl DecodeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `XCCDF_DECODE_PROFILE`: "full" or "narrow" (default: "full")
    /// - `XCCDF_MAX_DOCUMENT_SIZE`: e.g., "64MB", "512KB" (default: "64MB")
    pub fn from_env() -> Self {
        let profile = std::env::var("XCCDF_DECODE_PROFILE")
            .ok()
            .and_then(|s| DecodeProfile::from_str_loose(&s))
            .unwrap_or_default();

        let max_document_size = std::env::var("XCCDF_MAX_DOCUMENT_SIZE")
            .ok()
            .and_then(|s| parse_size(&s))
            .unwrap_or(DEFAULT_MAX_DOCUMENT_SIZE);

        Self {
            profile,
            max_document_size,
        }
    }

    /// Configuration for the narrow legacy-ingestion profile
    pub fn narrow() -> Self {
        Self {
            profile: DecodeProfile::Narrow,
            ..Self::default()
        }
    }

    /// Create a new builder for programmatic configuration.
    pub fn builder() -> DecodeConfigBuilder {
        DecodeConfigBuilder::default()
    }
}

/// Builder for DecodeConfig
#[derive(Debug, Clone, Default)]
pub struct DecodeConfigBuilder {
    config: DecodeConfig,
}

impl DecodeConfigBuilder {
    /// Set the decode profile.
    pub fn profile(mut self, profile: DecodeProfile) -> Self {
        self.config.profile = profile;
        self
    }

    /// Set the maximum accepted document size in bytes.
    pub fn max_document_size(mut self, size: usize) -> Self {
        self.config.max_document_size = size;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> DecodeConfig {
        self.config
    }
}

/// How exported components map onto archive entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportLayout {
    /// One document for the whole project, one Profile per component
    #[default]
    Combined,

    /// One document per component
    PerComponent,
}

impl ExportLayout {
    /// Parse from a case-insensitive name ("combined", "per-component")
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "combined" | "project" => Some(Self::Combined),
            "per-component" | "component" => Some(Self::PerComponent),
            _ => None,
        }
    }
}

/// Compression applied to archive entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    #[default]
    Deflated,
    Stored,
}

impl ArchiveCompression {
    pub(crate) fn method(&self) -> zip::CompressionMethod {
        match self {
            Self::Deflated => zip::CompressionMethod::Deflated,
            Self::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// STIG export configuration.
///
/// The exporter never reads the clock: the benchmark status date comes from
/// `benchmark_date`, or from the latest component release date when unset.
///
/// # Example
///
/// ```ignore
/// use stig_xccdf::{ExportConfig, ExportLayout, Exporter};
///
/// let config = ExportConfig::builder()
///     .classification("U")
///     .layout(ExportLayout::PerComponent)
///     .build();
/// let archive = Exporter::new(config).export(&project)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Classification marking leading every archive path
    pub classification: String,

    /// Document layout
    pub layout: ExportLayout,

    /// Status date written on every benchmark
    pub benchmark_date: Option<NaiveDate>,

    /// Weight written on every exported rule
    pub weight: f64,

    /// Entry compression
    pub compression: ArchiveCompression,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            classification: DEFAULT_CLASSIFICATION.to_string(),
            layout: ExportLayout::Combined,
            benchmark_date: None,
            weight: DEFAULT_RULE_WEIGHT,
            compression: ArchiveCompression::Deflated,
        }
    }
}

impl ExportConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `XCCDF_CLASSIFICATION`: path marking (default: "U")
    /// - `XCCDF_EXPORT_LAYOUT`: "combined" or "per-component" (default: "combined")
    /// - `XCCDF_BENCHMARK_DATE`: YYYY-MM-DD (default: latest release date)
    /// - `XCCDF_RULE_WEIGHT`: number (default: 10.0)
    pub fn from_env() -> Self {
        let classification = std::env::var("XCCDF_CLASSIFICATION")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CLASSIFICATION.to_string());

        let layout = std::env::var("XCCDF_EXPORT_LAYOUT")
            .ok()
            .and_then(|s| ExportLayout::from_str_loose(&s))
            .unwrap_or_default();

        let benchmark_date = std::env::var("XCCDF_BENCHMARK_DATE")
            .ok()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

        let weight = std::env::var("XCCDF_RULE_WEIGHT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_RULE_WEIGHT);

        Self {
            classification,
            layout,
            benchmark_date,
            weight,
            compression: ArchiveCompression::Deflated,
        }
    }

    /// Create a new builder for programmatic configuration.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::default()
    }
}

/// Builder for ExportConfig
#[derive(Debug, Clone, Default)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    /// Set the classification marking.
    pub fn classification(mut self, classification: impl Into<String>) -> Self {
        self.config.classification = classification.into();
        self
    }

    /// Set the document layout.
    pub fn layout(mut self, layout: ExportLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the benchmark status date.
    pub fn benchmark_date(mut self, date: NaiveDate) -> Self {
        self.config.benchmark_date = Some(date);
        self
    }

    /// Set the rule weight.
    pub fn weight(mut self, weight: f64) -> Self {
        self.config.weight = weight;
        self
    }

    /// Store entries uncompressed.
    pub fn stored(mut self) -> Self {
        self.config.compression = ArchiveCompression::Stored;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ExportConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_defaults() {
        let config = DecodeConfig::default();
        assert_eq!(config.profile, DecodeProfile::Full);
        assert_eq!(config.max_document_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_decode_builder() {
        let config = DecodeConfig::builder()
            .profile(DecodeProfile::Narrow)
            .max_document_size(1024)
            .build();
        assert_eq!(config.profile, DecodeProfile::Narrow);
        assert_eq!(config.max_document_size, 1024);
    }

    #[test]
    fn test_profile_from_str_loose() {
        assert_eq!(DecodeProfile::from_str_loose(" NARROW "), Some(DecodeProfile::Narrow));
        assert_eq!(DecodeProfile::from_str_loose("full"), Some(DecodeProfile::Full));
        assert_eq!(DecodeProfile::from_str_loose("partial"), None);
    }

    #[test]
    fn test_layout_from_str_loose() {
        assert_eq!(ExportLayout::from_str_loose("per_component"), Some(ExportLayout::PerComponent));
        assert_eq!(ExportLayout::from_str_loose("Combined"), Some(ExportLayout::Combined));
        assert_eq!(ExportLayout::from_str_loose("zip"), None);
    }

    #[test]
    fn test_export_builder() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let config = ExportConfig::builder()
            .classification("CUI")
            .layout(ExportLayout::PerComponent)
            .benchmark_date(date)
            .weight(5.0)
            .stored()
            .build();
        assert_eq!(config.classification, "CUI");
        assert_eq!(config.layout, ExportLayout::PerComponent);
        assert_eq!(config.benchmark_date, Some(date));
        assert_eq!(config.weight, 5.0);
        assert_eq!(config.compression, ArchiveCompression::Stored);
    }
}
