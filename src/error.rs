//! Error types for the benchmark codec
//!
//! Every failure of a decode, encode, export, or CCI resolution surfaces as
//! one [`XccdfError`]. None of them are worth retrying: the transforms are
//! deterministic, so the same input always fails the same way.

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, XccdfError>;

/// Codec error types
#[derive(Error, Debug)]
pub enum XccdfError {
    /// Input is not well-formed XML (or not UTF-8, or over the size limit)
    #[error("Malformed XML: {message}")]
    XmlMalformed { message: String },

    /// A field the schema requires is absent or unparseable
    #[error("Schema violation at {path}: {message}")]
    SchemaViolation { path: String, message: String },

    /// A rule carries both a check and a complex-check at encode time
    #[error("Rule {rule_id} carries both check and complex-check")]
    AmbiguousCheckSpecification { rule_id: String },

    /// Export requested but no component is released
    #[error("Project {project} has no released component to export")]
    NoPublishableComponent { project: String },

    /// One or more CCI ids are not in the loaded list
    #[error("Unknown CCI ids: {}", missing.join(", "))]
    ComplianceResolutionError { missing: Vec<String> },

    /// The XML writer failed
    #[error("XML write error: {0}")]
    XmlWrite(String),

    /// The ZIP container could not be written
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl XccdfError {
    /// Create a malformed-input error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::XmlMalformed {
            message: message.into(),
        }
    }

    /// Create a schema violation for an element path
    pub fn violation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a schema violation for a required field that is missing
    pub fn missing(path: impl Into<String>, field: &str) -> Self {
        Self::violation(path, format!("required {} is missing", field))
    }

    /// Create a writer error from any displayable writer failure
    pub fn write(e: impl std::fmt::Display) -> Self {
        Self::XmlWrite(e.to_string())
    }

    /// Element path for schema violations, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::SchemaViolation { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for XccdfError {
    fn from(e: roxmltree::Error) -> Self {
        Self::malformed(e.to_string())
    }
}
