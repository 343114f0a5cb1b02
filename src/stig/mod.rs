//! DISA STIG authoring support
//!
//! Severity categories, the eleven-field rule description, and the export
//! of authored components into XCCDF archives.

mod description;
mod export;
mod severity;

pub use description::{DisaDescription, FIELD_TAGS};
pub use export::{
    AuthoredCheck, AuthoredReference, AuthoredRule, Component, ExportArchive, Exporter, Project,
};
pub use severity::Severity;
