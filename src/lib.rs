//! # stig-xccdf
//!
//! XCCDF 1.1 benchmark codec for DISA Security Technical Implementation
//! Guides (STIGs).
//!
//! ## Features
//!
//! - **Decoder**: any XCCDF 1.1 benchmark into a typed model, with a narrow
//!   profile for bulk ingestion of legacy documents
//! - **Encoder**: the model back into XML, escaped and in schema order
//! - **STIG export**: authored components into a deterministic ZIP of
//!   XCCDF documents
//! - **CCI resolution**: control-correlation identifiers to NIST SP 800-53
//!   control indices
//!
//! ## Quick Start
//!
//! ```ignore
//! use stig_xccdf::{Benchmark, DecodeConfig, ExportConfig, Exporter};
//! use stig_xccdf::cci::{resolve, CciList};
//!
//! // Decode a published benchmark
//! let benchmark = Benchmark::decode_with(&bytes, &DecodeConfig::from_env())?;
//!
//! // Export authored components
//! let archive = Exporter::new(ExportConfig::from_env()).export(&project)?;
//!
//! // Map CCIs to NIST controls
//! let list = CciList::decode(&cci_bytes)?;
//! let controls = resolve(&list, &["CCI-000054"])?;
//! ```
//!
//! The crate logs through `tracing` and never installs a subscriber.

pub mod cci;
mod config;
mod error;
mod parse;
pub mod stig;
pub mod xccdf;

// Re-exports
pub use config::{
    ArchiveCompression, DecodeConfig, DecodeConfigBuilder, DecodeProfile, ExportConfig,
    ExportConfigBuilder, ExportLayout,
};
pub use error::{Result, XccdfError};
pub use parse::parse_size;
pub use stig::{DisaDescription, ExportArchive, Exporter, Project, Severity};
pub use xccdf::{Benchmark, Group, Profile, Rule, Value, XccdfItem};
