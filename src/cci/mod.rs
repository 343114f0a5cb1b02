//! Control-correlation identifiers
//!
//! Loads DISA CCI lists and resolves CCI ids to NIST SP 800-53 control
//! indices for rule export.
//!
//! # Usage
//!
//! ```ignore
//! use stig_xccdf::cci::{resolve, CciList};
//!
//! let list = CciList::decode(&std::fs::read("U_CCI_List.xml")?)?;
//! let controls = resolve(&list, &["CCI-000054", "CCI-000366"])?;
//! ```

mod list;
mod nist;
mod resolver;

pub use list::{CciItem, CciList, CciReference, CCI_LIST_NAMESPACE};
pub use nist::NistControl;
pub use resolver::resolve;
