//! CCI to NIST control resolution

use super::list::CciList;
use crate::error::{Result, XccdfError};

/// Resolve CCI ids to NIST control indices
///
/// Each id contributes the index of its latest reference. One trailing
/// `Rev_{n}` marker follows, taken from the latest reference of the first
/// id only, even when later ids resolve against another revision. Every
/// id that is unknown, or has no reference, is reported together.
///
/// ```ignore
/// let controls = resolve(&list, &["CCI-000001"])?;
/// assert_eq!(controls, vec!["AC-1", "Rev_4"]);
/// ```
pub fn resolve<S: AsRef<str>>(list: &CciList, ids: &[S]) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(ids.len() + 1);
    let mut missing = Vec::new();
    let mut revision = None;

    for (i, id) in ids.iter().enumerate() {
        let id = id.as_ref().trim();
        match list.get(id).and_then(|item| item.latest_reference()) {
            Some(reference) => {
                out.push(reference.index.clone());
                if i == 0 {
                    revision = Some(reference.version.clone());
                }
            }
            None => missing.push(id.to_string()),
        }
    }

    if !missing.is_empty() {
        tracing::debug!(missing = ?missing, "Unresolved CCI ids");
        return Err(XccdfError::ComplianceResolutionError { missing });
    }
    if let Some(version) = revision {
        out.push(format!("Rev_{}", version));
    }
    Ok(out)
}
