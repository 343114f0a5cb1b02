//! NIST SP 800-53 control references

use serde::{Deserialize, Serialize};

/// A NIST 800-53 control reference
///
/// Parsed from CCI reference indices like "AC-7", "IA-5 (1)", "AC-1 a 1",
/// or "IA-5(1)(d)".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NistControl {
    /// Control family (e.g., "AC", "IA", "SC")
    pub family: String,

    /// Control number (e.g., "7", "5", "28")
    pub number: String,

    /// Control enhancements and item parts (e.g., ["1", "d"] for IA-5(1)(d))
    pub enhancements: Vec<String>,
}

impl NistControl {
    /// Parse a NIST control string like "AC-7", "IA-5 (1)", "AC-1 a 1"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let dash_pos = s.find('-')?;
        let family = s[..dash_pos].trim().to_uppercase();
        if family.is_empty() || !family.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let rest = s[dash_pos + 1..].trim_start();
        let split = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let number = &rest[..split];
        if number.is_empty() {
            return None;
        }

        Some(Self {
            family,
            number: number.to_string(),
            enhancements: parse_enhancements(&rest[split..]),
        })
    }

    /// Returns the base control ID without enhancements (e.g., "AC-7")
    pub fn base_id(&self) -> String {
        format!("{}-{}", self.family, self.number)
    }

    /// Returns the full control ID with enhancements (e.g., "IA-5(1)(d)")
    pub fn full_id(&self) -> String {
        let enh_str = self
            .enhancements
            .iter()
            .map(|e| format!("({})", e))
            .collect::<String>();
        format!("{}{}", self.base_id(), enh_str)
    }

    /// Check if this control matches a base control ID, ignoring enhancements
    pub fn matches_base(&self, base_id: &str) -> bool {
        self.base_id().eq_ignore_ascii_case(base_id.trim())
    }
}

impl std::fmt::Display for NistControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_id())
    }
}

/// Parse enhancement strings like "(1)(d)", "(1, 2)", " (4)", or " a 1"
fn parse_enhancements(s: &str) -> Vec<String> {
    let mut enhancements = Vec::new();
    let mut current = String::new();
    let mut in_paren = false;

    for c in s.chars() {
        match c {
            '(' => {
                in_paren = true;
                current.clear();
            }
            ')' => {
                if in_paren {
                    // "(1, 2)"
                    enhancements.extend(
                        current
                            .split(',')
                            .map(str::trim)
                            .filter(|p| !p.is_empty())
                            .map(str::to_string),
                    );
                }
                in_paren = false;
                current.clear();
            }
            ' ' | ',' => {
                if in_paren {
                    current.push(c);
                } else if !current.is_empty() {
                    enhancements.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() && !in_paren {
        enhancements.push(current);
    }

    enhancements
}
