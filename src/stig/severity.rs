//! STIG severity categories

use serde::{Deserialize, Serialize};

/// STIG severity categories
///
/// Serializes as the XCCDF value ("high"); deserializes from anything
/// [`Severity::from_level`] accepts, so authored "CAT I" maps to `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    /// CAT I - High severity
    High,
    /// CAT II - Medium severity
    Medium,
    /// CAT III - Low severity
    Low,
    /// Unknown severity
    #[default]
    Unknown,
}

impl From<String> for Severity {
    fn from(level: String) -> Self {
        Self::from_level(&level)
    }
}

impl Severity {
    /// Parse from an XCCDF severity or a CAT level ("high", "CAT I", "cat_ii")
    pub fn from_level(level: &str) -> Self {
        let normalized: String = level
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();
        match normalized.as_str() {
            "high" | "cati" | "cat1" => Self::High,
            "medium" | "catii" | "cat2" => Self::Medium,
            "low" | "catiii" | "cat3" => Self::Low,
            _ => Self::Unknown,
        }
    }

    /// XCCDF `severity` attribute value, if the category is known
    pub fn as_xccdf(&self) -> Option<&'static str> {
        match self {
            Self::High => Some("high"),
            Self::Medium => Some("medium"),
            Self::Low => Some("low"),
            Self::Unknown => None,
        }
    }

    /// STIG CAT level
    pub fn to_cat(&self) -> &'static str {
        match self {
            Self::High => "CAT I",
            Self::Medium => "CAT II",
            Self::Low => "CAT III",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "CAT I (High)"),
            Self::Medium => write!(f, "CAT II (Medium)"),
            Self::Low => write!(f, "CAT III (Low)"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_level() {
        assert_eq!(Severity::from_level("high"), Severity::High);
        assert_eq!(Severity::from_level("HIGH"), Severity::High);
        assert_eq!(Severity::from_level("CAT I"), Severity::High);
        assert_eq!(Severity::from_level("cat_ii"), Severity::Medium);
        assert_eq!(Severity::from_level("CAT III"), Severity::Low);
        assert_eq!(Severity::from_level("info"), Severity::Unknown);
    }

    #[test]
    fn test_cat_maps_to_xccdf() {
        assert_eq!(Severity::from_level("CAT I").as_xccdf(), Some("high"));
        assert_eq!(Severity::from_level("CAT II").as_xccdf(), Some("medium"));
        assert_eq!(Severity::from_level("CAT III").as_xccdf(), Some("low"));
        assert_eq!(Severity::Unknown.as_xccdf(), None);
        assert_eq!(Severity::High.to_cat(), "CAT I");
        assert_eq!(Severity::Medium.to_string(), "CAT II (Medium)");
    }

    #[test]
    fn test_deserialize_cat_labels() {
        let parse = |json: &str| serde_json::from_str::<Severity>(json).unwrap();
        assert_eq!(parse(r#""CAT I""#), Severity::High);
        assert_eq!(parse(r#""HIGH""#), Severity::High);
        assert_eq!(parse(r#""cat_iii""#), Severity::Low);
        assert_eq!(parse(r#""informational""#), Severity::Unknown);
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), r#""medium""#);
    }
}
