//! Parsing utilities for configuration values and XML Schema lexical forms

/// Parse human-readable size string (e.g., "10MB", "1GB", "512KB")
///
/// Returns `None` when the number part does not parse.
///
/// # Supported formats
/// - `"1GB"` - gigabytes
/// - `"10MB"` - megabytes
/// - `"512KB"` - kilobytes
/// - `"1024B"` or `"1024"` - bytes
pub fn parse_size(s: &str) -> Option<usize> {
    let s = s.trim().to_uppercase();
    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
}

/// Parse an `xsd:boolean` lexical value (`true`, `false`, `1`, `0`)
///
/// Surrounding whitespace is collapsed per the schema's whitespace facet.
pub fn parse_xsd_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parse an `xsd:decimal`/`xsd:double` value after trimming whitespace
///
/// Only finite values are accepted; `inf`, `NaN` and overflowing literals
/// are rejected.
pub fn parse_xsd_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Format a number the way benchmark documents write weights ("10.0")
pub fn format_xsd_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}
