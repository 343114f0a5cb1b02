//! Namespace URIs and fixed document values used by benchmark documents

/// XCCDF 1.1 namespace (DISA STIG documents)
pub const XCCDF_1_1: &str = "http://checklists.nist.gov/xccdf/1.1";

/// XCCDF 1.2 namespace
pub const XCCDF_1_2: &str = "http://checklists.nist.gov/xccdf/1.2";

/// XML-Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML-Schema-instance namespace
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// CPE language namespace
pub const CPE: &str = "http://cpe.mitre.org/language/2.0";

/// XHTML namespace
pub const XHTML: &str = "http://www.w3.org/1999/xhtml";

/// Dublin Core elements namespace
pub const DC: &str = "http://purl.org/dc/elements/1.1/";

/// Namespace bound to the `xml:` prefix
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// `xsi:schemaLocation` written on exported benchmarks
pub const SCHEMA_LOCATION: &str = "http://checklists.nist.gov/xccdf/1.1 \
     http://nvd.nist.gov/schema/xccdf-1.1.4.xsd \
     http://cpe.mitre.org/dictionary/2.0 \
     http://cpe.mitre.org/files/cpe-dictionary_2.1.xsd";

/// Ident system for control-correlation identifiers
pub const CCI_IDENT_SYSTEM: &str = "http://cyber.mil/cci";

/// Ident system marking legacy (pre-DISA-SRG) identifiers
pub const LEGACY_IDENT_SYSTEM: &str = "http://cyber.mil/legacy";

/// Prefixed namespace declarations written on the benchmark root, in order
pub const ROOT_DECLARATIONS: [(&str, &str); 5] = [
    ("xmlns:dsig", DSIG),
    ("xmlns:xsi", XSI),
    ("xmlns:cpe", CPE),
    ("xmlns:xhtml", XHTML),
    ("xmlns:dc", DC),
];
