//! XCCDF 1.1 benchmark model and codec
//!
//! The model mirrors the schema: a [`Benchmark`] holds profiles, values,
//! groups, and rules; rules carry checks, fixes, idents, and references.
//! Decoding reads with `roxmltree`; encoding writes with `quick-xml`.
//!
//! Unknown elements are ignored on decode. Elements outside the root's
//! namespace are ignored too, which silently blanks the affected fields
//! (logged at debug level).

mod benchmark;
mod check;
pub mod decode;
mod element;
pub mod encode;
mod fix;
mod item;
mod model;
pub mod namespace;
mod profile;
mod types;

pub use benchmark::Benchmark;
pub use check::{
    Check, CheckContentRef, CheckExport, CheckImport, CheckNode, CheckOperator, ComplexCheck,
};
pub use decode::DecodeNode;
pub use element::{DublinCore, Ident, ProfileNote, Reference, Warning};
pub use encode::{to_document, EncodeNode};
pub use fix::{Fix, FixAttributes, FixStrategy, FixText, Rating};
pub use item::{Choices, Group, Item, Rule, Selectable, Value, XccdfItem};
pub use model::{Model, Param, DEFAULT_MODEL};
pub use profile::{Profile, RefineRule, RefineValue, Select, SetValue};
pub use types::{
    Idref, IdrefList, Notice, PlainText, SelNum, SelString, Status, Text, UriRef, Version,
    STATUS_VALUES,
};
