//! XML writing helpers
//!
//! [`XmlWriter`] wraps `quick_xml::Writer` so model types can emit elements
//! with one call per sub-element. Text and attribute values always go
//! through quick-xml's escaping; nothing is written raw.

use std::borrow::Cow;
use std::io::Write;

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, XccdfError};
use crate::parse::format_xsd_number;

/// Encode a model type as an XML element
pub trait EncodeNode {
    /// Write `self` as one element (with its children) to `w`
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()>;
}

/// Ordered attribute list for one element
#[derive(Debug, Clone, Default)]
pub struct Attrs(Vec<(&'static str, String)>);

impl Attrs {
    /// Empty attribute list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute unconditionally
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.0.push((name, value.into()));
        self
    }

    /// Add an attribute when the value is present and non-blank
    pub fn opt(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => self.with(name, v),
            _ => self,
        }
    }

    /// Add an `xsd:boolean` attribute when present
    pub fn flag(self, name: &'static str, value: Option<bool>) -> Self {
        match value {
            Some(v) => self.with(name, if v { "true" } else { "false" }),
            None => self,
        }
    }

    /// Add a numeric attribute when present
    pub fn number(self, name: &'static str, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.with(name, format_xsd_number(v)),
            None => self,
        }
    }

    /// Add `xml:lang` when present
    pub fn lang(self, value: Option<&str>) -> Self {
        self.opt("xml:lang", value)
    }

    fn start<'a>(&'a self, name: &'a str) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for (k, v) in &self.0 {
            start.push_attribute((*k, v.as_str()));
        }
        start
    }
}

/// Indenting XML writer with escaping
pub struct XmlWriter<W: Write> {
    inner: quick_xml::Writer<W>,
}

impl<W: Write> XmlWriter<W> {
    /// Create a writer that indents nested elements by two spaces
    pub fn new(out: W) -> Self {
        Self {
            inner: quick_xml::Writer::new_with_indent(out, b' ', 2),
        }
    }

    /// Write the `<?xml version="1.0" encoding="UTF-8"?>` declaration
    pub fn declaration(&mut self) -> Result<()> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    /// Open an element
    pub fn start(&mut self, name: &str, attrs: &Attrs) -> Result<()> {
        self.event(Event::Start(attrs.start(name)))
    }

    /// Close an element
    pub fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// Write a self-closing element
    pub fn empty(&mut self, name: &str, attrs: &Attrs) -> Result<()> {
        self.event(Event::Empty(attrs.start(name)))
    }

    /// Write an element holding only text
    ///
    /// Carriage returns are written as `&#13;`; a raw `\r` would be folded
    /// into `\n` by the reader's end-of-line handling.
    pub fn text_element(&mut self, name: &str, attrs: &Attrs, text: &str) -> Result<()> {
        self.start(name, attrs)?;
        let escaped = escape(text);
        let escaped = if escaped.contains('\r') {
            Cow::Owned(escaped.replace('\r', "&#13;"))
        } else {
            escaped
        };
        self.event(Event::Text(BytesText::from_escaped(escaped)))?;
        self.end(name)
    }

    /// Write a text element only when `text` is present and non-blank
    pub fn opt_text_element(&mut self, name: &str, text: Option<&str>) -> Result<()> {
        match text {
            Some(t) if !t.trim().is_empty() => self.text_element(name, &Attrs::new(), t),
            _ => Ok(()),
        }
    }

    /// Encode every item of a slice in order
    pub fn all<T: EncodeNode>(&mut self, items: &[T]) -> Result<()> {
        items.iter().try_for_each(|item| item.encode_node(self))
    }

    /// Recover the underlying output
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.inner.write_event(event).map_err(XccdfError::write)
    }
}

/// Encode one value as a standalone document (declaration + element)
pub fn to_document<T: EncodeNode>(value: &T) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new(Vec::new());
    w.declaration()?;
    value.encode_node(&mut w)?;
    let mut out = w.into_inner();
    out.push(b'\n');
    Ok(out)
}
