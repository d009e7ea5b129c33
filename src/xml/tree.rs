use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::escape::{escape_attr_canonical, escape_text_canonical};
use super::namespaces::canonical_order;
use crate::core::FacturaeError;

fn xml_io(e: std::io::Error) -> FacturaeError {
    FacturaeError::Xml(format!("XML write error: {e}"))
}

/// Child of an [`XmlElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with attributes and ordered children, rendered in one pass.
///
/// Output is canonical by construction: explicit start and end tags,
/// double-quoted attributes with namespace declarations first, and
/// canonical text escaping. Digests over the rendered bytes therefore
/// match Canonical XML 1.0 without a separate canonicalization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Element containing a single text node.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).text(text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Set an attribute, replacing any previous value of the same name.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    /// Append `<name>text</name>`.
    pub fn text_child(self, name: &str, text: impl Into<String>) -> Self {
        self.child(XmlElement::with_text(name, text))
    }

    /// Append `<name>text</name>` only when `text` is present and non-empty.
    pub fn opt_text_child(self, name: &str, text: Option<&str>) -> Self {
        match text.filter(|t| !t.is_empty()) {
            Some(t) => self.text_child(name, t),
            None => self,
        }
    }

    /// Append `child` only when present.
    pub fn opt_child(self, child: Option<XmlElement>) -> Self {
        match child {
            Some(c) => self.child(c),
            None => self,
        }
    }

    pub fn children_from(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
        for c in children {
            self.push(c);
        }
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// First direct child element with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|c| match c {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Render this element (no XML declaration).
    pub fn to_bytes(&self) -> Result<Vec<u8>, FacturaeError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        write_element(&mut writer, self)?;
        Ok(writer.into_inner().into_inner())
    }

    pub fn to_xml_string(&self) -> Result<String, FacturaeError> {
        into_string(self.to_bytes()?)
    }

    /// Render as a standalone document with an XML declaration.
    pub fn to_document(&self) -> Result<String, FacturaeError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped("\n")))
            .map_err(xml_io)?;
        write_element(&mut writer, self)?;
        into_string(writer.into_inner().into_inner())
    }
}

fn into_string(buf: Vec<u8>) -> Result<String, FacturaeError> {
    String::from_utf8(buf).map_err(|e| FacturaeError::Xml(format!("XML UTF-8 error: {e}")))
}

fn write_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    element: &XmlElement,
) -> Result<(), FacturaeError> {
    let mut attributes = element.attributes.clone();
    canonical_order(&mut attributes);

    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &attributes {
        let escaped = escape_attr_canonical(value);
        start.push_attribute((name.as_bytes(), escaped.as_bytes()));
    }
    writer.write_event(Event::Start(start)).map_err(xml_io)?;

    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::from_escaped(escape_text_canonical(t))))
                .map_err(xml_io)?,
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_io)?;
    Ok(())
}
