use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::escape::escape_attr_canonical;
use crate::core::FacturaeError;

/// True for `xmlns` and `xmlns:*` attribute names.
pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// Order attributes the way canonical output requires: namespace
/// declarations first, then ordinary attributes, each group sorted by name.
pub fn canonical_order(attributes: &mut [(String, String)]) {
    attributes.sort_by(|(a, _), (b, _)| {
        is_namespace_declaration(b)
            .cmp(&is_namespace_declaration(a))
            .then_with(|| a.cmp(b))
    });
}

/// Merge `declarations` into the root start tag of `fragment` and re-emit
/// that tag in canonical attribute order.
///
/// Everything after the root start tag is returned untouched. Declarations
/// already present on the root win over merged ones with the same name.
///
/// ```
/// use facturae::xml::inject_namespaces;
///
/// let out = inject_namespaces(
///     r#"<ds:KeyInfo Id="C1" xmlns:ds="urn:ds"><x/></ds:KeyInfo>"#,
///     &[("xmlns:fe", "urn:fe")],
/// )
/// .unwrap();
/// assert_eq!(out, r#"<ds:KeyInfo xmlns:ds="urn:ds" xmlns:fe="urn:fe" Id="C1"><x/></ds:KeyInfo>"#);
/// ```
pub fn inject_namespaces(
    fragment: &str,
    declarations: &[(&str, &str)],
) -> Result<String, FacturaeError> {
    let root = RootTag::parse(fragment)?;

    let mut attributes = root.attributes;
    for (name, value) in declarations {
        if !attributes.iter().any(|(n, _)| n == name) {
            attributes.push((name.to_string(), value.to_string()));
        }
    }
    canonical_order(&mut attributes);

    let mut out = String::with_capacity(fragment.len() + 64 * declarations.len());
    out.push_str(&fragment[..root.start]);
    out.push('<');
    out.push_str(&root.name);
    for (name, value) in &attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr_canonical(value));
        out.push('"');
    }
    out.push_str(if root.self_closing { "/>" } else { ">" });
    out.push_str(&fragment[root.end..]);
    Ok(out)
}

/// The first start tag of a fragment with its byte span.
pub(crate) struct RootTag {
    pub name: String,
    /// Unescaped attribute values in document order.
    pub attributes: Vec<(String, String)>,
    /// Offset of the `<` opening the tag.
    pub start: usize,
    /// Offset just past the closing `>`.
    pub end: usize,
    pub self_closing: bool,
}

impl RootTag {
    pub fn parse(fragment: &str) -> Result<Self, FacturaeError> {
        let mut reader = Reader::from_str(fragment);
        loop {
            let start = reader.buffer_position() as usize;
            let event = reader
                .read_event()
                .map_err(|e| FacturaeError::MalformedFragment(format!("root tag: {e}")))?;
            let end = reader.buffer_position() as usize;
            match event {
                Event::Start(tag) => return Self::from_tag(&tag, start, end, false),
                Event::Empty(tag) => return Self::from_tag(&tag, start, end, true),
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {}
                Event::Eof => {
                    return Err(FacturaeError::MalformedFragment(
                        "no root element".into(),
                    ));
                }
                other => {
                    return Err(FacturaeError::MalformedFragment(format!(
                        "unexpected content before root element: {other:?}"
                    )));
                }
            }
        }
    }

    fn from_tag(
        tag: &BytesStart<'_>,
        start: usize,
        end: usize,
        self_closing: bool,
    ) -> Result<Self, FacturaeError> {
        let name = utf8(tag.name().as_ref())?.to_string();
        let mut attributes = Vec::new();
        for attr in tag.attributes() {
            let attr = attr.map_err(|e| FacturaeError::MalformedFragment(e.to_string()))?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| FacturaeError::MalformedFragment(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            start,
            end,
            self_closing,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Namespace declarations carried by the tag.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter(|(n, _)| is_namespace_declaration(n))
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, FacturaeError> {
    std::str::from_utf8(bytes).map_err(|e| FacturaeError::MalformedFragment(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_before_attributes() {
        let out = inject_namespaces(
            r#"<a:Root b="2" xmlns:z="urn:z" a="1">body</a:Root>"#,
            &[("xmlns:c", "urn:c")],
        )
        .unwrap();
        assert_eq!(
            out,
            r#"<a:Root xmlns:c="urn:c" xmlns:z="urn:z" a="1" b="2">body</a:Root>"#
        );
    }

    #[test]
    fn existing_declaration_wins() {
        let out = inject_namespaces(r#"<r xmlns:x="urn:old"/>"#, &[("xmlns:x", "urn:new")]).unwrap();
        assert_eq!(out, r#"<r xmlns:x="urn:old"/>"#);
    }

    #[test]
    fn unclosed_root_tag() {
        let err = inject_namespaces(r#"<r attr="1""#, &[]).unwrap_err();
        assert!(matches!(err, FacturaeError::MalformedFragment(_)));
        assert!(inject_namespaces("", &[]).is_err());
    }

    #[test]
    fn remainder_untouched() {
        let fragment = r#"<r  b='x&amp;y'><child c="1"   a="2"/></r>"#;
        let out = inject_namespaces(fragment, &[]).unwrap();
        assert_eq!(out, r#"<r b="x&amp;y"><child c="1"   a="2"/></r>"#);
    }
}
