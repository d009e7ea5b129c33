use std::borrow::Cow;

use crate::core::FacturaeError;

/// Escape the five XML-reserved characters (`& < > ' "`).
///
/// Safe for both attribute values and text nodes.
pub fn escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// Resolve entity and character references back to text.
pub fn unescape(text: &str) -> Result<String, FacturaeError> {
    quick_xml::escape::unescape(text)
        .map(Cow::into_owned)
        .map_err(|e| FacturaeError::Xml(format!("unescape error: {e}")))
}

/// Text node escaping as Canonical XML 1.0 writes it.
pub(crate) fn escape_text_canonical(text: &str) -> Cow<'_, str> {
    escape_with(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

/// Attribute value escaping as Canonical XML 1.0 writes it.
pub(crate) fn escape_attr_canonical(value: &str) -> Cow<'_, str> {
    escape_with(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

fn escape_with(input: &str, entity: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !input.chars().any(|c| entity(c).is_some()) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match entity(c) {
            Some(e) => out.push_str(e),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_reserved() {
        assert_eq!(
            escape(r#"Tom & Jerry's <"shop">"#),
            "Tom &amp; Jerry&apos;s &lt;&quot;shop&quot;&gt;"
        );
        assert_eq!(escape("Lámpara de pie"), "Lámpara de pie");
    }

    #[test]
    fn unescape_reverses_escape() {
        let raw = "a<b>&c'd\"e";
        assert_eq!(unescape(&escape(raw)).unwrap(), raw);
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(escape_text_canonical("a & \"b\" > c\r"), "a &amp; \"b\" &gt; c&#xD;");
        assert_eq!(escape_attr_canonical("x\"y>\n"), "x&quot;y>&#xA;");
        assert!(matches!(escape_text_canonical("plain"), Cow::Borrowed(_)));
    }
}
