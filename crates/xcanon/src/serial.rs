//! Canonical serialization
//!
//! Pretty-prints the canonicalized tree with two-space indentation and a
//! UTF-8 XML declaration. The returned bytes are the canonical
//! representative of the document's content; no rewriting happens after
//! serialization.

use crate::xml::{Document, Element};

const INDENT: &str = "  ";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Serialize a document to its canonical byte sequence.
pub fn to_canonical_bytes(doc: &Document) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push('\n');
    write_element(&doc.root, 0, &mut out);
    out.push('\n');
    out.into_bytes()
}

fn write_element(element: &Element, depth: usize, out: &mut String) {
    push_indent(out, depth);
    write_open_tag(element, out);
    if element.text.is_none() && element.children.is_empty() {
        return;
    }

    if let Some(text) = &element.text {
        out.push_str(&escape_xml(text));
        // mixed content stays inline
        for child in &element.children {
            write_element_inline(child, out);
        }
    } else {
        for child in &element.children {
            out.push('\n');
            write_element(child, depth + 1, out);
        }
        out.push('\n');
        push_indent(out, depth);
    }

    write_close_tag(element, out);
}

fn write_element_inline(element: &Element, out: &mut String) {
    write_open_tag(element, out);
    if element.text.is_none() && element.children.is_empty() {
        return;
    }
    if let Some(text) = &element.text {
        out.push_str(&escape_xml(text));
    }
    for child in &element.children {
        write_element_inline(child, out);
    }
    write_close_tag(element, out);
}

// Writes "<name attrs>" or a self-closing "<name attrs/>" when the element
// is empty.
fn write_open_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in element.attributes.iter() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_xml(value));
        out.push('"');
    }
    if element.text.is_none() && element.children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
    }
}

fn write_close_tag(element: &Element, out: &mut String) {
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Parser;

    fn roundtrip(input: &str) -> String {
        let doc = Parser::new(input.as_bytes())
            .parse()
            .unwrap_or_else(|e| panic!("fixture must parse: {e}"));
        String::from_utf8(to_canonical_bytes(&doc)).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_declaration_and_trailing_newline() {
        let out = roundtrip("<root/>");
        assert_eq!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root/>\n");
    }

    #[test]
    fn test_children_are_indented() {
        let out = roundtrip("<root><a><b/></a></root>");
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n  <a>\n    <b/>\n  </a>\n</root>\n"
        );
    }

    #[test]
    fn test_text_only_element_stays_on_one_line() {
        let out = roundtrip("<root><status>Open</status></root>");
        assert!(out.contains("\n  <status>Open</status>\n"));
    }

    #[test]
    fn test_attributes_and_text_are_escaped() {
        let out = roundtrip("<root note=\"a&amp;b\">x &lt; y</root>");
        assert!(out.contains("note=\"a&amp;b\""));
        assert!(out.contains(">x &lt; y<"));
    }
}
