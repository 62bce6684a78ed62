//! XML parser
//!
//! Recursive-descent parser over a byte cursor. Input is always decoded as
//! UTF-8, whatever encoding the XML declaration claims. Comments and
//! processing instructions are stripped while parsing; CDATA sections become
//! ordinary text. An internal DTD subset is scanned only for `<!ATTLIST>`
//! defaults, which are materialized onto elements that do not set the
//! attribute explicitly, so canonical output does not depend on whether a
//! default was spelled out in the source.

use indexmap::IndexMap;

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::model::{Document, Element};

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    // element name -> declared attribute defaults, in declaration order
    attlist_defaults: IndexMap<String, Vec<(String, String)>>,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(input),
            attlist_defaults: IndexMap::new(),
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        self.skip_prolog()?;
        let mut root = self.parse_element()?;
        self.skip_trailing_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::InvalidToken, "content after document element"));
        }

        apply_attlist_defaults(&mut root, &self.attlist_defaults);
        Ok(Document { root })
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            return Ok(Element {
                name,
                attributes,
                text: None,
                children: Vec::new(),
            });
        }

        self.expect_byte(b'>')?;

        let mut text: Option<String> = None;
        let mut children = Vec::new();
        loop {
            if self.cursor.is_eof() {
                return Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated element"));
            }

            if self.lookahead(b"</") {
                self.cursor.advance_by(2);
                let close = self.parse_name()?;
                if close != name {
                    return Err(self.error_here_kind(ErrorKind::MismatchedTag {
                        open: name.clone(),
                        close,
                    }));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.lookahead(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
                continue;
            }

            if self.lookahead(b"<![CDATA[") {
                self.cursor.advance_by(9);
                let raw = self.take_until(b"]]>")?;
                append_text(&mut text, &bytes_to_string(raw)?);
                continue;
            }

            if self.lookahead(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                children.push(self.parse_element()?);
                continue;
            }

            if let Some(chunk) = self.parse_text()? {
                append_text(&mut text, &chunk);
            }
        }

        Ok(Element {
            name,
            attributes,
            text,
            children,
        })
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => {
                    return Err(
                        self.error_here(ErrorKind::UnterminatedMarkup, "unexpected end of input")
                    );
                }
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_quoted_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_here_kind(ErrorKind::DuplicateAttribute { name }));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_quoted_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here(ErrorKind::InvalidToken, "expected quoted value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_string(raw)?;
                return decode_entities(&text);
            }
            self.cursor.advance();
        }

        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated attribute value"))
    }

    // Text run up to the next markup. Whitespace-only runs between elements
    // are insignificant and produce None.
    fn parse_text(&mut self) -> Result<Option<String>> {
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        let text = bytes_to_string(raw)?;
        let text = decode_entities(&text)?;

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        let Some(first) = self.cursor.current() else {
            return Err(self.error_here(ErrorKind::InvalidToken, "expected name"));
        };
        if !is_name_start(first) {
            return Err(Error::at(
                ErrorKind::InvalidToken,
                start_pos.offset,
                start_pos.line,
                start_pos.col,
            ));
        }

        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let raw = self.cursor.slice_from(start);
        bytes_to_string(raw)
    }

    // Whitespace, comments, processing instructions (the XML declaration
    // included) and an optional DOCTYPE, before the document element.
    fn skip_prolog(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.lookahead(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
            } else if self.lookahead(b"<!DOCTYPE") {
                self.cursor.advance_by(9);
                self.parse_doctype()?;
            } else if self.lookahead(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_trailing_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.lookahead(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
            } else if self.lookahead(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
            } else {
                return Ok(());
            }
        }
    }

    // The DOCTYPE name and any external identifier are scanned past without
    // loading anything; only the internal subset is inspected.
    fn parse_doctype(&mut self) -> Result<()> {
        loop {
            match self.cursor.current() {
                Some(b'[') => {
                    self.cursor.advance();
                    self.parse_internal_subset()?;
                }
                Some(b'>') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some(b'"') | Some(b'\'') => self.skip_quoted()?,
                Some(_) => self.cursor.advance(),
                None => {
                    return Err(
                        self.error_here(ErrorKind::UnterminatedMarkup, "unterminated doctype")
                    );
                }
            }
        }
    }

    fn parse_internal_subset(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b']') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some(b'<') => {
                    if self.lookahead(b"<!--") {
                        self.cursor.advance_by(4);
                        self.skip_until(b"-->")?;
                    } else if self.lookahead(b"<!ATTLIST") {
                        self.cursor.advance_by(9);
                        self.parse_attlist()?;
                    } else {
                        // ELEMENT, ENTITY and NOTATION declarations carry no
                        // attribute defaults
                        self.skip_declaration()?;
                    }
                }
                Some(b'%') => {
                    self.cursor.advance();
                    self.skip_until(b";")?;
                }
                Some(_) => self.cursor.advance(),
                None => {
                    return Err(self
                        .error_here(ErrorKind::UnterminatedMarkup, "unterminated internal subset"));
                }
            }
        }
    }

    // <!ATTLIST element (attr type default)*>
    fn parse_attlist(&mut self) -> Result<()> {
        self.cursor.skip_whitespace();
        let element = self.parse_name()?;

        loop {
            self.cursor.skip_whitespace();
            if self.cursor.consume(b'>') {
                return Ok(());
            }
            if self.cursor.is_eof() {
                return Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated attlist"));
            }

            let attr = self.parse_name()?;
            self.cursor.skip_whitespace();

            // attribute type: an enumeration, or a keyword such as CDATA or
            // ID; NOTATION is followed by its own enumeration
            if self.cursor.current() == Some(b'(') {
                self.skip_enumeration()?;
            } else {
                let type_keyword = self.parse_name()?;
                if type_keyword == "NOTATION" {
                    self.cursor.skip_whitespace();
                    if self.cursor.current() == Some(b'(') {
                        self.skip_enumeration()?;
                    }
                }
            }
            self.cursor.skip_whitespace();

            // default declaration: #REQUIRED | #IMPLIED | [#FIXED] literal
            if self.cursor.current() == Some(b'#') {
                self.cursor.advance();
                let keyword = self.parse_name()?;
                match keyword.as_str() {
                    "REQUIRED" | "IMPLIED" => continue,
                    "FIXED" => self.cursor.skip_whitespace(),
                    _ => {
                        return Err(
                            self.error_here(ErrorKind::InvalidToken, "unknown default declaration")
                        );
                    }
                }
            }
            let value = self.parse_quoted_value()?;

            let declared = self.attlist_defaults.entry(element.clone()).or_default();
            // the first declaration of an attribute wins
            if !declared.iter().any(|(name, _)| name == &attr) {
                declared.push((attr, value));
            }
        }
    }

    fn skip_enumeration(&mut self) -> Result<()> {
        // cursor at '('
        self.cursor.advance();
        self.skip_until(b")")
    }

    fn skip_quoted(&mut self) -> Result<()> {
        let Some(quote) = self.cursor.current() else {
            return Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated literal"));
        };
        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                self.cursor.advance();
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated literal"))
    }

    fn skip_declaration(&mut self) -> Result<()> {
        loop {
            match self.cursor.current() {
                Some(b'>') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some(b'"') | Some(b'\'') => self.skip_quoted()?,
                Some(_) => self.cursor.advance(),
                None => {
                    return Err(
                        self.error_here(ErrorKind::UnterminatedMarkup, "unterminated declaration")
                    );
                }
            }
        }
    }

    fn lookahead(&self, pattern: &[u8]) -> bool {
        self.cursor.peek_bytes(pattern.len()) == Some(pattern)
    }

    fn take_until(&mut self, pattern: &[u8]) -> Result<&'a [u8]> {
        let start = self.cursor.pos();
        while self.cursor.current().is_some() {
            if self.cursor.peek_bytes(pattern.len()) == Some(pattern) {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                return Ok(raw);
            }
            self.cursor.advance();
        }
        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated markup"))
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        self.take_until(pattern).map(|_| ())
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            let found = match self.cursor.current() {
                Some(b) => format!("'{}'", char::from(b)),
                None => "end of input".to_string(),
            };
            Err(self.error_here_kind(ErrorKind::Expected {
                expected: format!("'{}'", char::from(expected)),
                found,
            }))
        }
    }

    fn error_here(&self, kind: ErrorKind, message: &str) -> Error {
        let pos = self.cursor.position();
        Error::with_message(kind, Span::new(pos, pos), message.to_string())
    }

    fn error_here_kind(&self, kind: ErrorKind) -> Error {
        let pos = self.cursor.position();
        Error::new(kind, Span::new(pos, pos))
    }
}

fn append_text(text: &mut Option<String>, chunk: &str) {
    match text {
        Some(existing) => existing.push_str(chunk),
        None => *text = Some(chunk.to_string()),
    }
}

fn apply_attlist_defaults(
    element: &mut Element,
    defaults: &IndexMap<String, Vec<(String, String)>>,
) {
    if let Some(declared) = defaults.get(&element.name) {
        for (attr, value) in declared {
            if !element.attributes.contains_key(attr) {
                element.attributes.insert(attr.clone(), value.clone());
            }
        }
    }
    for child in &mut element.children {
        apply_attlist_defaults(child, defaults);
    }
}

fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| Error::new(ErrorKind::InvalidUtf8, Span::empty()))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':')
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }

        let mut entity = String::new();
        for next in chars.by_ref() {
            if next == ';' {
                break;
            }
            entity.push(next);
        }

        let decoded = match entity.as_str() {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(&entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::new(
                    ErrorKind::InvalidEntity { entity },
                    Span::empty(),
                ));
            }
        }
    }

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Document> {
        Parser::new(input.as_bytes()).parse()
    }

    #[test]
    fn test_parse_simple_element() -> Result<()> {
        let doc = parse("<complaintsRoot></complaintsRoot>")?;
        assert_eq!(doc.root.name, "complaintsRoot");
        assert!(doc.root.children.is_empty());
        assert!(doc.root.text.is_none());
        Ok(())
    }

    #[test]
    fn test_parse_with_attributes() -> Result<()> {
        let doc = parse("<complaint id=\"1\" status='Open'></complaint>")?;
        assert_eq!(doc.root.attr("id"), Some("1"));
        assert_eq!(doc.root.attr("status"), Some("Open"));
        Ok(())
    }

    #[test]
    fn test_parse_nested_with_text() -> Result<()> {
        let doc = parse("<complaint id=\"1\"><publicResponse>noted</publicResponse></complaint>")?;
        let child = doc.root.children.first().ok_or_else(|| {
            Error::with_message(ErrorKind::InvalidToken, Span::empty(), "missing child")
        })?;
        assert_eq!(child.name, "publicResponse");
        assert_eq!(child.text.as_deref(), Some("noted"));
        Ok(())
    }

    #[test]
    fn test_parse_self_closing() -> Result<()> {
        let doc = parse("<complaint><submitted via=\"Web\"/></complaint>")?;
        let child = doc.root.children.first().ok_or_else(|| {
            Error::with_message(ErrorKind::InvalidToken, Span::empty(), "missing child")
        })?;
        assert_eq!(child.name, "submitted");
        assert_eq!(child.attr("via"), Some("Web"));
        assert!(child.children.is_empty());
        Ok(())
    }

    #[test]
    fn test_xml_declaration_and_comments_are_stripped() -> Result<()> {
        let doc = parse(
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!-- header -->\n<root><!-- inner --><a/></root>\n<!-- trailer -->",
        )?;
        assert_eq!(doc.root.children.len(), 1);
        Ok(())
    }

    #[test]
    fn test_cdata_becomes_text() -> Result<()> {
        let doc = parse("<note><![CDATA[a < b & c]]></note>")?;
        assert_eq!(doc.root.text.as_deref(), Some("a < b & c"));
        Ok(())
    }

    #[test]
    fn test_entities_are_decoded() -> Result<()> {
        let doc = parse("<note attr=\"&quot;x&quot;\">&lt;tag&gt; &amp; &#65;</note>")?;
        assert_eq!(doc.root.attr("attr"), Some("\"x\""));
        assert_eq!(doc.root.text.as_deref(), Some("<tag> & A"));
        Ok(())
    }

    #[test]
    fn test_attlist_default_is_materialized() -> Result<()> {
        let doc = parse(
            "<!DOCTYPE root [\n  <!ATTLIST item kind CDATA \"basic\">\n]>\n<root><item/><item kind=\"custom\"/></root>",
        )?;
        let first = &doc.root.children[0];
        let second = &doc.root.children[1];
        assert_eq!(first.attr("kind"), Some("basic"));
        assert_eq!(second.attr("kind"), Some("custom"));
        Ok(())
    }

    #[test]
    fn test_attlist_required_and_fixed() -> Result<()> {
        let doc = parse(
            "<!DOCTYPE root [\n  <!ATTLIST item id ID #REQUIRED state (on|off) #FIXED \"on\">\n]>\n<root><item id=\"1\"/></root>",
        )?;
        let item = &doc.root.children[0];
        assert_eq!(item.attr("id"), Some("1"));
        assert_eq!(item.attr("state"), Some("on"));
        Ok(())
    }

    #[test]
    fn test_mismatched_tag_is_rejected() {
        let err = parse("<a><b></c></a>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MismatchedTag { .. }));
    }

    #[test]
    fn test_duplicate_attribute_is_rejected() {
        let err = parse("<a id=\"1\" id=\"2\"/>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DuplicateAttribute { .. }));
    }

    #[test]
    fn test_unterminated_element_is_rejected() {
        let err = parse("<a><b>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnterminatedMarkup));
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let err = parse("<a>&bogus;</a>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidEntity { .. }));
    }

    #[test]
    fn test_content_after_root_is_rejected() {
        let err = parse("<a/><b/>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidToken));
    }
}
