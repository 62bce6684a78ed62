//! Canonicalization passes
//!
//! Each pass is an independent transform over the mutable element tree, so
//! every rewrite rule can be tested in isolation. [`canonicalize_document`]
//! sequences them in the order that defines the canonical form:
//!
//! 1. trim text, collapsing free-text fields to a single line
//! 2. trim attribute values and sort attributes by name
//! 3. normalize yes/no response flags (validating one response per record)
//! 4. sort children at every level by tag name
//! 5. migrate `submitted via="..."` to a `submissionType` attribute
//! 6. sort the records under the root by their `id` attribute

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::{Document, Element};

const RECORD_TAG: &str = "complaint";
const RESPONSE_TAG: &str = "response";
const SUBMITTED_TAG: &str = "submitted";
const VIA_ATTR: &str = "via";
const SUBMISSION_TYPE_ATTR: &str = "submissionType";
const ID_ATTR: &str = "id";

// free-text fields whose line ends are collapsed
const FREE_TEXT_TAGS: [&str; 2] = ["consumerNarrative", "publicResponse"];

/// Run all canonicalization passes over a parsed document, in place.
pub fn canonicalize_document(doc: &mut Document) -> Result<()> {
    trim_text(&mut doc.root);
    normalize_attributes(&mut doc.root);
    normalize_response_flags(&mut doc.root)?;
    sort_children_by_tag(&mut doc.root);
    migrate_submission(&mut doc.root)?;
    sort_records_by_id(&mut doc.root)?;
    Ok(())
}

/// Pass 1: strip insignificant whitespace from text content. Free-text
/// fields additionally have their lines rejoined with single spaces, so
/// multi-line narratives collapse to one line with word boundaries intact.
pub fn trim_text(element: &mut Element) {
    if let Some(text) = element.text.take() {
        let normalized = if FREE_TEXT_TAGS.contains(&element.name.as_str()) {
            normalize_line_ends(&text)
        } else {
            text.trim().to_string()
        };
        if !normalized.is_empty() {
            element.text = Some(normalized);
        }
    }
    for child in &mut element.children {
        trim_text(child);
    }
}

fn normalize_line_ends(text: &str) -> String {
    let lines: Vec<&str> = text.trim().split('\n').map(str::trim).collect();
    lines.join(" ")
}

/// Pass 2: trim every attribute value and order attributes by name
/// ascending. The map is conceptually unordered; the sort makes
/// serialization deterministic.
pub fn normalize_attributes(element: &mut Element) {
    for value in element.attributes.values_mut() {
        *value = value.trim().to_string();
    }
    element.attributes.sort_keys();
    for child in &mut element.children {
        normalize_attributes(child);
    }
}

/// Pass 3: rewrite yes/no-valued attributes of `response` elements to the
/// canonical `Y`/`N`. Every complaint must carry exactly one response child.
pub fn normalize_response_flags(element: &mut Element) -> Result<()> {
    if element.name == RECORD_TAG {
        let found = element
            .children
            .iter()
            .filter(|child| child.name == RESPONSE_TAG)
            .count();
        if found != 1 {
            return Err(schema_violation(ErrorKind::ResponseCount {
                id: record_id(element),
                found,
            }));
        }
    }
    if element.name == RESPONSE_TAG {
        uniform_yes_no(element);
    }
    for child in &mut element.children {
        normalize_response_flags(child)?;
    }
    Ok(())
}

fn uniform_yes_no(element: &mut Element) {
    for value in element.attributes.values_mut() {
        if value.eq_ignore_ascii_case("y") || value.eq_ignore_ascii_case("yes") {
            *value = "Y".to_string();
        } else if value.eq_ignore_ascii_case("n") || value.eq_ignore_ascii_case("no") {
            *value = "N".to_string();
        }
    }
}

/// Pass 4: sort children at every level by tag name ascending. The sort is
/// stable, so equal tags keep their relative order.
pub fn sort_children_by_tag(element: &mut Element) {
    element.children.sort_by(|a, b| a.name.cmp(&b.name));
    for child in &mut element.children {
        sort_children_by_tag(child);
    }
}

/// Pass 5: migrate the legacy nested `submitted via="..."` element into a
/// flat `submissionType` attribute on the complaint, then drop the
/// `submitted` element. At most one `submitted` per complaint.
pub fn migrate_submission(element: &mut Element) -> Result<()> {
    if element.name == RECORD_TAG {
        let found = count_descendants(element, SUBMITTED_TAG);
        if found > 1 {
            return Err(schema_violation(ErrorKind::DuplicateSubmitted {
                id: record_id(element),
            }));
        }
        if found == 1 {
            if let Some(submitted) = remove_first_descendant(element, SUBMITTED_TAG) {
                if let Some(via) = submitted.attr(VIA_ATTR) {
                    element
                        .attributes
                        .insert(SUBMISSION_TYPE_ATTR.to_string(), via.to_string());
                    // keep the attribute-order invariant after the insert
                    element.attributes.sort_keys();
                }
            }
        }
    }
    for child in &mut element.children {
        migrate_submission(child)?;
    }
    Ok(())
}

/// Pass 6: sort the root's immediate children by their `id` attribute.
/// Applied last so final ordering follows the record's primary identifier
/// rather than its tag. Ids compare as strings, not numbers.
pub fn sort_records_by_id(root: &mut Element) -> Result<()> {
    for record in &root.children {
        if record.attr(ID_ATTR).is_none() {
            return Err(schema_violation(ErrorKind::MissingRecordId {
                tag: record.name.clone(),
            }));
        }
    }
    root.children.sort_by(|a, b| {
        a.attr(ID_ATTR)
            .unwrap_or_default()
            .cmp(b.attr(ID_ATTR).unwrap_or_default())
    });
    Ok(())
}

fn record_id(element: &Element) -> String {
    element.attr(ID_ATTR).unwrap_or("<unknown>").to_string()
}

fn schema_violation(kind: ErrorKind) -> Error {
    Error::new(kind, Span::empty())
}

fn count_descendants(element: &Element, name: &str) -> usize {
    element
        .children
        .iter()
        .map(|child| usize::from(child.name == name) + count_descendants(child, name))
        .sum()
}

fn remove_first_descendant(element: &mut Element, name: &str) -> Option<Element> {
    if let Some(idx) = element.children.iter().position(|child| child.name == name) {
        return Some(element.children.remove(idx));
    }
    for child in &mut element.children {
        if let Some(found) = remove_first_descendant(child, name) {
            return Some(found);
        }
    }
    None
}
