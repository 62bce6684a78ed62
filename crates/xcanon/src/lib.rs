//! xcanon - canonicalizer for complaint-record XML documents
//!
//! Rewrites an XML document into a deterministic canonical form (whitespace
//! and attribute normalization, tag- and id-ordered elements, yes/no
//! vocabulary unification, submission-type schema migration) so that
//! semantically equivalent documents serialize to identical bytes.
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> xcanon::Result<()> {
//! let a = xcanon::canonicalize_str(
//!     "<complaintsRoot><complaint id=\"1\"><response timely=\"yes\"/></complaint></complaintsRoot>",
//! )?;
//! let b = xcanon::canonicalize_str(
//!     "<complaintsRoot><complaint id=\"1\"><response timely=\"Y\" /></complaint></complaintsRoot>",
//! )?;
//! assert!(xcanon::compare(&a, &b));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod cursor;
pub use cursor::Cursor;

pub mod xml;
pub use xml::{Document, Element, Parser};

pub mod canon;
pub use canon::canonicalize_document;

pub mod serial;
pub use serial::to_canonical_bytes;

pub mod compare;
pub use compare::{checksum, compare};

use std::path::Path;

/// Canonicalize the XML document at `path` and return its canonical bytes.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        Error::with_message(
            ErrorKind::Io {
                path: path.display().to_string(),
            },
            Span::empty(),
            e.to_string(),
        )
    })?;
    canonicalize_bytes(&bytes)
}

/// Canonicalize an XML document held in memory.
pub fn canonicalize_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut parser = Parser::new(bytes);
    let mut doc = parser.parse()?;
    canonicalize_document(&mut doc)?;
    Ok(to_canonical_bytes(&doc))
}

/// Canonicalize an XML document held in a string.
pub fn canonicalize_str(s: &str) -> Result<Vec<u8>> {
    canonicalize_bytes(s.as_bytes())
}
