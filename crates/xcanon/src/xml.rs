//! Complaint-record XML model and parser

pub mod model;
pub mod parser;

pub use model::{Document, Element};
pub use parser::Parser;
