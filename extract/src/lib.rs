//! Card attribute extraction for PFP Battle.
//!
//! Image-to-text recognition is a pluggable collaborator; this crate
//! owns the contract around it plus the parsing of recognized card text
//! into attributes. Extraction never fails past this boundary: any
//! internal error degrades to the fallback attribute record.

mod extractor;
mod parser;

pub use extractor::*;
pub use parser::*;
