//! Report extraction module.

pub mod ffr;
mod parser;
mod records;
pub mod rules;

pub use ffr::FfrParser;
pub use parser::WbpParser;

use crate::source::SourceDocument;

/// Trait for report parsers.
///
/// Parsing never fails: problems in the text are recorded as warnings on the
/// output and the affected fields fall back to their empty values.
pub trait ReportParser {
    /// What the parser produces for one document.
    type Output;

    /// Parse one source document.
    fn parse(&self, document: &SourceDocument) -> Self::Output;
}
