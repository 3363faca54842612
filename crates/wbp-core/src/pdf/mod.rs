//! PDF to text conversion.

mod extractor;

pub use extractor::{PdfExtractor, PdfPage};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF text sources.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Number of pages in the loaded PDF.
    fn page_count(&self) -> u32;

    /// Text of every page, in page order.
    fn extract_pages(&self) -> Result<Vec<PdfPage>>;
}

/// Join pages as `--- Page N ---` sections separated by blank lines.
/// Pages without text are left out.
pub fn render_pages(pages: &[PdfPage]) -> String {
    pages
        .iter()
        .filter(|page| !page.text.trim().is_empty())
        .map(|page| format!("--- Page {} ---\n{}", page.number, page.text.trim_end()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::rules::patterns::PAGE_MARKER;
    use pretty_assertions::assert_eq;

    fn page(number: u32, text: &str) -> PdfPage {
        PdfPage {
            number,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_render_skips_empty_pages() {
        let pages = vec![page(1, "First\n"), page(2, "  \n"), page(3, "Third")];
        assert_eq!(render_pages(&pages), "--- Page 1 ---\nFirst\n\n--- Page 3 ---\nThird");
    }

    #[test]
    fn test_rendered_markers_are_recognised() {
        let text = render_pages(&[page(7, "Meetings"), page(8, "Training Schools")]);
        let numbers: Vec<&str> = PAGE_MARKER
            .captures_iter(&text)
            .map(|caps| caps.get(1).map(|m| m.as_str()).unwrap_or(""))
            .collect();
        assert_eq!(numbers, vec!["7", "8"]);
    }
}
