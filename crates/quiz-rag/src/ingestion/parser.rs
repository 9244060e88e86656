//! PDF validation and text extraction

use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, Result};

/// Text extracted from an uploaded PDF
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Extracted text content
    pub content: String,
    /// Number of pages
    pub total_pages: usize,
}

/// PDF parser
pub struct PdfParser;

impl PdfParser {
    /// Reject filenames without a `.pdf` extension
    pub fn check_filename(filename: &str) -> Result<()> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        if extension != "pdf" {
            return Err(Error::UnsupportedFileType(format!(
                "'{}' - only .pdf files are accepted",
                filename
            )));
        }
        Ok(())
    }

    /// Validate and extract a PDF upload
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        Self::check_filename(filename)?;

        if data.is_empty() {
            return Err(Error::invalid_input(format!("'{}' is empty", filename)));
        }

        let document = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("not a valid PDF: {}", e)))?;
        if document.is_encrypted() {
            return Err(Error::file_parse(filename, "encrypted PDFs are not supported"));
        }
        let total_pages = document.get_pages().len();

        let extracted = guarded_extract(filename, || pdf_extract::extract_text_from_mem(data))?;

        let content = normalize_text(&extracted);
        if content.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "no extractable text (scanned or image-only PDF?)",
            ));
        }

        tracing::debug!(
            "Extracted {} characters from {} pages of {}",
            content.chars().count(),
            total_pages,
            filename
        );

        Ok(ParsedDocument {
            content,
            total_pages,
        })
    }
}

/// Normalize line endings and page breaks, drop trailing whitespace per line
fn normalize_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\u{c}', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Run an extractor, turning both its errors and its panics into parse errors.
///
/// pdf-extract panics on some malformed fonts and streams.
fn guarded_extract<F, E>(filename: &str, extract: F) -> Result<String>
where
    F: FnOnce() -> std::result::Result<String, E>,
    E: std::fmt::Display,
{
    panic::catch_unwind(AssertUnwindSafe(extract))
        .map_err(|_| Error::file_parse(filename, "text extraction panicked"))?
        .map_err(|e| Error::file_parse(filename, e.to_string()))
}

/// Minimal single-page PDF for tests
#[cfg(test)]
pub(crate) fn sample_pdf(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_filename() {
        assert!(PdfParser::check_filename("notes.pdf").is_ok());
        assert!(PdfParser::check_filename("NOTES.PDF").is_ok());
        assert!(matches!(
            PdfParser::check_filename("notes.docx"),
            Err(Error::UnsupportedFileType(_))
        ));
        assert!(PdfParser::check_filename("pdf").is_err());
    }

    #[test]
    fn test_rejects_invalid_pdf() {
        let err = PdfParser::parse("notes.pdf", b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));

        let err = PdfParser::parse("notes.pdf", b"").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_extracts_text() {
        let data = sample_pdf("Mitochondria produce ATP");
        let parsed = PdfParser::parse("biology.pdf", &data).unwrap();

        assert_eq!(parsed.total_pages, 1);
        assert!(parsed.content.contains("Mitochondria"));
    }

    #[test]
    fn test_extraction_panic_is_parse_error() {
        let err = guarded_extract("broken.pdf", || -> std::result::Result<String, String> {
            panic!("unsupported font encoding")
        })
        .unwrap_err();
        match err {
            Error::FileParse { filename, message } => {
                assert_eq!(filename, "broken.pdf");
                assert!(message.contains("panicked"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = guarded_extract("broken.pdf", || Err::<String, _>("bad xref")).unwrap_err();
        assert!(err.to_string().contains("bad xref"));
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("a  \r\nb\u{c}c \n\n"), "a\nb\nc");
    }
}
