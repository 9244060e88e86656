//! PDF ingestion: validation, text extraction and chunking

mod chunker;
mod parser;

pub use chunker::{chunk_text, TextChunker};
pub use parser::{ParsedDocument, PdfParser};

#[cfg(test)]
pub(crate) use parser::sample_pdf;
