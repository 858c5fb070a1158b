// Export module - writes report documents to spreadsheet, text, PDF and JSON files

pub mod document;
pub mod json;
pub mod pdf;
pub mod xlsx;

pub use document::{write_document, DocumentLayout, DocumentRenderer, Section, TextRenderer};
pub use json::{to_json, write_json};
pub use pdf::PdfRenderer;
pub use xlsx::write_workbook;
