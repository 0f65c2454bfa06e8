//! Report rendering and archiving adapters.

mod file_archive;
mod pdf_renderer;

pub use file_archive::FileReportArchive;
pub use pdf_renderer::PdfReportRenderer;
