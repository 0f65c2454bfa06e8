//! A4 PDF rendering of country reports with `printpdf`.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::domain::CountryReport;
use crate::domain::ports::{ReportRenderError, ReportRenderer};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const HEADING_SIZE: f32 = 20.0;
const BODY_SIZE: f32 = 12.0;
const LINE_SPACING_MM: f32 = 9.0;

/// Renders each report line as a row of Helvetica text on a single page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReportRenderer;

impl PdfReportRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ReportRenderer for PdfReportRenderer {
    fn render(&self, report: &CountryReport) -> Result<Vec<u8>, ReportRenderError> {
        let (doc, page, layer) = PdfDocument::new(
            report.title(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Report",
        );
        let heading = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|err| ReportRenderError::render(err.to_string()))?;
        let body = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| ReportRenderError::render(err.to_string()))?;

        let canvas = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        for (index, line) in report.lines().iter().enumerate() {
            if index == 0 {
                canvas.use_text(line.as_str(), HEADING_SIZE, Mm(MARGIN_MM), Mm(y), &heading);
                y -= LINE_SPACING_MM * 1.5;
            } else {
                canvas.use_text(line.as_str(), BODY_SIZE, Mm(MARGIN_MM), Mm(y), &body);
                y -= LINE_SPACING_MM;
            }
        }

        doc.save_to_bytes()
            .map_err(|err| ReportRenderError::render(err.to_string()))
    }
}
