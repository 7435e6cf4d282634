//! PDF text extraction: layout-aware reader first, raw content-stream
//! reader second, OCR placeholder last.
//!
//! The OCR-over-rendered-pages stage is a black box this crate does not
//! ship; when both text readers come up empty the caller reports the
//! document as having no extractable text.

use std::fs;
use std::path::Path;

use super::{ExtractError, MAX_RAW_CHARS};

pub fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path)?;

    // Primary: layout-aware per-page extraction.
    let text = match pdf_extract::extract_text_from_mem_by_pages(&bytes) {
        Ok(pages) => {
            let mut text = String::new();
            for page in pages {
                text.push_str(&page);
                text.push('\n');
                if text.len() >= MAX_RAW_CHARS {
                    break;
                }
            }
            text
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "pdf-extract failed, trying raw reader");
            String::new()
        }
    };
    if !text.trim().is_empty() {
        return Ok(text);
    }

    // Secondary: lopdf content-stream text.
    let text = extract_with_lopdf(&bytes)?;
    if !text.trim().is_empty() {
        return Ok(text);
    }

    // Tertiary would be OCR over rendered pages; not available here.
    Err(ExtractError::NoTextLayer)
}

fn extract_with_lopdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| ExtractError::PdfParsing(e.to_string()))?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }
    doc.extract_text(&pages)
        .map_err(|e| ExtractError::PdfParsing(e.to_string()))
}

#[cfg(test)]
pub(crate) fn make_test_pdf(text: &str) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });

    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }

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
    use std::fs;

    #[test]
    fn digital_pdf_text_is_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, make_test_pdf("Official retention schedule")).unwrap();

        let text = extract_pdf(&path).unwrap();
        assert!(
            text.contains("Official") || text.contains("retention"),
            "got: {text}"
        );
    }

    #[test]
    fn invalid_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.pdf");
        fs::write(&path, "not a pdf").unwrap();
        assert!(extract_pdf(&path).is_err());
    }

    #[test]
    fn lopdf_fallback_reads_test_pdf() {
        let bytes = make_test_pdf("Fallback path");
        let text = extract_with_lopdf(&bytes).unwrap();
        assert!(text.contains("Fallback"), "got: {text}");
    }
}
