//! Office document readers: OOXML text runs out of the ZIP container
//! (.docx/.pptx), OpenDocument content (.odt), spreadsheet cells via
//! calamine (.xlsx).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader as _};
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::{ExtractError, MAX_RAW_CHARS};

/// Word document: text runs (`<w:t>`) in `word/document.xml`.
pub fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let mut archive = open_archive(path)?;
    let xml = read_member(&mut archive, "word/document.xml")?;
    collect_text_runs(&xml)
}

/// Presentation: text runs (`<a:t>`) across `ppt/slides/slide*.xml`,
/// in slide order.
pub fn extract_pptx(path: &Path) -> Result<String, ExtractError> {
    let mut archive = open_archive(path)?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(String::from)
        .collect();
    slide_names.sort();

    let mut out = String::new();
    for name in slide_names {
        let xml = read_member(&mut archive, &name)?;
        let slide_text = collect_text_runs(&xml)?;
        if !slide_text.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&slide_text);
        }
        if out.len() >= MAX_RAW_CHARS {
            break;
        }
    }
    Ok(out)
}

/// OpenDocument text: all character data in `content.xml`.
pub fn extract_odt(path: &Path) -> Result<String, ExtractError> {
    let mut archive = open_archive(path)?;
    let xml = read_member(&mut archive, "content.xml")?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let piece = t.unescape().unwrap_or_default();
                if !piece.trim().is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(piece.trim());
                }
                if out.len() >= MAX_RAW_CHARS {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Xml(e.to_string())),
            _ => {}
        }
    }
    Ok(out)
}

/// Spreadsheet: every non-empty cell stringified, sheet by sheet.
pub fn extract_xlsx(path: &Path) -> Result<String, ExtractError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ExtractError::Workbook(e.to_string()))?;
    let sheet_names = workbook.sheet_names().to_owned();

    let mut out = String::new();
    'sheets: for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ExtractError::Workbook(e.to_string()))?;
        for row in range.rows() {
            for cell in row {
                if matches!(cell, Data::Empty) {
                    continue;
                }
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&cell.to_string());
                if out.len() >= MAX_RAW_CHARS {
                    break 'sheets;
                }
            }
        }
    }
    Ok(out)
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>, ExtractError> {
    let file = File::open(path)?;
    ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))
}

fn read_member(archive: &mut ZipArchive<File>, name: &str) -> Result<String, ExtractError> {
    let mut member = archive
        .by_name(name)
        .map_err(|e| ExtractError::Archive(format!("{name}: {e}")))?;
    let mut xml = String::new();
    member
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Archive(format!("{name}: {e}")))?;
    Ok(xml)
}

/// Concatenate the character data of every `<...:t>` element. Covers both
/// WordprocessingML (`w:t`) and DrawingML (`a:t`) text runs.
fn collect_text_runs(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text_run = false,
            Ok(Event::Text(t)) if in_text_run => {
                let piece = t.unescape().unwrap_or_default();
                if !piece.is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(&piece);
                }
                if out.len() >= MAX_RAW_CHARS {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Xml(e.to_string())),
            _ => {}
        }
    }
    Ok(out)
}
