//! Plain-text reading with a secondary-encoding retry.
//!
//! UTF-8 first; on invalid UTF-8 the bytes are decoded as Windows-1252,
//! which accepts any byte sequence. A text file therefore never fails on
//! encoding — only on I/O.

use std::fs;
use std::path::Path;

use super::{ExtractError, MAX_RAW_CHARS};

pub fn read_text_file(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path)?;
    let mut text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            if had_errors {
                tracing::debug!(path = %path.display(), "Lossy Windows-1252 decode");
            }
            decoded.into_owned()
        }
    };
    if text.len() > MAX_RAW_CHARS {
        let cut = floor_char_boundary(&text, MAX_RAW_CHARS);
        text.truncate(cut);
    }
    Ok(text)
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
