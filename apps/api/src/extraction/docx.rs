//! DOCX reader: pulls the body text out of `word/document.xml`.
//!
//! Paragraphs become lines, tabs and explicit breaks are kept, every other
//! tag is dropped.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the inflated size of `word/document.xml`.
const MAX_DOCUMENT_XML_BYTES: u64 = 32 * 1024 * 1024;

static PARAGRAPH_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("valid regex"));
static TAB_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:tab\s*/>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[xX]([0-9A-Fa-f]{1,6})|#([0-9]{1,7})|(lt|gt|quot|apos|amp));")
        .expect("valid regex")
});

pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    extract_docx_text_with_limit(bytes, MAX_DOCUMENT_XML_BYTES)
}

fn extract_docx_text_with_limit(bytes: &[u8], limit: u64) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Docx(format!("{DOCUMENT_PART}: {e}")))?;
    if part.size() > limit {
        return Err(too_large());
    }

    // The declared size comes from the archive header, so the read is capped too.
    let mut raw = Vec::new();
    part.take(limit + 1)
        .read_to_end(&mut raw)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;
    if raw.len() as u64 > limit {
        return Err(too_large());
    }
    let xml = String::from_utf8(raw).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    Ok(document_xml_to_text(&xml))
}

fn too_large() -> ExtractionError {
    ExtractionError::Docx("document too large".to_string())
}

fn document_xml_to_text(xml: &str) -> String {
    let text = PARAGRAPH_END_RE.replace_all(xml, "\n");
    let text = TAB_RE.replace_all(&text, "\t");
    let text = TAG_RE.replace_all(&text, "");
    unescape_xml(&text)
}

/// Decodes the predefined entities and numeric character references in one
/// pass. References to invalid code points are left as written.
fn unescape_xml(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let decoded = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = caps.get(2) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match caps.get(3).map(|m| m.as_str()) {
                    Some("lt") => Some('<'),
                    Some("gt") => Some('>'),
                    Some("quot") => Some('"'),
                    Some("apos") => Some('\''),
                    Some("amp") => Some('&'),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
