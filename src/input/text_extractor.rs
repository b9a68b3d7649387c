//! Text extraction from resume documents

use crate::error::{AtsError, Result};
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::OnceLock;
use zip::ZipArchive;

pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            AtsError::ExtractionFailure(format!("Failed to extract text from PDF: {}", e))
        })
    }
}

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            AtsError::ExtractionFailure(format!("DOCX is not a valid zip container: {}", e))
        })?;

        let mut xml = String::new();
        let mut document = archive.by_name("word/document.xml").map_err(|e| {
            AtsError::ExtractionFailure(format!("DOCX has no word/document.xml: {}", e))
        })?;
        document.read_to_string(&mut xml).map_err(|e| {
            AtsError::ExtractionFailure(format!("Failed to read DOCX body: {}", e))
        })?;

        Ok(self.xml_to_text(&xml))
    }
}

impl DocxExtractor {
    fn xml_to_text(&self, xml: &str) -> String {
        static BREAKS: OnceLock<Regex> = OnceLock::new();
        static TABS: OnceLock<Regex> = OnceLock::new();
        static TAGS: OnceLock<Regex> = OnceLock::new();
        let breaks = BREAKS.get_or_init(|| {
            Regex::new(r"<w:br[^>]*/>|<w:cr[^>]*/>|</w:p>").expect("Invalid break regex")
        });
        let tabs = TABS.get_or_init(|| Regex::new(r"<w:tab[^>]*/>").expect("Invalid tab regex"));
        let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));

        let text = breaks.replace_all(xml, "\n");
        let text = tabs.replace_all(&text, "\t");
        let text = tags.replace_all(&text, "");
        let text = decode_entities(&text);

        let lines: Vec<String> = text
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        lines.join("\n")
    }
}

/// Decode the predefined XML entities and numeric character references in
/// one pass, so `&amp;lt;` stays `&lt;`. Unknown entities are left as-is.
fn decode_entities(text: &str) -> String {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let entity = ENTITY.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("Invalid entity regex")
    });

    entity
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name.strip_prefix('#').and_then(|dec| dec.parse().ok()),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Compound-file signature shared by legacy Office documents.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const MIN_RUN_CHARS: usize = 4;

/// Legacy Word extractor. Recovers printable text runs from the binary
/// stream; lossy, and may pick up font or style names.
pub struct DocExtractor;

impl TextExtractor for DocExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        if !bytes.starts_with(&OLE_MAGIC) {
            return Err(AtsError::ExtractionFailure(
                "DOC file is missing the compound document signature".to_string(),
            ));
        }

        let candidates = [
            byte_runs(bytes),
            utf16_runs(bytes),
            utf16_runs(bytes.get(1..).unwrap_or_default()),
        ];
        let text = candidates
            .into_iter()
            .max_by_key(|runs| runs.iter().map(|r| r.len()).sum::<usize>())
            .unwrap_or_default()
            .join("\n");

        if text.trim().is_empty() {
            return Err(AtsError::ExtractionFailure(
                "No readable text found in DOC file".to_string(),
            ));
        }
        Ok(text)
    }
}

fn is_text_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || (' '..='~').contains(&c)
        || ('\u{00A0}'..='\u{024F}').contains(&c)
        || ('\u{2010}'..='\u{2027}').contains(&c)
}

fn push_run(runs: &mut Vec<String>, current: &mut String) {
    let run = current.replace('\r', "\n");
    if run.trim().chars().count() >= MIN_RUN_CHARS {
        runs.push(run.trim().to_string());
    }
    current.clear();
}

fn byte_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for &b in bytes {
        let c = b as char;
        if b < 0x80 && is_text_char(c) {
            current.push(c);
        } else {
            push_run(&mut runs, &mut current);
        }
    }
    push_run(&mut runs, &mut current);
    runs
}

fn utf16_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        match char::from_u32(u32::from(unit)).filter(|c| is_text_char(*c)) {
            Some(c) => current.push(c),
            None => push_run(&mut runs, &mut current),
        }
    }
    push_run(&mut runs, &mut current);
    runs
}
