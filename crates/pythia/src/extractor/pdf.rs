//! PDF text and structure extraction.

use super::Extractor;
use lopdf::{Dictionary, Document, Object};
use pythia_db::FileRecord;
use serde_json::Value;
use tracing::debug;

const MAX_OUTLINE_NODES: usize = 4096;
const MAX_OUTLINE_DEPTH: usize = 32;

/// Extracts page text, the document info dictionary and outline
/// (chapter) titles.
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn process(&self, file: &mut FileRecord) -> bool {
        let bytes = match std::fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %file.path, error = %e, "Failed to read PDF");
                return false;
            }
        };

        let text = match pdf_extract::extract_text_from_mem(&bytes) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %file.path, error = %e, "Failed to extract PDF text");
                return false;
            }
        };

        let mut meta = serde_json::Map::new();
        if let Ok(doc) = Document::load_mem(&bytes) {
            for (key, value) in info_entries(&doc) {
                meta.insert(key, Value::String(value));
            }
            let chapters = outline_titles(&doc);
            if !chapters.is_empty() {
                meta.insert(
                    "chapters".to_string(),
                    Value::Array(chapters.into_iter().map(Value::String).collect()),
                );
            }
        }

        file.content = text;
        file.meta = meta;
        true
    }
}

/// String-valued entries of the trailer's Info dictionary.
fn info_entries(doc: &Document) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let Some(info) = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return entries;
    };

    for (key, value) in info.iter() {
        if let Some(text) = resolve_string(doc, value) {
            entries.push((String::from_utf8_lossy(key).into_owned(), text));
        }
    }
    entries
}

/// Titles of the outline tree, in document order.
fn outline_titles(doc: &Document) -> Vec<String> {
    let mut titles = Vec::new();
    let Some(outlines) = doc
        .catalog()
        .ok()
        .and_then(|catalog| catalog.get(b"Outlines").ok())
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return titles;
    };

    let mut budget = MAX_OUTLINE_NODES;
    walk_outline(doc, outlines, &mut titles, &mut budget, 0);
    titles
}

fn walk_outline(
    doc: &Document,
    node: &Dictionary,
    titles: &mut Vec<String>,
    budget: &mut usize,
    depth: usize,
) {
    if depth > MAX_OUTLINE_DEPTH {
        return;
    }
    let mut child = node.get(b"First").ok().and_then(|obj| resolve_dict(doc, obj));
    while let Some(item) = child {
        // Charge every node visited, not just titled ones; corrupt
        // documents can carry cyclic Next chains.
        if *budget == 0 {
            return;
        }
        *budget -= 1;
        if let Some(title) = item.get(b"Title").ok().and_then(|obj| resolve_string(doc, obj)) {
            titles.push(title);
        }
        walk_outline(doc, item, titles, budget, depth + 1);
        child = item.get(b"Next").ok().and_then(|obj| resolve_dict(doc, obj));
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc
            .get_object(*id)
            .ok()
            .and_then(|resolved| resolved.as_dict().ok()),
        _ => None,
    }
}

fn resolve_string(doc: &Document, obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::String(bytes, _) => Some(decode_text(bytes)),
            _ => None,
        },
        _ => None,
    }
}

/// PDF text strings are either UTF-16BE with a BOM or a single-byte
/// encoding close enough to Latin-1.
fn decode_text(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
