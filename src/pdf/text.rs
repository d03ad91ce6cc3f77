//! Plain-text extraction from a page's content stream
//!
//! Each text-showing operator (`Tj`, `TJ`, `'`, `"`) produces one run, in
//! the order the content stream lists them. Runs are joined with a single
//! space and otherwise left alone: no reordering, trimming or deduplication.

use std::collections::HashMap;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;
use crate::error::{Error, Result};
use super::document::{inherited_attribute, resolve, resolve_dict};
use super::encoding::decode_win_ansi;

/// Nested Form XObjects deeper than this are not entered
const MAX_FORM_DEPTH: usize = 8;

/// Extract the text runs of a page, space-joined
pub fn extract_page_text(doc: &Document, page_id: ObjectId) -> Result<String> {
    let runs = extract_page_runs(doc, page_id)?;
    Ok(runs.join(" "))
}

/// Extract the individual text runs of a page
pub fn extract_page_runs(doc: &Document, page_id: ObjectId) -> Result<Vec<String>> {
    let content = doc.get_page_content(page_id)
        .map_err(|e| Error::DocumentParse(format!("unreadable page content: {}", e)))?;
    let resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| resolve_dict(doc, obj));

    let mut runs = Vec::new();
    collect_runs(doc, &content, resources, 0, &mut runs)?;

    debug!("Extracted {} text runs from page", runs.len());
    Ok(runs)
}

/// How the bytes of a shown string map to characters
#[derive(Debug, Clone)]
enum FontDecoder {
    /// Single-byte font without a usable ToUnicode map
    WinAnsi,
    /// Font with a ToUnicode CMap
    ToUnicode(ToUnicodeMap),
}

impl FontDecoder {
    fn for_font(doc: &Document, font: &Dictionary) -> Self {
        let cmap = font.get(b"ToUnicode").ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| match obj {
                Object::Stream(stream) => {
                    let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
                    ToUnicodeMap::parse(&data)
                }
                _ => None,
            });

        match cmap {
            Some(map) => FontDecoder::ToUnicode(map),
            None => FontDecoder::WinAnsi,
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            FontDecoder::WinAnsi => decode_win_ansi(bytes),
            FontDecoder::ToUnicode(map) => map.decode(bytes),
        }
    }
}

/// Character mapping read from a ToUnicode CMap (bfchar and bfrange entries)
#[derive(Debug, Clone, Default)]
struct ToUnicodeMap {
    code_len: usize,
    entries: HashMap<u32, String>,
}

impl ToUnicodeMap {
    fn parse(data: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(data);
        let tokens = tokenize_cmap(&text);
        let mut map = ToUnicodeMap::default();

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i].as_str() {
                "beginbfchar" => {
                    i += 1;
                    while i + 1 < tokens.len() && tokens[i] != "endbfchar" {
                        if let (Some(src), Some(dst)) = (hex_token(&tokens[i]), hex_token(&tokens[i + 1])) {
                            map.insert(&src, utf16_be(&dst));
                        }
                        i += 2;
                    }
                }
                "beginbfrange" => {
                    i += 1;
                    while i + 2 < tokens.len() && tokens[i] != "endbfrange" {
                        let (Some(lo), Some(hi)) = (hex_token(&tokens[i]), hex_token(&tokens[i + 1])) else {
                            i += 1;
                            continue;
                        };
                        let (lo_code, hi_code) = (code_value(&lo), code_value(&hi));

                        if tokens[i + 2] == "[" {
                            // <lo> <hi> [<dst0> <dst1> ...]
                            let mut j = i + 3;
                            let mut code = Some(lo_code).filter(|c| *c <= hi_code);
                            while j < tokens.len() && tokens[j] != "]" {
                                if let (Some(dst), Some(current)) = (hex_token(&tokens[j]), code) {
                                    map.insert_code(current, lo.len(), utf16_be(&dst));
                                    code = current.checked_add(1).filter(|c| *c <= hi_code);
                                }
                                j += 1;
                            }
                            i = j + 1;
                        } else {
                            // <lo> <hi> <dst>: last unit increments across the range
                            if let Some(dst) = hex_token(&tokens[i + 2]) {
                                for (offset, code) in (lo_code..=hi_code).take(0x1_0000).enumerate() {
                                    let mut units = dst.clone();
                                    increment_last(&mut units, offset as u32);
                                    map.insert_code(code, lo.len(), utf16_be(&units));
                                }
                            }
                            i += 3;
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }

        if map.entries.is_empty() {
            None
        } else {
            Some(map)
        }
    }

    fn insert(&mut self, src: &[u8], value: String) {
        self.insert_code(code_value(src), src.len(), value);
    }

    fn insert_code(&mut self, code: u32, len: usize, value: String) {
        if self.code_len == 0 {
            self.code_len = len.clamp(1, 4);
        }
        self.entries.insert(code, value);
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let len = self.code_len.max(1);
        bytes.chunks(len)
            .filter_map(|chunk| {
                let code = code_value(chunk);
                match self.entries.get(&code) {
                    Some(s) => Some(s.clone()),
                    // Unmapped single-byte codes fall back to WinAnsi
                    None if len == 1 => Some(decode_win_ansi(chunk)),
                    None => None,
                }
            })
            .collect()
    }
}

/// Split CMap text into hex strings (`<...>`), brackets and bare words
fn tokenize_cmap(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut token = String::from("<");
                for next in chars.by_ref() {
                    token.push(next);
                    if next == '>' {
                        break;
                    }
                }
                tokens.push(token);
            }
            '[' | ']' => tokens.push(c.to_string()),
            c if c.is_whitespace() => {}
            _ => {
                let mut token = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '<' | '[' | ']') {
                        break;
                    }
                    token.push(next);
                    chars.next();
                }
                tokens.push(token);
            }
        }
    }

    tokens
}

/// Bytes of a `<hex>` token
fn hex_token(token: &str) -> Option<Vec<u8>> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    let digits: Vec<u8> = inner.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.is_empty() || digits.len() % 2 != 0 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    digits.chunks(2)
        .map(|pair| {
            let hex = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(hex, 16).ok()
        })
        .collect()
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().take(4).fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn increment_last(units: &mut [u8], by: u32) {
    let n = units.len();
    if n >= 2 {
        let last = u16::from_be_bytes([units[n - 2], units[n - 1]]).wrapping_add(by as u16);
        units[n - 2..].copy_from_slice(&last.to_be_bytes());
    } else if n == 1 {
        units[0] = units[0].wrapping_add(by as u8);
    }
}

fn utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes.chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Walk content operations, appending one decoded string per text-showing operator
fn collect_runs(
    doc: &Document,
    content: &[u8],
    resources: Option<&Dictionary>,
    depth: usize,
    runs: &mut Vec<String>,
) -> Result<()> {
    let operations = Content::decode(content)
        .map_err(|e| Error::DocumentParse(format!("unreadable content stream: {}", e)))?
        .operations;

    let fonts = resources
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|obj| resolve_dict(doc, obj));
    let mut decoders: HashMap<Vec<u8>, FontDecoder> = HashMap::new();

    // Current font is part of the graphics state, saved by q and restored by Q
    let mut current: Option<Vec<u8>> = None;
    let mut saved: Vec<Option<Vec<u8>>> = Vec::new();

    for op in &operations {
        match op.operator.as_str() {
            "q" => saved.push(current.clone()),
            "Q" => current = saved.pop().unwrap_or(None),
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    if !decoders.contains_key(name) {
                        let decoder = fonts
                            .and_then(|f| f.get(name).ok())
                            .and_then(|obj| resolve_dict(doc, obj))
                            .map(|font| FontDecoder::for_font(doc, font))
                            .unwrap_or(FontDecoder::WinAnsi);
                        decoders.insert(name.clone(), decoder);
                    }
                    current = Some(name.clone());
                }
            }
            "Tj" | "'" | "\"" => {
                // For `"` the string follows the two spacing operands
                let string = if op.operator == "\"" { op.operands.get(2) } else { op.operands.first() };
                if let Some(Object::String(bytes, _)) = string {
                    runs.push(decode_with(&decoders, current.as_ref(), bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let mut run = String::new();
                    for item in items {
                        if let Object::String(bytes, _) = item {
                            run.push_str(&decode_with(&decoders, current.as_ref(), bytes));
                        }
                    }
                    runs.push(run);
                }
            }
            "Do" if depth < MAX_FORM_DEPTH => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    collect_form_runs(doc, resources, name, depth, runs)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn decode_with(decoders: &HashMap<Vec<u8>, FontDecoder>, font: Option<&Vec<u8>>, bytes: &[u8]) -> String {
    match font.and_then(|name| decoders.get(name)) {
        Some(decoder) => decoder.decode(bytes),
        None => decode_win_ansi(bytes),
    }
}

/// Descend into a Form XObject invoked with `Do`; image XObjects are skipped
fn collect_form_runs(
    doc: &Document,
    resources: Option<&Dictionary>,
    name: &[u8],
    depth: usize,
    runs: &mut Vec<String>,
) -> Result<()> {
    let xobject = resources
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|obj| resolve_dict(doc, obj))
        .and_then(|xobjects| xobjects.get(name).ok())
        .and_then(|obj| resolve(doc, obj));

    let stream = match xobject {
        Some(Object::Stream(stream)) => stream,
        _ => return Ok(()),
    };

    let is_form = matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype == b"Form");
    if !is_form {
        return Ok(());
    }

    let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
    // Forms without their own Resources use the invoking page's
    let form_resources = stream.dict.get(b"Resources").ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .or(resources);

    collect_runs(doc, &data, form_resources, depth + 1, runs)
}
