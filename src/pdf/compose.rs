//! Drawing the stamp text onto page 1 using lopdf
//!
//! The stamp is added as a new content stream appended to the first page.
//! Existing content is wrapped in a `q`/`Q` pair first, so a transformation
//! left active by the original content cannot move the stamp. Nothing on the
//! page is removed or rewritten; other pages are untouched.

use std::path::Path;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info};
use crate::color::RgbColor;
use crate::error::{Error, Result};
use crate::layout::{to_pdf_point, PdfPagePoint};
use crate::stamp::StampSpec;
use super::document::{first_page, inherited_attribute, load_document, page_size, resolve, resolve_dict};
use super::encoding::encode_win_ansi;

/// Standard font used for stamps (one of the 14 standard PDF fonts)
const STAMP_BASE_FONT: &[u8] = b"Helvetica-Bold";

/// Preferred resource name for the stamp font
const STAMP_FONT_NAME: &str = "StampFont";

/// Stamp `spec.text()` onto page 1 of `pdf_bytes` and return the new document.
///
/// The position is mapped against the page's native point size, so the
/// result does not depend on how large the preview was rendered. Fails with
/// [`Error::DocumentParse`], [`Error::NoPage`] or [`Error::InvalidColor`]
/// before anything is written; the caller's bytes are never modified.
///
/// # Example
///
/// ```no_run
/// use stampflow::pdf::stamp_pdf;
/// use stampflow::StampSpec;
///
/// let original = std::fs::read("invoice.pdf").unwrap();
/// let spec = StampSpec::new("PB 966753", 85.0, 5.0, 16.0, "#FF0000");
/// let stamped = stamp_pdf(&original, &spec).expect("Failed to stamp PDF");
/// std::fs::write("stamped_invoice.pdf", stamped).unwrap();
/// ```
pub fn stamp_pdf(pdf_bytes: &[u8], spec: &StampSpec) -> Result<Vec<u8>> {
    let mut doc = load_document(pdf_bytes)?;
    let page_id = first_page(&doc).ok_or(Error::NoPage)?;
    let size = page_size(&doc, page_id)?;

    // Validate before touching the document
    let color = RgbColor::parse_hex(spec.color_hex())?;

    let point = to_pdf_point(spec.x_percent(), spec.y_percent(), spec.font_size_pt(), size);
    debug!(
        "Stamp at ({:.2}%, {:.2}%) maps to ({:.2}, {:.2}) pt on {} x {} pt page",
        spec.x_percent(), spec.y_percent(), point.x_pt, point.y_pt, size.width_pt, size.height_pt
    );

    let font_name = ensure_stamp_font(&mut doc, page_id)?;
    let content = stamp_content(&font_name, spec.font_size_pt(), color, point, spec.text())?;

    isolate_page_content(&mut doc, page_id)?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    append_content_to_page(&mut doc, page_id, content_id)?;

    let mut output = Vec::new();
    doc.save_to(&mut output)?;

    info!("Stamped {:?} onto page 1 ({} bytes)", spec.text(), output.len());
    Ok(output)
}

/// Read a PDF file, stamp it and write the result to `output_path`
pub fn stamp_pdf_file(input_path: &Path, output_path: &Path, spec: &StampSpec) -> Result<()> {
    let original = std::fs::read(input_path)?;
    let stamped = stamp_pdf(&original, spec)?;
    std::fs::write(output_path, stamped)?;
    Ok(())
}

/// Output name for a stamped copy of `input`: `stamped_<file name>`
pub fn stamped_file_name(input: &Path) -> String {
    let name = input.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    format!("stamped_{}", name)
}

/// Content stream drawing the text at `point` with the given font, size and color
fn stamp_content(font_name: &str, font_size: f64, color: RgbColor, point: PdfPagePoint, text: &str) -> Result<Vec<u8>> {
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![
                Object::Name(font_name.as_bytes().to_vec()),
                Object::Real(font_size as f32),
            ]),
            Operation::new("rg", vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ]),
            Operation::new("Tm", vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Real(point.x_pt as f32),
                Object::Real(point.y_pt as f32),
            ]),
            Operation::new("Tj", vec![Object::String(encode_win_ansi(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };

    Ok(content.encode()?)
}

/// Whether a font dictionary is the stamp font (Helvetica-Bold, WinAnsi)
fn is_stamp_font(font: &Dictionary) -> bool {
    let name_is = |key: &[u8], expected: &[u8]| {
        matches!(font.get(key), Ok(Object::Name(name)) if name.as_slice() == expected)
    };
    name_is(b"Subtype", b"Type1") && name_is(b"BaseFont", STAMP_BASE_FONT) && name_is(b"Encoding", b"WinAnsiEncoding")
}

/// Make the stamp font available in page 1's resources and return its resource name.
///
/// An existing Helvetica-Bold entry is reused; otherwise a new font object is
/// added under a name no other font on the page uses.
fn ensure_stamp_font(doc: &mut Document, page_id: ObjectId) -> Result<String> {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| resolve_dict(doc, obj))
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut fonts = resources.get(b"Font").ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let existing = fonts.iter().find_map(|(name, obj)| {
        let font = resolve_dict(doc, obj)?;
        is_stamp_font(font).then(|| String::from_utf8_lossy(name).into_owned())
    });

    let font_name = match existing {
        Some(name) => {
            debug!("Reusing font resource /{} for stamp", name);
            name
        }
        None => {
            let name = unused_font_name(&fonts);
            let font_id = add_stamp_font(doc);
            fonts.set(name.as_bytes().to_vec(), Object::Reference(font_id));
            name
        }
    };

    // Give the page its own Resources so inherited ones are not changed for other pages
    resources.set("Font", Object::Dictionary(fonts));
    let page_obj = doc.get_object_mut(page_id)?;
    if let Object::Dictionary(ref mut page_dict) = page_obj {
        page_dict.set("Resources", Object::Dictionary(resources));
    }

    Ok(font_name)
}

fn unused_font_name(fonts: &Dictionary) -> String {
    let mut name = STAMP_FONT_NAME.to_string();
    let mut suffix = 1;
    while fonts.has(name.as_bytes()) {
        name = format!("{}{}", STAMP_FONT_NAME, suffix);
        suffix += 1;
    }
    name
}

/// Add Helvetica-Bold (standard Type1 font, no embedding needed)
fn add_stamp_font(doc: &mut Document) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(STAMP_BASE_FONT.to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));

    doc.add_object(Object::Dictionary(font))
}

/// References to the page's content streams, resolving an indirect array
fn content_references(doc: &Document, page_id: ObjectId) -> Result<Option<Vec<Object>>> {
    let page_dict = doc.get_dictionary(page_id)?;

    let refs = match page_dict.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => Some(items.clone()),
            _ => Some(vec![Object::Reference(*id)]),
        },
        Ok(Object::Array(items)) => Some(
            items.iter()
                .filter(|item| resolve(doc, item).is_some())
                .cloned()
                .collect(),
        ),
        _ => None,
    };

    Ok(refs)
}

/// Wrap the page's existing content in `q` ... `Q`
fn isolate_page_content(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let existing = match content_references(doc, page_id)? {
        Some(refs) if !refs.is_empty() => refs,
        _ => return Ok(()),
    };

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

    let mut wrapped = Vec::with_capacity(existing.len() + 2);
    wrapped.push(Object::Reference(save_id));
    wrapped.extend(existing);
    wrapped.push(Object::Reference(restore_id));

    let page_obj = doc.get_object_mut(page_id)?;
    if let Object::Dictionary(ref mut page_dict) = page_obj {
        page_dict.set("Contents", Object::Array(wrapped));
    }

    Ok(())
}

/// Append a content stream to a page's Contents
///
/// We append our content after the original content so the stamp is drawn
/// on top (not covered by background fills).
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let existing = content_references(doc, page_id)?.unwrap_or_default();

    let page_obj = doc.get_object_mut(page_id)?;
    if let Object::Dictionary(ref mut page_dict) = page_obj {
        let mut contents = existing;
        contents.push(Object::Reference(new_content_id));
        page_dict.set("Contents", Object::Array(contents));
    }

    Ok(())
}
