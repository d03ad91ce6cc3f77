//! Loading PDF bytes and reading page geometry and metadata

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};
use crate::error::{Error, Result};
use crate::layout::PageSize;

/// Page tree inheritance is followed at most this many levels up
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Summary of a PDF document
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Native size of the first page
    pub first_page_size: PageSize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

/// Parse PDF bytes into an editable document.
///
/// The input is only read. Encrypted documents are refused because their
/// pages cannot be read or rewritten reliably.
pub fn load_document(pdf_bytes: &[u8]) -> Result<Document> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| Error::DocumentParse(e.to_string()))?;

    if doc.is_encrypted() {
        return Err(Error::DocumentParse("document is encrypted".to_string()));
    }

    debug!("Loaded PDF {} with {} objects", doc.version, doc.objects.len());
    Ok(doc)
}

/// Object ID of the first page, if the document has any
pub fn first_page(doc: &Document) -> Option<ObjectId> {
    doc.get_pages().values().next().copied()
}

/// Look up a page attribute, following `Parent` links for inheritable keys
/// (`MediaBox`, `Resources`, `CropBox`, `Rotate`). References are resolved.
pub(crate) fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }

        node = match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => doc.get_dictionary(*parent_id).ok()?,
            _ => return None,
        };
    }

    None
}

/// Follow a reference (if any) to the object it points at
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Follow a reference (if any) and expect a dictionary
pub(crate) fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Convert a numeric PDF object to f64
pub(crate) fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Native size of a page in points, from its (possibly inherited) MediaBox.
///
/// Falls back to US Letter when the MediaBox is missing or unreadable.
/// A zero-area MediaBox is an error since nothing can be placed on it.
pub fn page_size(doc: &Document, page_id: ObjectId) -> Result<PageSize> {
    let media_box = match inherited_attribute(doc, page_id, b"MediaBox") {
        Some(Object::Array(values)) if values.len() >= 4 => {
            let nums: Vec<f64> = values.iter()
                .take(4)
                .filter_map(|v| resolve(doc, v).and_then(as_number))
                .collect();
            if nums.len() == 4 { Some(nums) } else { None }
        }
        _ => None,
    };

    let size = match media_box {
        Some(nums) => PageSize::new((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()),
        None => {
            warn!("MediaBox not found on page, falling back to US Letter (612x792)");
            PageSize::letter()
        }
    };

    if size.width_pt <= 0.0 || size.height_pt <= 0.0 {
        return Err(Error::DocumentParse(format!(
            "page has an empty MediaBox ({} x {})",
            size.width_pt, size.height_pt
        )));
    }

    Ok(size)
}

/// Read page count, first page size, title and author from PDF bytes
pub fn inspect(pdf_bytes: &[u8]) -> Result<DocumentInfo> {
    let doc = load_document(pdf_bytes)?;
    let page_id = first_page(&doc).ok_or(Error::NoPage)?;
    let first_page_size = page_size(&doc, page_id)?;

    let info = doc.trailer.get(b"Info").ok().and_then(|obj| resolve_dict(&doc, obj));
    let text_entry = |key: &[u8]| -> Option<String> {
        let bytes = info?.get(key).ok()?.as_str().ok()?;
        String::from_utf8(bytes.to_vec()).ok()
    };

    Ok(DocumentInfo {
        page_count: doc.get_pages().len(),
        first_page_size,
        title: text_entry(b"Title"),
        author: text_entry(b"Author"),
    })
}
