use lopdf::{Dictionary, Document, Object, ObjectId};
use press_logging::press_debug;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    #[error("not a readable PDF: {0}")]
    Parse(String),
    #[error("document has no pages")]
    NoPages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: usize,
}

/// Parses the document far enough to count its pages.
pub fn inspect_pdf(bytes: &[u8]) -> Result<DocumentInfo, InspectError> {
    let document = load(bytes)?;
    let page_count = document.get_pages().len();
    if page_count == 0 {
        return Err(InspectError::NoPages);
    }
    Ok(DocumentInfo { page_count })
}

/// Looks for a signature form field among the page annotations.
pub fn detect_signature(bytes: &[u8]) -> Result<bool, InspectError> {
    let document = load(bytes)?;
    let found = document
        .get_pages()
        .values()
        .any(|page_id| page_has_signature(&document, *page_id));
    press_debug!("Signature pre-check: found={}", found);
    Ok(found)
}

fn load(bytes: &[u8]) -> Result<Document, InspectError> {
    Document::load_mem(bytes).map_err(|err| InspectError::Parse(err.to_string()))
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn page_has_signature(document: &Document, page_id: ObjectId) -> bool {
    let Ok(page) = document.get_dictionary(page_id) else {
        return false;
    };
    let Some(annots) = page
        .get(b"Annots")
        .ok()
        .and_then(|object| resolve(document, object))
        .and_then(|object| object.as_array().ok())
    else {
        return false;
    };

    annots
        .iter()
        .filter_map(|entry| resolve(document, entry))
        .filter_map(|object| object.as_dict().ok())
        .any(|annot| {
            name_is(annot, b"Subtype", b"Widget")
                && field_type(document, annot) == Some(&b"Sig"[..])
        })
}

/// `/FT` of a widget, inherited from its parent field when absent.
fn field_type<'a>(document: &'a Document, annot: &'a Dictionary) -> Option<&'a [u8]> {
    if let Ok(name) = annot.get(b"FT").and_then(Object::as_name) {
        return Some(name);
    }
    let parent = annot
        .get(b"Parent")
        .ok()
        .and_then(|object| resolve(document, object))?
        .as_dict()
        .ok()?;
    parent.get(b"FT").and_then(Object::as_name).ok()
}

fn name_is(dict: &Dictionary, key: &[u8], expected: &[u8]) -> bool {
    dict.get(key).and_then(Object::as_name).ok() == Some(expected)
}
