// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document loader — validate an input buffer as a PDF using `lopdf`, confirm
// the rendering backend can open it, and retain a private copy of the bytes
// for every later rasterisation.

use std::sync::Arc;

use blackbar_core::error::LoadError;
use blackbar_core::PageSize;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

use crate::integrity::fingerprint;
use crate::pdf::backend::{BackendError, PageRenderer};

/// How far into the buffer the `%PDF-` marker may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Inheritable page attributes are looked up at most this many levels up.
const MAX_TREE_DEPTH: usize = 32;

/// A parsed, renderable source document.
///
/// Owns a private copy of the original bytes. Nothing in the pipeline ever
/// mutates them; export builds an entirely new document.
#[derive(Debug)]
pub struct DocumentHandle {
    bytes: Arc<[u8]>,
    page_count: u32,
    page_sizes: Vec<PageSize>,
    fingerprint: String,
    generation: u64,
}

impl DocumentHandle {
    // -- Construction ---------------------------------------------------------

    /// Validate `data` and open it with `renderer`.
    ///
    /// `generation` identifies the loading session; results tagged with an
    /// older generation are discarded by the rasterizer.
    #[instrument(skip_all, fields(bytes_len = data.len(), generation))]
    pub fn load(
        data: &[u8],
        renderer: &dyn PageRenderer,
        generation: u64,
    ) -> Result<Self, LoadError> {
        if data.is_empty() {
            return Err(LoadError::Missing);
        }
        if !has_pdf_header(data) {
            return Err(LoadError::InvalidStructure(
                "missing %PDF- header".to_string(),
            ));
        }

        let document = Document::load_mem(data).map_err(|err| classify_parse_error(data, &err))?;
        let structural_pages = document.get_pages();
        if structural_pages.is_empty() {
            return Err(LoadError::InvalidStructure(
                "document has no pages".to_string(),
            ));
        }

        let page_count = renderer.page_count(data).map_err(|err| match err {
            BackendError::Password => LoadError::PasswordProtected,
            BackendError::Format(detail) => LoadError::InvalidStructure(detail),
            other => LoadError::Unknown(other.to_string()),
        })?;
        if page_count == 0 {
            return Err(LoadError::InvalidStructure(
                "renderer found no pages".to_string(),
            ));
        }
        if page_count as usize != structural_pages.len() {
            warn!(
                renderer_pages = page_count,
                tree_pages = structural_pages.len(),
                "Page tree and renderer disagree on page count; using renderer"
            );
        }

        let mut page_sizes: Vec<PageSize> = structural_pages
            .values()
            .map(|page_id| page_size_of(&document, *page_id))
            .collect();
        page_sizes.resize(page_count as usize, PageSize::LETTER);

        let handle = Self {
            bytes: Arc::from(data),
            page_count,
            page_sizes,
            fingerprint: fingerprint(data),
            generation,
        };

        info!(
            pages = handle.page_count,
            fingerprint = %handle.short_fingerprint(),
            "Document loaded"
        );
        Ok(handle)
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Native size of a 1-indexed page, in points.
    pub fn page_size(&self, page: u32) -> Option<PageSize> {
        page.checked_sub(1)
            .and_then(|i| self.page_sizes.get(i as usize))
            .copied()
    }

    /// The retained original bytes.
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// SHA-256 of the original bytes, lowercase hex.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..12.min(self.fingerprint.len())]
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.page_count
    }
}

/// Whether the buffer carries a PDF header near its start.
pub fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

fn classify_parse_error(data: &[u8], err: &lopdf::Error) -> LoadError {
    let detail = err.to_string();
    let lower = detail.to_ascii_lowercase();
    if lower.contains("decrypt") || lower.contains("encrypt") || lower.contains("password") {
        return LoadError::PasswordProtected;
    }
    if contains_marker(data, b"/Encrypt") {
        debug!(%detail, "Parse failed on a document with an /Encrypt entry");
        return LoadError::PasswordProtected;
    }
    LoadError::InvalidStructure(detail)
}

fn contains_marker(data: &[u8], marker: &[u8]) -> bool {
    data.windows(marker.len()).any(|w| w == marker)
}

/// Resolve a page's visible size, honouring inherited boxes and `/Rotate`.
fn page_size_of(document: &Document, page_id: ObjectId) -> PageSize {
    let media_box = inherited(document, page_id, b"CropBox")
        .and_then(|obj| rect_of(document, obj))
        .or_else(|| inherited(document, page_id, b"MediaBox").and_then(|obj| rect_of(document, obj)));

    let Some([x0, y0, x1, y1]) = media_box else {
        warn!(?page_id, "Page has no usable MediaBox; assuming Letter");
        return PageSize::LETTER;
    };
    let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());
    if width <= 0.0 || height <= 0.0 {
        return PageSize::LETTER;
    }

    let rotate = inherited(document, page_id, b"Rotate")
        .and_then(|obj| number_of(document, obj))
        .map(|r| (r as i64).rem_euclid(360))
        .unwrap_or(0);

    if rotate == 90 || rotate == 270 {
        PageSize {
            width_pt: height,
            height_pt: width,
        }
    } else {
        PageSize {
            width_pt: width,
            height_pt: height,
        }
    }
}

/// Look up `key` on the page dictionary or the nearest ancestor carrying it.
fn inherited<'a>(document: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        current = parent_of(document, current)?;
    }
    None
}

fn parent_of<'a>(document: &'a Document, dict: &Dictionary) -> Option<&'a Dictionary> {
    match dict.get(b"Parent").ok()? {
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        _ => None,
    }
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn number_of(document: &Document, object: &Object) -> Option<f64> {
    match resolve(document, object) {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn rect_of(document: &Document, object: &Object) -> Option<[f64; 4]> {
    let Object::Array(items) = resolve(document, object) else {
        return None;
    };
    if items.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, item) in rect.iter_mut().zip(items) {
        *slot = number_of(document, item)?;
    }
    Some(rect)
}
