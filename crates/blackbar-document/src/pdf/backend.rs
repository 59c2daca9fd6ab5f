// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendering backend — the external capability that turns a page of a PDF
// into pixels. The pipeline only talks to the `PageRenderer` trait; PDFium
// is the production implementation.

use std::path::PathBuf;
use std::sync::Mutex;

use image::RgbaImage;
use pdfium_render::prelude::*;
use thiserror::Error;
use tracing::{debug, instrument};

/// Failures reported by a rendering backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("the document requires a password")]
    Password,

    #[error("malformed document: {0}")]
    Format(String),

    #[error("page {0} does not exist")]
    NoSuchPage(u32),

    #[error("{0}")]
    Other(String),
}

/// Renders pages of an in-memory PDF.
///
/// Implementations receive the original document bytes on every call and
/// must not retain them; `page` is 1-indexed and `scale` is pixels per PDF
/// point. The returned image may contain transparency; the rasterizer
/// flattens it onto white.
pub trait PageRenderer: Send + Sync {
    fn page_count(&self, pdf: &[u8]) -> Result<u32, BackendError>;

    fn render(&self, pdf: &[u8], page: u32, scale: f32) -> Result<RgbaImage, BackendError>;
}

// PDFium is not re-entrant; every call into it goes through this lock.
static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

/// Renders pages with Google PDFium via `pdfium-render`.
///
/// The library is bound per operation because `Pdfium` is neither `Send` nor
/// `Sync`; the OS caches the `dlopen`, so repeat binds are cheap.
pub struct PdfiumRenderer {
    /// Explicit library file, if one was configured.
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// Create a renderer, verifying the PDFium library can be bound.
    ///
    /// Discovery order:
    /// 1. `PDFIUM_DYNAMIC_LIB_PATH` env var (explicit path to library file)
    /// 2. Alongside the running executable
    /// 3. System library search paths
    pub fn new() -> Result<Self, BackendError> {
        let renderer = Self {
            library_path: std::env::var_os("PDFIUM_DYNAMIC_LIB_PATH").map(PathBuf::from),
        };
        let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        renderer.bind()?;
        Ok(renderer)
    }

    /// Create a renderer bound to a specific library file.
    pub fn with_library(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let renderer = Self {
            library_path: Some(path.into()),
        };
        let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        renderer.bind()?;
        Ok(renderer)
    }

    fn bind(&self) -> Result<Pdfium, BackendError> {
        if let Some(path) = &self.library_path {
            let path_str = path.to_string_lossy().to_string();
            let bindings = Pdfium::bind_to_library(&path_str).map_err(|e| {
                BackendError::Other(format!(
                    "failed to load PDFium from {}: {e}",
                    path.display()
                ))
            })?;
            return Ok(Pdfium::new(bindings));
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
        {
            let lib_path =
                Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!(dir = %exe_dir.display(), "Bound PDFium next to executable");
                return Ok(Pdfium::new(bindings));
            }
        }

        let bindings = Pdfium::bind_to_system_library().map_err(|e| {
            BackendError::Other(format!(
                "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
            ))
        })?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self, pdf: &[u8]) -> Result<u32, BackendError> {
        let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(map_pdfium_error)?;
        Ok(document.pages().len() as u32)
    }

    #[instrument(skip(self, pdf), fields(pdf_len = pdf.len()))]
    fn render(&self, pdf: &[u8], page: u32, scale: f32) -> Result<RgbaImage, BackendError> {
        let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(map_pdfium_error)?;

        let index = page
            .checked_sub(1)
            .and_then(|i| i.try_into().ok())
            .ok_or(BackendError::NoSuchPage(page))?;
        let pdf_page = document
            .pages()
            .get(index)
            .map_err(|_| BackendError::NoSuchPage(page))?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .set_clear_color(PdfColor::WHITE);
        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| BackendError::Other(format!("rendering failed: {e}")))?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
            BackendError::Other(format!("bitmap size mismatch for {width}x{height}"))
        })?;

        debug!(page, width, height, "PDFium rendered page");
        Ok(image)
    }
}

/// Map PDFium load errors onto the backend taxonomy.
fn map_pdfium_error(err: PdfiumError) -> BackendError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            BackendError::Password
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError) => {
            BackendError::Format(err.to_string())
        }
        other => BackendError::Other(other.to_string()),
    }
}
