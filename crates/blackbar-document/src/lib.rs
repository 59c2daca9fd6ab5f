// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blackbar-document — the redaction pipeline for Blackbar.
//
// Loads a PDF, rasterises its pages through a pluggable renderer, maps
// user-drawn regions between raster resolutions, destroys the covered
// pixels, and assembles a brand-new image-only PDF from the results.

pub mod annotate;
pub mod integrity;
pub mod pdf;
pub mod progress;
pub mod raster;
pub mod redact;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the primary types so callers can use `blackbar_document::Session` etc.
pub use annotate::{Frame, Hit, PixelRect, Point, RegionEditor};
pub use pdf::{DocumentAssembler, DocumentHandle, PageCodec, PageRenderer, PdfiumRenderer};
pub use progress::{MonotonicProgress, ProgressSink, no_progress};
pub use raster::{PageRaster, Rasterizer};
pub use redact::{OverlayOptions, RedactionCompositor, render_overlay};
pub use session::{ExportOptions, ExportReport, Session, SkippedPage};
