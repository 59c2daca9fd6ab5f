// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editing session — owns the loaded document, the rasterizer and its cache,
// and the generation counter that retires work from earlier loads. Export
// runs here: render, composite, encode and assemble, one page at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use blackbar_core::error::{LoadError, ProcessingError, RenderError};
use blackbar_core::{Assurance, PageSize, Progress, RedactConfig, RedactionMode, Region, Stage};
use tracing::{info, instrument, warn};

use crate::integrity::fingerprint;
use crate::pdf::assembler::{DocumentAssembler, PageCodec, encode_page};
use crate::pdf::backend::PageRenderer;
use crate::pdf::loader::DocumentHandle;
use crate::progress::{MonotonicProgress, ProgressSink};
use crate::raster::cache::{CacheStats, PageRaster};
use crate::raster::rasterizer::Rasterizer;
use crate::redact::compositor::RedactionCompositor;

/// Knobs for one export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub mode: RedactionMode,
    /// Pixels per point for the export rasters.
    pub scale: f32,
}

impl ExportOptions {
    pub fn from_config(config: &RedactConfig) -> Self {
        Self {
            mode: config.mode,
            scale: config.export_scale,
        }
    }
}

/// A page left out of the output, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub page: u32,
    pub reason: String,
}

/// Outcome of an export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// The new document.
    pub bytes: Vec<u8>,
    pub pages_written: u32,
    pub total_pages: u32,
    pub skipped: Vec<SkippedPage>,
    pub mode: RedactionMode,
    pub assurance: Assurance,
    pub source_fingerprint: String,
    pub output_fingerprint: String,
}

impl ExportReport {
    /// Whether some pages are missing from the output.
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn skipped_pages(&self) -> Vec<u32> {
        self.skipped.iter().map(|s| s.page).collect()
    }
}

struct SessionInner {
    config: RedactConfig,
    rasterizer: Rasterizer,
    document: RwLock<Option<Arc<DocumentHandle>>>,
    next_generation: AtomicU64,
}

/// One editing session. Cloning shares the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(renderer: Arc<dyn PageRenderer>, config: RedactConfig) -> Self {
        let rasterizer = Rasterizer::new(renderer, config.cache_ttl());
        Self {
            inner: Arc::new(SessionInner {
                config,
                rasterizer,
                document: RwLock::new(None),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &RedactConfig {
        &self.inner.config
    }

    // -- Document lifecycle ---------------------------------------------------

    /// Load a new document, replacing whatever was loaded before.
    ///
    /// The previous document and every cached raster are dropped before
    /// parsing starts, so a failed load leaves no document at all.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub async fn load(&self, data: &[u8], progress: &mut dyn ProgressSink) -> Result<u32, LoadError> {
        let mut progress = MonotonicProgress::new(progress);
        let generation = self.begin_generation();
        progress.emit(Progress::new(Stage::Loading, 5, "Reading document"));

        let bytes = data.to_vec();
        let renderer = Arc::clone(self.inner.rasterizer.renderer());
        let handle = tokio::task::spawn_blocking(move || {
            DocumentHandle::load(&bytes, renderer.as_ref(), generation)
        })
        .await
        .map_err(|e| LoadError::Unknown(format!("load task failed: {e}")))??;

        let page_count = handle.page_count();
        {
            // Generations only advance under this lock, so the check and the
            // install cannot be split by a newer load.
            let mut slot = self.write_document();
            if generation != self.generation() {
                warn!(generation, "Load finished after a newer load started; discarding");
                return Err(LoadError::Unknown(
                    "superseded by a newer document".to_string(),
                ));
            }
            *slot = Some(Arc::new(handle));
        }
        progress.emit(
            Progress::new(Stage::Loading, 100, format!("Loaded {page_count} pages"))
                .with_pages(page_count, page_count),
        );
        Ok(page_count)
    }

    /// Drop the current document and its cached rasters.
    pub fn close(&self) {
        self.begin_generation();
        info!("Session closed");
    }

    fn begin_generation(&self) -> u64 {
        let mut slot = self.write_document();
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        *slot = None;
        self.inner.rasterizer.reset(generation);
        generation
    }

    /// Generation of the most recent load or close.
    pub fn generation(&self) -> u64 {
        self.inner.next_generation.load(Ordering::SeqCst)
    }

    pub fn document(&self) -> Option<Arc<DocumentHandle>> {
        self.inner
            .document
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn write_document(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<DocumentHandle>>> {
        self.inner.document.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Page count of the loaded document, or 0.
    pub fn page_count(&self) -> u32 {
        self.document().map_or(0, |d| d.page_count())
    }

    pub fn page_size(&self, page: u32) -> Option<PageSize> {
        self.document().and_then(|d| d.page_size(page))
    }

    // -- Rendering ------------------------------------------------------------

    /// Render a page through the cache.
    pub async fn render_page(&self, page: u32, scale: f32) -> Result<Arc<PageRaster>, RenderError> {
        let document = self.document().ok_or(RenderError::NoDocument)?;
        self.inner.rasterizer.render_page(&document, page, scale).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.rasterizer.cache_stats()
    }

    // -- Export ---------------------------------------------------------------

    /// Produce a new, fully rasterised document with `regions` destroyed.
    ///
    /// `regions[i]` holds the regions of page `i + 1`. A page that fails to
    /// render, composite or encode is skipped and listed in the report.
    #[instrument(skip_all, fields(mode = %options.mode, scale = options.scale))]
    pub async fn export(
        &self,
        regions: &[Vec<Region>],
        options: ExportOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<ExportReport, ProcessingError> {
        let document = self.document().ok_or(ProcessingError::NoDocument)?;
        let generation = document.generation();
        let total = document.page_count();
        let codec = PageCodec::for_mode(options.mode, self.inner.config.jpeg_quality);
        let compositor = RedactionCompositor::from_config(&self.inner.config, options.mode);
        let mut progress = MonotonicProgress::new(progress);
        let mut assembler = DocumentAssembler::new();
        let mut skipped = Vec::new();

        info!(pages = total, "Export started");

        for page in 1..=total {
            if generation != self.generation() {
                return Err(ProcessingError::Superseded);
            }
            let done = u64::from(page - 1) * 90 / u64::from(total);
            progress.emit(
                Progress::new(Stage::Rendering, 5 + done as u8, format!("Rendering page {page}"))
                    .with_pages(page, total),
            );

            let raster = match self
                .inner
                .rasterizer
                .render_uncached(&document, page, options.scale)
                .await
            {
                Ok(raster) => raster,
                Err(RenderError::Superseded { .. }) => return Err(ProcessingError::Superseded),
                Err(err) => {
                    warn!(page, %err, "Skipping page that failed to render");
                    skipped.push(SkippedPage {
                        page,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            progress.emit(
                Progress::new(Stage::Processing, 5 + done as u8, format!("Redacting page {page}"))
                    .with_pages(page, total),
            );

            let page_regions = regions
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default();
            let encoded = tokio::task::spawn_blocking(move || {
                let sanitized = compositor.composite(&raster, &page_regions);
                encode_page(&sanitized, codec)
            })
            .await
            .map_err(|e| ProcessingError::Page {
                page,
                reason: format!("redaction task failed: {e}"),
            })
            .and_then(|result| result);

            match encoded {
                Ok(encoded) => assembler.push_page(encoded),
                Err(err) => {
                    warn!(page, %err, "Skipping page that failed to encode");
                    skipped.push(SkippedPage {
                        page,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if generation != self.generation() {
            return Err(ProcessingError::Superseded);
        }
        if assembler.pages_written() == 0 {
            return Err(ProcessingError::NoPagesProduced);
        }

        progress.emit(Progress::new(Stage::Finalizing, 95, "Assembling document"));
        let pages_written = assembler.pages_written() as u32;
        let bytes = assembler.finish()?;

        let report = ExportReport {
            output_fingerprint: fingerprint(&bytes),
            bytes,
            pages_written,
            total_pages: total,
            skipped,
            mode: options.mode,
            assurance: options.mode.assurance(),
            source_fingerprint: document.fingerprint().to_string(),
        };
        progress.emit(
            Progress::new(Stage::Finalizing, 100, "Export complete").with_pages(total, total),
        );

        if report.is_partial() {
            warn!(
                written = report.pages_written,
                skipped = ?report.skipped_pages(),
                "Export finished with missing pages"
            );
        } else {
            info!(
                written = report.pages_written,
                bytes_len = report.bytes.len(),
                "Export finished"
            );
        }
        Ok(report)
    }
}
