// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterizer — render pages through the backend on the blocking pool,
// flatten them onto opaque white, cache the result, and coalesce concurrent
// requests for the same (page, scale).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use blackbar_core::error::RenderError;
use image::{ImageBuffer, Rgba, RgbaImage};
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::pdf::backend::{BackendError, PageRenderer};
use crate::pdf::loader::DocumentHandle;
use crate::raster::cache::{CacheKey, CacheStats, PageRaster, RasterCache};

type RenderResult = Result<Arc<PageRaster>, RenderError>;
type InFlightKey = (u64, CacheKey);
type InFlightMap = HashMap<InFlightKey, broadcast::Sender<RenderResult>>;

/// Upper bound on either raster dimension.
const MAX_DIMENSION_PX: f64 = 16_384.0;

/// Renders pages of the current document, with caching and de-duplication.
pub struct Rasterizer {
    renderer: Arc<dyn PageRenderer>,
    cache: RasterCache,
    in_flight: Arc<Mutex<InFlightMap>>,
}

impl Rasterizer {
    pub fn new(renderer: Arc<dyn PageRenderer>, cache_ttl: Duration) -> Self {
        Self {
            renderer,
            cache: RasterCache::new(cache_ttl),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn renderer(&self) -> &Arc<dyn PageRenderer> {
        &self.renderer
    }

    /// Switch to a new document generation and drop every cached raster.
    ///
    /// Renders still running for older generations complete but are reported
    /// as superseded and never enter the cache.
    pub fn reset(&self, generation: u64) {
        self.cache.reset(generation);
    }

    pub fn current_generation(&self) -> u64 {
        self.cache.generation()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Run a cache maintenance pass.
    pub fn maintain_cache(&self) -> usize {
        self.cache.maintain()
    }

    /// Render a page, consulting the cache first.
    ///
    /// A request for a key that is already being rendered waits for that
    /// render instead of starting another.
    #[instrument(skip(self, document), fields(generation = document.generation()))]
    pub async fn render_page(
        &self,
        document: &Arc<DocumentHandle>,
        page: u32,
        scale: f32,
    ) -> RenderResult {
        validate(document, page, scale)?;
        let key = CacheKey::new(page, scale);
        let generation = document.generation();

        if let Some(hit) = self.cache.get(generation, &key) {
            debug!(page, scale, "Raster cache hit");
            return Ok(hit);
        }

        let flight_key = (generation, key);
        let waiter = {
            let mut in_flight = lock(&self.in_flight);
            match in_flight.get(&flight_key) {
                Some(sender) => Some(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    in_flight.insert(flight_key, sender);
                    None
                }
            }
        };

        if let Some(mut receiver) = waiter {
            debug!(page, scale, "Joining in-flight render");
            return match receiver.recv().await {
                Ok(result) => result,
                Err(_) => Err(RenderError::Backend {
                    page,
                    reason: "in-flight render was abandoned".to_string(),
                }),
            };
        }

        let guard = FlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            key: Some(flight_key),
        };

        // A render may have finished between the first lookup and taking the lead.
        if let Some(hit) = self.cache.get(generation, &key) {
            guard.complete(Ok(Arc::clone(&hit)));
            return Ok(hit);
        }

        let result = match self.render_blocking(document, page, scale).await {
            Ok(raster) => {
                let raster = Arc::new(raster);
                // The cache checks the generation under its own lock.
                if self.cache.insert(generation, key, Arc::clone(&raster)) {
                    Ok(raster)
                } else {
                    debug!(page, "Discarding render from superseded document");
                    Err(RenderError::Superseded { page })
                }
            }
            Err(err) => {
                warn!(page, %err, "Page render failed");
                Err(err)
            }
        };

        guard.complete(result.clone());
        result
    }

    /// Render a page without touching the cache. Used by export, which
    /// renders each page once at a high scale.
    pub async fn render_uncached(
        &self,
        document: &Arc<DocumentHandle>,
        page: u32,
        scale: f32,
    ) -> Result<PageRaster, RenderError> {
        validate(document, page, scale)?;
        self.render_blocking(document, page, scale).await
    }

    async fn render_blocking(
        &self,
        document: &Arc<DocumentHandle>,
        page: u32,
        scale: f32,
    ) -> Result<PageRaster, RenderError> {
        let renderer = Arc::clone(&self.renderer);
        let bytes = Arc::clone(document.bytes());

        let rendered = tokio::task::spawn_blocking(move || renderer.render(&bytes, page, scale))
            .await
            .map_err(|err| RenderError::Backend {
                page,
                reason: format!("render task failed: {err}"),
            })?
            .map_err(|err| match err {
                BackendError::NoSuchPage(_) => RenderError::PageOutOfRange {
                    page,
                    page_count: document.page_count(),
                },
                other => RenderError::Backend {
                    page,
                    reason: other.to_string(),
                },
            })?;

        let image = flatten_onto_white(&rendered);
        debug!(
            page,
            scale,
            width = image.width(),
            height = image.height(),
            "Page rasterised"
        );
        Ok(PageRaster { page, scale, image })
    }
}

/// Removes the in-flight entry when the leading render finishes or is
/// dropped; waiters see a closed channel in the latter case.
struct FlightGuard {
    in_flight: Arc<Mutex<InFlightMap>>,
    key: Option<InFlightKey>,
}

impl FlightGuard {
    fn complete(mut self, result: RenderResult) {
        if let Some(key) = self.key.take() {
            let sender = lock(&self.in_flight).remove(&key);
            if let Some(sender) = sender {
                // No receivers is fine: nobody joined this render.
                let _ = sender.send(result);
            }
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            lock(&self.in_flight).remove(&key);
        }
    }
}

fn lock(map: &Mutex<InFlightMap>) -> MutexGuard<'_, InFlightMap> {
    map.lock().unwrap_or_else(|e| e.into_inner())
}

fn validate(document: &DocumentHandle, page: u32, scale: f32) -> Result<(), RenderError> {
    if !document.contains_page(page) {
        return Err(RenderError::PageOutOfRange {
            page,
            page_count: document.page_count(),
        });
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RenderError::InvalidScale(scale.to_string()));
    }
    if let Some(size) = document.page_size(page) {
        let longest = size.width_pt.max(size.height_pt) * f64::from(scale);
        if longest > MAX_DIMENSION_PX {
            return Err(RenderError::InvalidScale(format!(
                "{scale} would produce a {longest:.0}px raster"
            )));
        }
    }
    Ok(())
}

/// Composite `content` over an opaque white base layer.
///
/// Pages without a background fill would otherwise come out transparent.
/// Integer arithmetic keeps opaque pixels bit-exact.
pub fn flatten_onto_white(content: &RgbaImage) -> RgbaImage {
    ImageBuffer::from_fn(content.width(), content.height(), |x, y| {
        let Rgba([r, g, b, a]) = *content.get_pixel(x, y);
        match a {
            255 => Rgba([r, g, b, 255]),
            0 => Rgba([255, 255, 255, 255]),
            _ => {
                let alpha = u32::from(a);
                let over_white =
                    |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
                Rgba([over_white(r), over_white(g), over_white(b), 255])
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SyntheticRenderer, fixture_pdf};

    fn loaded(renderer: &Arc<SyntheticRenderer>, pages: u32, generation: u64) -> Arc<DocumentHandle> {
        let pdf = fixture_pdf(pages as usize, "raster");
        Arc::new(DocumentHandle::load(&pdf, renderer.as_ref(), generation).unwrap())
    }

    fn rasterizer(renderer: &Arc<SyntheticRenderer>) -> Rasterizer {
        let rasterizer = Rasterizer::new(
            Arc::clone(renderer) as Arc<dyn PageRenderer>,
            Duration::from_secs(300),
        );
        rasterizer.reset(1);
        rasterizer
    }

    #[tokio::test]
    async fn warm_cache_returns_identical_pixels() {
        let renderer = Arc::new(SyntheticRenderer::letter(2));
        let doc = loaded(&renderer, 2, 1);
        let rasterizer = rasterizer(&renderer);

        let first = rasterizer.render_page(&doc, 1, 1.5).await.unwrap();
        let second = rasterizer.render_page(&doc, 1, 1.5).await.unwrap();

        assert_eq!(first.image.as_raw(), second.image.as_raw());
        assert_eq!(renderer.render_calls(), 1);
        assert_eq!((first.width(), first.height()), (918, 1188));
    }

    #[tokio::test]
    async fn different_scales_render_separately() {
        let renderer = Arc::new(SyntheticRenderer::letter(1));
        let doc = loaded(&renderer, 1, 1);
        let rasterizer = rasterizer(&renderer);

        rasterizer.render_page(&doc, 1, 1.0).await.unwrap();
        rasterizer.render_page(&doc, 1, 2.0).await.unwrap();
        assert_eq!(renderer.render_calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_share_one_render() {
        let renderer = Arc::new(
            SyntheticRenderer::letter(1).with_delay(Duration::from_millis(150)),
        );
        let doc = loaded(&renderer, 1, 1);
        let rasterizer = Arc::new(rasterizer(&renderer));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let rasterizer = Arc::clone(&rasterizer);
                let doc = Arc::clone(&doc);
                tokio::spawn(async move { rasterizer.render_page(&doc, 1, 1.0).await })
            })
            .collect();

        let mut rasters = Vec::new();
        for task in tasks {
            rasters.push(task.await.unwrap().unwrap());
        }

        assert_eq!(renderer.render_calls(), 1);
        assert!(rasters.iter().all(|r| r.image == rasters[0].image));
    }

    #[tokio::test]
    async fn out_of_range_page_is_rejected() {
        let renderer = Arc::new(SyntheticRenderer::letter(2));
        let doc = loaded(&renderer, 2, 1);
        let rasterizer = rasterizer(&renderer);

        let err = rasterizer.render_page(&doc, 3, 1.0).await.unwrap_err();
        assert_eq!(err, RenderError::PageOutOfRange { page: 3, page_count: 2 });
        let err = rasterizer.render_page(&doc, 0, 1.0).await.unwrap_err();
        assert!(matches!(err, RenderError::PageOutOfRange { page: 0, .. }));
    }

    #[tokio::test]
    async fn non_positive_scale_is_rejected() {
        let renderer = Arc::new(SyntheticRenderer::letter(1));
        let doc = loaded(&renderer, 1, 1);
        let rasterizer = rasterizer(&renderer);

        assert!(matches!(
            rasterizer.render_page(&doc, 1, 0.0).await,
            Err(RenderError::InvalidScale(_))
        ));
        assert!(matches!(
            rasterizer.render_page(&doc, 1, f32::NAN).await,
            Err(RenderError::InvalidScale(_))
        ));
    }

    #[tokio::test]
    async fn backend_failure_is_a_page_error_and_not_cached() {
        let renderer = Arc::new(SyntheticRenderer::letter(3).failing_on(2));
        let doc = loaded(&renderer, 3, 1);
        let rasterizer = rasterizer(&renderer);

        let err = rasterizer.render_page(&doc, 2, 1.0).await.unwrap_err();
        assert_eq!(err.page(), Some(2));
        assert!(rasterizer.render_page(&doc, 1, 1.0).await.is_ok());
        assert!(rasterizer.render_page(&doc, 2, 1.0).await.is_err());
        assert_eq!(renderer.render_calls(), 3);
    }

    #[tokio::test]
    async fn stale_generation_is_superseded_and_not_cached() {
        let renderer = Arc::new(SyntheticRenderer::letter(1));
        let old_doc = loaded(&renderer, 1, 1);
        let rasterizer = rasterizer(&renderer);
        rasterizer.reset(2);

        let err = rasterizer.render_page(&old_doc, 1, 1.0).await.unwrap_err();
        assert_eq!(err, RenderError::Superseded { page: 1 });
        assert_eq!(rasterizer.cache_stats().entries, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reset_during_render_keeps_old_pixels_out_of_the_cache() {
        let renderer = Arc::new(
            SyntheticRenderer::letter(1).with_delay(Duration::from_millis(150)),
        );
        let old_doc = loaded(&renderer, 1, 1);
        let rasterizer = Arc::new(rasterizer(&renderer));

        let pending = {
            let rasterizer = Arc::clone(&rasterizer);
            let old_doc = Arc::clone(&old_doc);
            tokio::spawn(async move { rasterizer.render_page(&old_doc, 1, 1.0).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        rasterizer.reset(2);

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(err, RenderError::Superseded { page: 1 });
        assert_eq!(rasterizer.cache_stats().entries, 0);

        let new_doc = loaded(&renderer, 1, 2);
        rasterizer.render_page(&new_doc, 1, 1.0).await.unwrap();
        assert_eq!(renderer.render_calls(), 2);
    }

    #[tokio::test]
    async fn reset_invalidates_cache() {
        let renderer = Arc::new(SyntheticRenderer::letter(1));
        let doc = loaded(&renderer, 1, 1);
        let rasterizer = rasterizer(&renderer);
        rasterizer.render_page(&doc, 1, 1.0).await.unwrap();
        assert_eq!(rasterizer.cache_stats().entries, 1);

        rasterizer.reset(2);
        assert_eq!(rasterizer.cache_stats().entries, 0);
    }

    #[test]
    fn flatten_keeps_opaque_and_whitens_transparent() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 0]));
        img.put_pixel(2, 0, Rgba([0, 0, 0, 128]));

        let flat = flatten_onto_white(&img);
        assert_eq!(flat.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(flat.get_pixel(1, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(flat.get_pixel(2, 0), &Rgba([127, 127, 127, 255]));
    }
}
