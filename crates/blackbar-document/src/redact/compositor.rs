// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction compositor — destroy the pixels under each region of a page
// raster. Works on pixels only; the source document's text and vector
// objects are never consulted.

use blackbar_core::{RedactConfig, RedactionMode, Region};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, instrument};

use crate::annotate::geometry::{PixelBounds, to_pixel_space};
use crate::raster::cache::PageRaster;

/// Exact fill colour for solid redaction.
pub const REDACTION_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Applies one redaction mode to page rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedactionCompositor {
    mode: RedactionMode,
    block_size: u32,
}

impl RedactionCompositor {
    pub fn new(mode: RedactionMode, block_size: u32) -> Self {
        Self {
            mode,
            block_size: block_size.max(1),
        }
    }

    /// Mode and block size from configuration (block scaled by device pixel
    /// ratio).
    pub fn from_config(config: &RedactConfig, mode: RedactionMode) -> Self {
        Self::new(mode, config.block_size_px())
    }

    pub fn mode(&self) -> RedactionMode {
        self.mode
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Composite `regions` onto a copy of the raster, in the order given.
    #[instrument(skip_all, fields(page = raster.page, regions = regions.len(), mode = %self.mode))]
    pub fn composite(&self, raster: &PageRaster, regions: &[Region]) -> RgbaImage {
        let mut image = raster.image.clone();
        self.composite_in_place(&mut image, regions);
        image
    }

    /// Composite directly into `image`. Later regions paint over earlier
    /// ones where they overlap.
    pub fn composite_in_place(&self, image: &mut RgbaImage, regions: &[Region]) {
        let (width, height) = image.dimensions();
        let mut applied = 0usize;
        for region in regions {
            let rect = to_pixel_space(region, f64::from(width), f64::from(height));
            if let Some(bounds) = rect.to_bounds(width, height) {
                composite_region(self.mode, image, bounds, self.block_size);
                applied += 1;
            }
        }
        debug!(applied, skipped = regions.len() - applied, "Regions composited");
    }
}

/// Redact one rectangle of `image` in `mode`.
pub fn composite_region(mode: RedactionMode, image: &mut RgbaImage, bounds: PixelBounds, block_size: u32) {
    match mode {
        RedactionMode::SolidFill => solid_fill(image, bounds),
        RedactionMode::Pixelate => pixelate(image, bounds, block_size),
    }
}

/// Paint `bounds` exactly `(0, 0, 0, 255)`. No blending, no soft edges.
pub fn solid_fill(image: &mut RgbaImage, bounds: PixelBounds) {
    if bounds.width() == 0 || bounds.height() == 0 {
        return;
    }
    let rect = Rect::at(bounds.x0 as i32, bounds.y0 as i32).of_size(bounds.width(), bounds.height());
    draw_filled_rect_mut(image, rect, REDACTION_BLACK);
}

/// Replace each `block_size` square inside `bounds` with the mean of its
/// pixels. Edge blocks are clipped to `bounds`; alpha becomes opaque.
pub fn pixelate(image: &mut RgbaImage, bounds: PixelBounds, block_size: u32) {
    let block = block_size.max(1);
    let x1 = bounds.x1.min(image.width());
    let y1 = bounds.y1.min(image.height());

    let mut by = bounds.y0;
    while by < y1 {
        let block_y1 = by.saturating_add(block).min(y1);
        let mut bx = bounds.x0;
        while bx < x1 {
            let block_x1 = bx.saturating_add(block).min(x1);

            let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
            for y in by..block_y1 {
                for x in bx..block_x1 {
                    let Rgba([pr, pg, pb, _]) = *image.get_pixel(x, y);
                    r += u64::from(pr);
                    g += u64::from(pg);
                    b += u64::from(pb);
                }
            }
            let count = u64::from(block_x1 - bx) * u64::from(block_y1 - by);
            let mean = Rgba([(r / count) as u8, (g / count) as u8, (b / count) as u8, 255]);
            for y in by..block_y1 {
                for x in bx..block_x1 {
                    image.put_pixel(x, y, mean);
                }
            }

            bx = block_x1;
        }
        by = block_y1;
    }
}
