// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview overlay — show regions over a page raster while editing. This is
// a visual aid only and never feeds the export path.

use blackbar_core::{Region, RegionColor, RegionId};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::annotate::geometry::{PixelBounds, PixelRect, to_pixel_space};
use crate::annotate::hit::Corner;

/// Opacity of the region tint, out of 255.
const TINT_ALPHA: u8 = 72;

/// Colour for the rectangle being drawn.
const PREVIEW_COLOR: RegionColor = RegionColor::new(0x11, 0x11, 0x11);

/// What to draw on top of a page raster.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayOptions {
    pub selected: Option<RegionId>,
    /// Live rectangle of an in-progress gesture, in raster pixels.
    pub preview: Option<PixelRect>,
    /// Half-size of the square corner handles, in raster pixels.
    pub handle_radius: f64,
}

/// Draw regions on a copy of `raster`: translucent tint, solid outline, and
/// corner handles on the selected region.
pub fn render_overlay(raster: &RgbaImage, regions: &[Region], options: &OverlayOptions) -> RgbaImage {
    let (width, height) = raster.dimensions();
    let mut canvas = Blend(raster.clone());

    for region in regions {
        let color = region.color.unwrap_or(RegionColor::PALETTE[0]);
        let rect = to_pixel_space(region, f64::from(width), f64::from(height));
        let Some(bounds) = rect.to_bounds(width, height) else {
            continue;
        };
        draw_filled_rect_mut(&mut canvas, to_rect(bounds), tint(color));
        draw_hollow_rect_mut(&mut canvas.0, to_rect(bounds), opaque(color));

        if options.selected == Some(region.id) {
            draw_handles(&mut canvas.0, &rect, options.handle_radius, opaque(color));
        }
    }

    if let Some(bounds) = options.preview.and_then(|r| r.to_bounds(width, height)) {
        draw_filled_rect_mut(&mut canvas, to_rect(bounds), tint(PREVIEW_COLOR));
        draw_hollow_rect_mut(&mut canvas.0, to_rect(bounds), opaque(PREVIEW_COLOR));
    }

    canvas.0
}

fn draw_handles(image: &mut RgbaImage, rect: &PixelRect, radius: f64, color: Rgba<u8>) {
    let (width, height) = image.dimensions();
    let radius = radius.max(1.0);
    for corner in Corner::ALL {
        let at = corner.of(rect);
        let handle = PixelRect::new(at.x - radius, at.y - radius, radius * 2.0, radius * 2.0);
        if let Some(bounds) = handle.to_bounds(width, height) {
            draw_filled_rect_mut(image, to_rect(bounds), Rgba([255, 255, 255, 255]));
            draw_hollow_rect_mut(image, to_rect(bounds), color);
        }
    }
}

fn to_rect(bounds: PixelBounds) -> Rect {
    Rect::at(bounds.x0 as i32, bounds.y0 as i32).of_size(bounds.width(), bounds.height())
}

fn tint(color: RegionColor) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, TINT_ALPHA])
}

fn opaque(color: RegionColor) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}
