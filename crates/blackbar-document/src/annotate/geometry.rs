// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region geometry — the single place where region coordinates are mapped
// between raster resolutions. Both the interactive preview and export use it.

use blackbar_core::Region;

/// A point in raster pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of the raster a user is interacting with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp a point onto the frame.
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(0.0, self.width),
            point.y.clamp(0.0, self.height),
        )
    }
}

impl From<(u32, u32)> for Frame {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}

/// A rectangle in some raster's pixel space, not yet snapped to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle spanned by two corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Linearly map this rectangle from one frame onto another.
    pub fn rescale(&self, from: Frame, to: Frame) -> PixelRect {
        let (sx, sy) = (ratio(to.width, from.width), ratio(to.height, from.height));
        PixelRect {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    /// Move the rectangle so it lies inside the frame, keeping its size where
    /// possible.
    pub fn translate_within(&self, frame: Frame) -> PixelRect {
        let width = self.width.min(frame.width);
        let height = self.height.min(frame.height);
        PixelRect {
            x: self.x.clamp(0.0, frame.width - width),
            y: self.y.clamp(0.0, frame.height - height),
            width,
            height,
        }
    }

    /// Snap to whole pixels inside a `raster_width` x `raster_height` raster.
    ///
    /// The start edge is floored and the end edge ceiled so partially covered
    /// pixels are always included. Returns `None` when nothing remains.
    pub fn to_bounds(&self, raster_width: u32, raster_height: u32) -> Option<PixelBounds> {
        if !(self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()) {
            return None;
        }
        let snap = |v: f64, max: u32| v.clamp(0.0, f64::from(max)) as u32;
        let bounds = PixelBounds {
            x0: snap(self.x.floor(), raster_width),
            y0: snap(self.y.floor(), raster_height),
            x1: snap(self.right().ceil(), raster_width),
            y1: snap(self.bottom().ceil(), raster_height),
        };
        (bounds.width() > 0 && bounds.height() > 0).then_some(bounds)
    }
}

/// Whole-pixel bounds with exclusive end edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelBounds {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// A region's own reference frame (the raster it was drawn on).
pub fn region_frame(region: &Region) -> Frame {
    Frame::new(region.page_width, region.page_height)
}

/// Map a region into the pixel space of a `target_width` x `target_height`
/// raster.
pub fn to_pixel_space(region: &Region, target_width: f64, target_height: f64) -> PixelRect {
    PixelRect::new(region.x, region.y, region.width, region.height)
        .rescale(region_frame(region), Frame::new(target_width, target_height))
}

/// Build a region from a rectangle drawn on a raster of size `frame`.
pub fn region_from_rect(page: u32, rect: PixelRect, frame: Frame) -> Region {
    let mut region = Region::new(
        page,
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        frame.width,
        frame.height,
    );
    region.clamp_to_frame();
    region
}

fn ratio(to: f64, from: f64) -> f64 {
    if from > 0.0 && from.is_finite() {
        to / from
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: PixelRect, b: PixelRect) -> bool {
        (a.x - b.x).abs() < EPS
            && (a.y - b.y).abs() < EPS
            && (a.width - b.width).abs() < EPS
            && (a.height - b.height).abs() < EPS
    }

    #[test]
    fn doubles_when_target_is_twice_the_frame() {
        let region = Region::new(1, 10.0, 20.0, 30.0, 40.0, 100.0, 200.0);
        let rect = to_pixel_space(&region, 200.0, 400.0);
        assert!(close(rect, PixelRect::new(20.0, 40.0, 60.0, 80.0)));
    }

    #[test]
    fn rescaling_through_an_intermediate_raster_matches_direct_mapping() {
        let region = Region::new(2, 13.5, 7.25, 91.0, 33.3, 612.0, 792.0);
        let sizes = [(918.0, 1188.0), (1224.0, 1584.0), (300.0, 777.0), (1.0, 1.0)];

        for &(w1, h1) in &sizes {
            for &(w2, h2) in &sizes {
                let via = to_pixel_space(&region, w1, h1)
                    .rescale(Frame::new(w1, h1), Frame::new(w2, h2));
                let direct = to_pixel_space(&region, w2, h2);
                assert!(close(via, direct), "{via:?} != {direct:?}");
            }
        }
    }

    #[test]
    fn bounds_floor_start_and_ceil_end() {
        let bounds = PixelRect::new(1.4, 2.6, 3.2, 1.1).to_bounds(100, 100).unwrap();
        assert_eq!(bounds, PixelBounds { x0: 1, y0: 2, x1: 5, y1: 4 });
    }

    #[test]
    fn bounds_clip_to_raster() {
        let bounds = PixelRect::new(-5.0, 90.0, 20.0, 50.0).to_bounds(10, 100).unwrap();
        assert_eq!(bounds, PixelBounds { x0: 0, y0: 90, x1: 10, y1: 100 });
        assert!(PixelRect::new(200.0, 0.0, 5.0, 5.0).to_bounds(100, 100).is_none());
    }

    #[test]
    fn zero_sized_frame_maps_to_empty() {
        let region = Region::new(1, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0);
        assert!(to_pixel_space(&region, 100.0, 100.0).to_bounds(100, 100).is_none());
    }

    #[test]
    fn translate_within_keeps_size() {
        let rect = PixelRect::new(90.0, -4.0, 20.0, 10.0).translate_within(Frame::new(100.0, 100.0));
        assert_eq!(rect, PixelRect::new(80.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn region_from_rect_clamps() {
        let region = region_from_rect(1, PixelRect::new(90.0, 90.0, 20.0, 20.0), Frame::new(100.0, 100.0));
        assert_eq!((region.width, region.height), (10.0, 10.0));
        assert_eq!((region.page_width, region.page_height), (100.0, 100.0));
    }
}
