// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hit-testing — decide what a pointer press on a page raster lands on.

use blackbar_core::{Region, RegionId};

use crate::annotate::geometry::{Frame, PixelRect, Point, to_pixel_space};

/// A corner of a region, used as a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Position of this corner on `rect`.
    pub fn of(&self, rect: &PixelRect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x, rect.y),
            Corner::TopRight => Point::new(rect.right(), rect.y),
            Corner::BottomLeft => Point::new(rect.x, rect.bottom()),
            Corner::BottomRight => Point::new(rect.right(), rect.bottom()),
        }
    }

    /// The corner diagonally across, which stays fixed while resizing.
    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// What a pointer position resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// A resize handle of the selected region.
    Handle { id: RegionId, corner: Corner },
    /// The body of a region (the topmost one on overlap).
    Body { id: RegionId },
    /// Nothing; a press here starts drawing a new region.
    Empty,
}

/// Resolve `point` against the regions of one page.
///
/// `regions` are in z-order, last on top. `frame` is the size of the raster
/// the pointer is over; regions are mapped into it before testing.
/// `handle_radius` is in that raster's pixels and does not grow with zoom.
///
/// Precedence: selected region's handles, then the topmost body, then empty.
pub fn hit_test(
    point: Point,
    regions: &[Region],
    selected: Option<RegionId>,
    frame: Frame,
    handle_radius: f64,
) -> Hit {
    if let Some(selected) = selected.and_then(|id| regions.iter().find(|r| r.id == id)) {
        let rect = to_pixel_space(selected, frame.width, frame.height);
        let nearest = Corner::ALL
            .iter()
            .map(|corner| (*corner, distance(point, corner.of(&rect))))
            .filter(|(_, d)| *d <= handle_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((corner, _)) = nearest {
            return Hit::Handle {
                id: selected.id,
                corner,
            };
        }
    }

    regions
        .iter()
        .rev()
        .find(|region| to_pixel_space(region, frame.width, frame.height).contains(point))
        .map_or(Hit::Empty, |region| Hit::Body { id: region.id })
}

fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Frame = Frame::new(100.0, 100.0);

    fn region(x: f64, y: f64, w: f64, h: f64) -> Region {
        Region::new(1, x, y, w, h, 100.0, 100.0)
    }

    #[test]
    fn empty_canvas() {
        let regions = vec![region(10.0, 10.0, 20.0, 20.0)];
        assert_eq!(hit_test(Point::new(80.0, 80.0), &regions, None, FRAME, 8.0), Hit::Empty);
    }

    #[test]
    fn topmost_body_wins_on_overlap() {
        let below = region(10.0, 10.0, 40.0, 40.0);
        let above = region(30.0, 30.0, 40.0, 40.0);
        let regions = vec![below.clone(), above.clone()];
        assert_eq!(
            hit_test(Point::new(35.0, 35.0), &regions, None, FRAME, 8.0),
            Hit::Body { id: above.id }
        );
        assert_eq!(
            hit_test(Point::new(15.0, 15.0), &regions, None, FRAME, 8.0),
            Hit::Body { id: below.id }
        );
    }

    #[test]
    fn handle_beats_body() {
        let selected = region(30.0, 30.0, 40.0, 40.0);
        let covering = region(0.0, 0.0, 100.0, 100.0);
        let regions = vec![selected.clone(), covering];
        assert_eq!(
            hit_test(Point::new(72.0, 69.0), &regions, Some(selected.id), FRAME, 8.0),
            Hit::Handle {
                id: selected.id,
                corner: Corner::BottomRight
            }
        );
    }

    #[test]
    fn handles_only_on_selected_region() {
        let r = region(30.0, 30.0, 40.0, 40.0);
        let regions = vec![r.clone()];
        assert_eq!(
            hit_test(Point::new(26.0, 26.0), &regions, None, FRAME, 8.0),
            Hit::Empty
        );
    }

    #[test]
    fn handle_radius_is_in_target_pixels() {
        // Region drawn on a 100px frame, tested on a 400px raster.
        let r = region(10.0, 10.0, 20.0, 20.0);
        let regions = vec![r.clone()];
        let big = Frame::new(400.0, 400.0);
        assert_eq!(
            hit_test(Point::new(45.0, 45.0), &regions, Some(r.id), big, 8.0),
            Hit::Handle {
                id: r.id,
                corner: Corner::TopLeft
            }
        );
        assert_eq!(
            hit_test(Point::new(30.0, 30.0), &regions, Some(r.id), big, 8.0),
            Hit::Empty
        );
    }

    #[test]
    fn opposite_corners() {
        for corner in Corner::ALL {
            assert_eq!(corner.opposite().opposite(), corner);
        }
    }
}
