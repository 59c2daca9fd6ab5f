// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pointer gestures — the draw / move / resize state machine. Intermediate
// pointer moves only update the gesture; the editor commits on release.

use blackbar_core::RegionId;

use crate::annotate::geometry::{Frame, PixelRect, Point};
use crate::annotate::hit::Corner;

/// An in-progress pointer interaction, in the pixel space of `frame`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Drawing {
        page: u32,
        frame: Frame,
        origin: Point,
        current: Point,
    },
    Moving {
        id: RegionId,
        frame: Frame,
        grab: Point,
        start: PixelRect,
        rect: PixelRect,
    },
    Resizing {
        id: RegionId,
        frame: Frame,
        anchor: Point,
        rect: PixelRect,
    },
}

/// What a finished gesture asks the editor to commit.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Nothing to commit (a click, or no gesture was active).
    None,
    Draw {
        page: u32,
        rect: PixelRect,
        frame: Frame,
    },
    Move {
        id: RegionId,
        rect: PixelRect,
        frame: Frame,
    },
    Resize {
        id: RegionId,
        rect: PixelRect,
        frame: Frame,
    },
}

impl Gesture {
    pub fn draw(page: u32, frame: Frame, at: Point) -> Self {
        let origin = frame.clamp(at);
        Gesture::Drawing {
            page,
            frame,
            origin,
            current: origin,
        }
    }

    pub fn move_region(id: RegionId, frame: Frame, grab: Point, rect: PixelRect) -> Self {
        Gesture::Moving {
            id,
            frame,
            grab,
            start: rect,
            rect,
        }
    }

    /// Resize by dragging `corner`; the opposite corner stays put.
    pub fn resize(id: RegionId, frame: Frame, corner: Corner, rect: PixelRect) -> Self {
        Gesture::Resizing {
            id,
            frame,
            anchor: corner.opposite().of(&rect),
            rect,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }

    /// Track the pointer.
    pub fn update(&mut self, to: Point) {
        match self {
            Gesture::Idle => {}
            Gesture::Drawing { frame, current, .. } => *current = frame.clamp(to),
            Gesture::Moving {
                frame,
                grab,
                start,
                rect,
                ..
            } => {
                let moved = PixelRect {
                    x: start.x + (to.x - grab.x),
                    y: start.y + (to.y - grab.y),
                    ..*start
                };
                *rect = moved.translate_within(*frame);
            }
            Gesture::Resizing {
                frame,
                anchor,
                rect,
                ..
            } => *rect = PixelRect::from_corners(*anchor, frame.clamp(to)),
        }
    }

    /// The rectangle to draw as live feedback.
    pub fn preview_rect(&self) -> Option<PixelRect> {
        match self {
            Gesture::Idle => None,
            Gesture::Drawing {
                origin, current, ..
            } => Some(PixelRect::from_corners(*origin, *current)),
            Gesture::Moving { rect, .. } | Gesture::Resizing { rect, .. } => Some(*rect),
        }
    }

    /// Apply the release position and hand back what to commit.
    pub fn finish(mut self, at: Point) -> GestureOutcome {
        self.update(at);
        match self {
            Gesture::Idle => GestureOutcome::None,
            Gesture::Drawing {
                page,
                frame,
                origin,
                current,
            } => GestureOutcome::Draw {
                page,
                rect: PixelRect::from_corners(origin, current),
                frame,
            },
            Gesture::Moving {
                id,
                frame,
                start,
                rect,
                ..
            } => {
                if rect == start {
                    GestureOutcome::None
                } else {
                    GestureOutcome::Move { id, rect, frame }
                }
            }
            Gesture::Resizing { id, frame, rect, .. } => GestureOutcome::Resize { id, rect, frame },
        }
    }
}
