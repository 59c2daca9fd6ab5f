// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region annotation: coordinate mapping, hit-testing, gestures and history.
// No I/O; shared by the interactive preview and export paths.

pub mod editor;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod hit;

pub use editor::{RegionEditor, RegionSet};
pub use geometry::{Frame, PixelBounds, PixelRect, Point, to_pixel_space};
pub use gesture::{Gesture, GestureOutcome};
pub use history::EditHistory;
pub use hit::{Corner, Hit, hit_test};
