// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel-level redaction and the editing preview overlay.

pub mod compositor;
pub mod overlay;

pub use compositor::{REDACTION_BLACK, RedactionCompositor, composite_region};
pub use overlay::{OverlayOptions, render_overlay};
