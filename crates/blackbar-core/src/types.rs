// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Blackbar redaction pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UnsupportedMode;

/// Unique identifier for a redaction region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub Uuid);

impl RegionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display colour attached to a region in the interactive editor.
///
/// Purely cosmetic: the compositor never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RegionColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colours cycled through as regions are added, so neighbours differ.
    pub const PALETTE: [RegionColor; 6] = [
        RegionColor::new(0xef, 0x44, 0x44),
        RegionColor::new(0x3b, 0x82, 0xf6),
        RegionColor::new(0x10, 0xb9, 0x81),
        RegionColor::new(0xf5, 0x9e, 0x0b),
        RegionColor::new(0x8b, 0x5c, 0xf6),
        RegionColor::new(0xec, 0x48, 0x99),
    ];

    pub fn for_index(index: usize) -> Self {
        Self::PALETTE[index % Self::PALETTE.len()]
    }
}

/// A rectangle the user wants destroyed, on one page.
///
/// Geometry is expressed in the pixel space of the raster the region was
/// drawn on; `page_width` / `page_height` record that raster's size so the
/// region can be rescaled onto rasters of any other resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// 1-indexed page number.
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page_width: f64,
    pub page_height: f64,
    pub color: Option<RegionColor>,
}

impl Region {
    /// Build a region with a fresh id. Negative extents are normalised so the
    /// stored origin is always the top-left corner; any part left of or above
    /// the page origin is clipped off.
    pub fn new(
        page: u32,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        page_width: f64,
        page_height: f64,
    ) -> Self {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        Self {
            id: RegionId::new(),
            page,
            x: x.max(0.0),
            y: y.max(0.0),
            width: (width + x.min(0.0)).max(0.0),
            height: (height + y.min(0.0)).max(0.0),
            page_width,
            page_height,
            color: None,
        }
    }

    pub fn with_color(mut self, color: RegionColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the point lies within the region (edges inclusive).
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Clamp the geometry into the region's own page frame.
    pub fn clamp_to_frame(&mut self) {
        self.x = self.x.clamp(0.0, self.page_width);
        self.y = self.y.clamp(0.0, self.page_height);
        self.width = self.width.min(self.page_width - self.x).max(0.0);
        self.height = self.height.min(self.page_height - self.y).max(0.0);
    }
}

/// How marked areas are destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedactionMode {
    /// Opaque black rectangle, encoded losslessly.
    #[default]
    SolidFill,
    /// Block-averaged mosaic, encoded lossily. Lower assurance.
    Pixelate,
}

/// How strongly a mode guarantees the covered content is unrecoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assurance {
    High,
    Low,
}

impl RedactionMode {
    pub fn assurance(&self) -> Assurance {
        match self {
            Self::SolidFill => Assurance::High,
            Self::Pixelate => Assurance::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SolidFill => "solid-fill",
            Self::Pixelate => "pixelate",
        }
    }
}

impl fmt::Display for RedactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RedactionMode {
    type Err = UnsupportedMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "solid-fill" | "solidFill" | "solid" | "canvas" => Ok(Self::SolidFill),
            "pixelate" => Ok(Self::Pixelate),
            other => Err(UnsupportedMode(other.to_string())),
        }
    }
}

/// Macro-stage of a long-running pipeline operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Loading,
    Rendering,
    Processing,
    Finalizing,
}

/// Status snapshot pushed to UI consumers. Has no effect on control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub stage: Stage,
    /// 0..=100.
    pub percent: u8,
    pub message: String,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
}

impl Progress {
    pub fn new(stage: Stage, percent: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            percent: percent.min(100),
            message: message.into(),
            current_page: None,
            total_pages: None,
        }
    }

    pub fn with_pages(mut self, current: u32, total: u32) -> Self {
        self.current_page = Some(current);
        self.total_pages = Some(total);
        self
    }
}

/// Native page size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PageSize {
    /// US Letter, used when a page carries no usable MediaBox.
    pub const LETTER: PageSize = PageSize {
        width_pt: 612.0,
        height_pt: 792.0,
    };

    /// Pixel dimensions of a raster rendered at `scale` pixels per point.
    pub fn pixels_at(&self, scale: f32) -> (u32, u32) {
        let s = f64::from(scale);
        (
            ((self.width_pt * s).round() as u32).max(1),
            ((self.height_pt * s).round() as u32).max(1),
        )
    }
}
