// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::RedactionMode;

/// Tunables for loading, rendering, editing, and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactConfig {
    /// Redaction mode used when the caller does not pick one.
    pub mode: RedactionMode,
    /// Pixels per PDF point for interactive preview rasters.
    pub preview_scale: f32,
    /// Pixels per PDF point for export rasters.
    pub export_scale: f32,
    /// Display density; scales the pixelation block size and handle radius.
    pub device_pixel_ratio: f32,
    /// Pixelation block edge in CSS pixels (before the density multiplier).
    pub pixel_block_size: u32,
    /// JPEG quality (1-100) for pixelated exports.
    pub jpeg_quality: u8,
    /// Rendered pages older than this are dropped from the raster cache.
    pub cache_ttl_secs: u64,
    /// Maximum number of undo snapshots.
    pub history_limit: usize,
    /// Regions narrower or shorter than this (raster pixels) are discarded.
    pub min_region_px: f64,
    /// Corner handle grab distance in raster pixels.
    pub handle_hit_radius_px: f64,
    /// Input size ceiling enforced by the front end.
    pub max_file_bytes: u64,
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self {
            mode: RedactionMode::SolidFill,
            preview_scale: 1.5,
            export_scale: 2.0,
            device_pixel_ratio: 1.0,
            pixel_block_size: 8,
            jpeg_quality: 85,
            cache_ttl_secs: 300,
            history_limit: 50,
            min_region_px: 5.0,
            handle_hit_radius_px: 8.0,
            max_file_bytes: 50 * 1024 * 1024,
        }
    }
}

impl RedactConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Effective pixelation block edge in device pixels, never zero.
    pub fn block_size_px(&self) -> u32 {
        ((self.pixel_block_size as f32 * self.device_pixel_ratio).round() as u32).max(1)
    }

    /// Read a JSON config file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }
}
