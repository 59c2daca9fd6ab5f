// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module — page rasterisation and the rendered-page cache.

pub mod cache;
pub mod rasterizer;

pub use cache::{CacheKey, CacheStats, PageRaster, RasterCache};
pub use rasterizer::Rasterizer;
