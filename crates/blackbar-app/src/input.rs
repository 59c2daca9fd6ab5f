// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input handling — the checks the pipeline expects callers to make before
// loading (size ceiling, PDF sniff), and region arguments.

use std::path::Path;
use std::str::FromStr;

use blackbar_core::error::{BlackbarError, Result};
use blackbar_core::{PageSize, RedactConfig, Region};
use blackbar_document::RegionEditor;
use blackbar_document::pdf::loader::has_pdf_header;
use tracing::debug;

/// Read a candidate PDF, enforcing the size ceiling and a `%PDF-` sniff.
pub fn read_pdf(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(BlackbarError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }
    let data = std::fs::read(path)?;
    if !has_pdf_header(&data) {
        return Err(BlackbarError::NotPdf(path.display().to_string()));
    }
    debug!(path = %path.display(), bytes_len = data.len(), "Input read");
    Ok(data)
}

/// A region given on the command line, in page points from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSpec {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FromStr for RegionSpec {
    type Err = String;

    /// `PAGE:X,Y,W,H`, e.g. `2:72,100,200,18`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (page, rect) = s
            .split_once(':')
            .ok_or_else(|| format!("expected PAGE:X,Y,W,H, got {s:?}"))?;
        let page: u32 = page
            .trim()
            .parse()
            .map_err(|_| format!("invalid page number {page:?}"))?;

        let numbers = rect
            .split(',')
            .map(|n| n.trim().parse::<f64>().map_err(|_| format!("invalid number {n:?}")))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let [x, y, width, height] = numbers[..] else {
            return Err(format!("expected four numbers after the page, got {}", numbers.len()));
        };
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return Err("region values must be finite".to_string());
        }

        Ok(Self {
            page,
            x,
            y,
            width,
            height,
        })
    }
}

impl RegionSpec {
    /// The region in the page's own point space.
    pub fn to_region(&self, page_size: PageSize) -> Region {
        Region::new(
            self.page,
            self.x,
            self.y,
            self.width,
            self.height,
            page_size.width_pt,
            page_size.height_pt,
        )
    }
}

/// Validate specs against the document and group them by page.
pub fn regions_by_page(
    specs: &[RegionSpec],
    page_sizes: &[PageSize],
    config: &RedactConfig,
) -> Result<Vec<Vec<Region>>> {
    let mut editor = RegionEditor::new(config);
    editor.reset(page_sizes.len() as u32);
    for spec in specs {
        let size = spec
            .page
            .checked_sub(1)
            .and_then(|i| page_sizes.get(i as usize))
            .ok_or_else(|| {
                BlackbarError::InvalidRegion(format!(
                    "page {} does not exist (document has {} pages)",
                    spec.page,
                    page_sizes.len()
                ))
            })?;
        editor.add_region(spec.to_region(*size))?;
    }
    Ok(editor.all_regions().to_vec())
}
