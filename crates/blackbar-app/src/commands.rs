// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each builds a `Session`, feeds it the input
// file, and reports results on stdout; failures bubble up as
// `BlackbarError` for `main` to humanise.

use std::path::Path;
use std::sync::Arc;

use blackbar_core::error::{BlackbarError, LoadError, Result};
use blackbar_core::human_errors::humanize_partial_export;
use blackbar_core::{Assurance, PageSize, Progress, RedactConfig, RedactionMode};
use blackbar_document::annotate::geometry::Frame;
use blackbar_document::{
    ExportOptions, ExportReport, OverlayOptions, PageRenderer, PdfiumRenderer, ProgressSink,
    Session, render_overlay,
};
use tracing::info;

use crate::input::{RegionSpec, read_pdf, regions_by_page};

/// Open the production renderer and a session over it.
fn open_session(config: &RedactConfig) -> Result<Session> {
    let renderer = PdfiumRenderer::new().map_err(|e| LoadError::Unknown(e.to_string()))?;
    Ok(Session::new(
        Arc::new(renderer) as Arc<dyn PageRenderer>,
        config.clone(),
    ))
}

/// Load `path` into `session`, returning the page sizes.
async fn load(session: &Session, path: &Path, progress: &mut dyn ProgressSink) -> Result<Vec<PageSize>> {
    let data = read_pdf(path, session.config().max_file_bytes)?;
    let page_count = session.load(&data, progress).await?;
    Ok((1..=page_count)
        .map(|page| session.page_size(page).unwrap_or(PageSize::LETTER))
        .collect())
}

/// Progress lines on stderr, keeping stdout for results.
fn stderr_progress() -> impl ProgressSink {
    |p: Progress| match (p.current_page, p.total_pages) {
        (Some(current), Some(total)) => eprintln!("[{:>3}%] {} ({current}/{total})", p.percent, p.message),
        _ => eprintln!("[{:>3}%] {}", p.percent, p.message),
    }
}

// -- info ---------------------------------------------------------------------

pub async fn info(config: &RedactConfig, file: &Path, json: bool) -> Result<()> {
    let session = open_session(config)?;
    let sizes = load(&session, file, &mut blackbar_document::no_progress()).await?;
    let fingerprint = session
        .document()
        .map(|d| d.fingerprint().to_string())
        .unwrap_or_default();

    if json {
        let summary = serde_json::json!({
            "file": file.display().to_string(),
            "pages": sizes.len(),
            "sha256": fingerprint,
            "page_sizes": sizes,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", file.display());
    println!("  pages:  {}", sizes.len());
    println!("  sha256: {fingerprint}");
    for (index, size) in sizes.iter().enumerate() {
        println!(
            "  page {:>4}: {:.1} x {:.1} pt",
            index + 1,
            size.width_pt,
            size.height_pt
        );
    }
    Ok(())
}

// -- redact -------------------------------------------------------------------

pub struct RedactArgs<'a> {
    pub file: &'a Path,
    pub output: &'a Path,
    pub mode: Option<&'a str>,
    pub scale: Option<f32>,
    pub regions: &'a [RegionSpec],
}

pub async fn redact(config: &RedactConfig, args: RedactArgs<'_>) -> Result<()> {
    // Unknown modes fail before any work is done.
    let mode = match args.mode {
        Some(name) => name.parse::<RedactionMode>()?,
        None => config.mode,
    };
    let options = ExportOptions {
        mode,
        scale: args.scale.unwrap_or(config.export_scale),
    };

    let session = open_session(config)?;
    let mut progress = stderr_progress();
    let sizes = load(&session, args.file, &mut progress).await?;
    let regions = regions_by_page(args.regions, &sizes, config)?;
    if args.regions.is_empty() {
        eprintln!("note: no regions given; every page will still be flattened to an image");
    }

    let report = session.export(&regions, options, &mut progress).await?;
    std::fs::write(args.output, &report.bytes)?;
    info!(output = %args.output.display(), bytes_len = report.bytes.len(), "Redacted PDF written");

    print_report(&report, args.output);
    Ok(())
}

fn print_report(report: &ExportReport, output: &Path) {
    println!(
        "Wrote {} ({} of {} pages, {} bytes)",
        output.display(),
        report.pages_written,
        report.total_pages,
        report.bytes.len()
    );
    println!("  mode:   {}", report.mode);
    println!("  sha256: {}", report.output_fingerprint);
    if report.assurance == Assurance::Low {
        println!(
            "  warning: pixelation can leave coarse hints of the covered content; use solid-fill for sensitive material"
        );
    }
    if let Some(warning) = humanize_partial_export(&report.skipped_pages(), report.total_pages) {
        eprintln!("warning: {}", warning.message);
        eprintln!("         {}", warning.suggestion);
        for skipped in &report.skipped {
            eprintln!("         page {}: {}", skipped.page, skipped.reason);
        }
    }
}

// -- preview ------------------------------------------------------------------

pub struct PreviewArgs<'a> {
    pub file: &'a Path,
    pub page: u32,
    pub output: &'a Path,
    pub scale: Option<f32>,
    pub regions: &'a [RegionSpec],
}

pub async fn preview(config: &RedactConfig, args: PreviewArgs<'_>) -> Result<()> {
    let session = open_session(config)?;
    let sizes = load(&session, args.file, &mut blackbar_document::no_progress()).await?;
    let regions = regions_by_page(args.regions, &sizes, config)?;

    let scale = args.scale.unwrap_or(config.preview_scale) * config.device_pixel_ratio;
    let raster = session.render_page(args.page, scale).await?;
    let page_regions = args
        .page
        .checked_sub(1)
        .and_then(|i| regions.get(i as usize))
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let frame = Frame::from(raster.image.dimensions());
    let options = OverlayOptions {
        selected: None,
        preview: None,
        handle_radius: config.handle_hit_radius_px * f64::from(config.device_pixel_ratio),
    };
    let image = render_overlay(&raster.image, page_regions, &options);
    image
        .save(args.output)
        .map_err(|e| BlackbarError::Io(std::io::Error::other(e)))?;

    println!(
        "Wrote {} (page {}, {:.0}x{:.0} px, {} regions)",
        args.output.display(),
        args.page,
        frame.width,
        frame.height,
        page_regions.len()
    );
    Ok(())
}
