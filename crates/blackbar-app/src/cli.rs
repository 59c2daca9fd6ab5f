// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::input::RegionSpec;

#[derive(Debug, Parser)]
#[command(name = "blackbar")]
#[command(about = "Irreversibly redact areas of PDF documents", version)]
pub struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug detail (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show page count and page sizes
    Info {
        /// PDF to inspect
        file: PathBuf,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a new PDF with the given areas destroyed
    Redact {
        /// PDF to redact
        file: PathBuf,

        /// Where to write the redacted PDF
        #[arg(short, long)]
        output: PathBuf,

        /// Redaction style: solid-fill or pixelate
        #[arg(short, long)]
        mode: Option<String>,

        /// Export resolution in pixels per point
        #[arg(short, long)]
        scale: Option<f32>,

        /// Area to redact as PAGE:X,Y,W,H in points from the top-left corner
        #[arg(short, long = "region", value_name = "PAGE:X,Y,W,H")]
        regions: Vec<RegionSpec>,
    },

    /// Render one page with the redaction areas outlined, as PNG
    Preview {
        /// PDF to preview
        file: PathBuf,

        /// 1-indexed page to render
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Where to write the PNG
        #[arg(short, long)]
        output: PathBuf,

        /// Preview resolution in pixels per point
        #[arg(short, long)]
        scale: Option<f32>,

        /// Area to outline as PAGE:X,Y,W,H in points from the top-left corner
        #[arg(short, long = "region", value_name = "PAGE:X,Y,W,H")]
        regions: Vec<RegionSpec>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_regions() {
        let cli = Cli::try_parse_from([
            "blackbar",
            "redact",
            "in.pdf",
            "-o",
            "out.pdf",
            "--region",
            "1:10,20,30,40",
            "--region",
            "2:0,0,5.5,6",
            "--mode",
            "pixelate",
        ])
        .unwrap();
        let Command::Redact { regions, mode, .. } = cli.command else {
            panic!("expected redact");
        };
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].page, 2);
        assert_eq!(mode.as_deref(), Some("pixelate"));
    }

    #[test]
    fn rejects_malformed_region() {
        assert!(
            Cli::try_parse_from(["blackbar", "redact", "in.pdf", "-o", "o.pdf", "--region", "1:10,20"])
                .is_err()
        );
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["blackbar", "info", "a.pdf", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
