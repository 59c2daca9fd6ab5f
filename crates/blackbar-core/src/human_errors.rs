// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity separates "nothing happened, fix your input" from "the output
// exists but some pages may be missing".

use crate::error::{BlackbarError, LoadError, ProcessingError, RenderError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A retry may succeed (a single page failed to draw).
    Transient,
    /// The user must change something (password, smaller file, other mode).
    ActionRequired,
    /// The input cannot be used as-is; nothing was produced.
    Permanent,
    /// An output was produced but is missing some pages.
    Partial,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same action may help.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `BlackbarError` into a `HumanError`.
pub fn humanize_error(err: &BlackbarError) -> HumanError {
    match err {
        BlackbarError::Load(load) => humanize_load_error(load),
        BlackbarError::Render(render) => humanize_render_error(render),
        BlackbarError::Processing(processing) => humanize_processing_error(processing),

        BlackbarError::UnsupportedMode(mode) => HumanError {
            message: "That redaction style isn't available.".into(),
            suggestion: format!("Choose \"solid-fill\" or \"pixelate\". ({mode})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BlackbarError::FileTooLarge { limit, .. } => HumanError {
            message: "This file is too large.".into(),
            suggestion: format!(
                "Files up to {} MB are supported. Try splitting the document first.",
                limit / (1024 * 1024)
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BlackbarError::NotPdf(_) => HumanError {
            message: "This isn't a PDF file.".into(),
            suggestion: "Only PDF documents can be redacted. Save or export the file as PDF first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BlackbarError::InvalidRegion(detail) => HumanError {
            message: "One of the redaction areas isn't valid.".into(),
            suggestion: format!("Check the page number and size of each area. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BlackbarError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Blackbar doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or try a different location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        BlackbarError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check the configuration file is valid JSON, or remove it to use defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_load_error(err: &LoadError) -> HumanError {
    match err {
        LoadError::InvalidStructure(_) => HumanError {
            message: "This file isn't a readable PDF.".into(),
            suggestion: "The file may be damaged or not really a PDF. Try opening it in a PDF viewer first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        LoadError::Missing => HumanError {
            message: "The file is empty.".into(),
            suggestion: "Choose the file again; it may not have finished downloading.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        LoadError::PasswordProtected => HumanError {
            message: "This PDF is password protected.".into(),
            suggestion: "Remove the password in your PDF viewer (print or save without protection), then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        LoadError::Unknown(detail) => HumanError {
            message: "The PDF couldn't be opened.".into(),
            suggestion: format!("Try again, or try a different copy of the file. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_render_error(err: &RenderError) -> HumanError {
    match err {
        RenderError::NoDocument => HumanError {
            message: "No document is open.".into(),
            suggestion: "Open a PDF first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        RenderError::PageOutOfRange { page, page_count } => HumanError {
            message: format!("Page {page} doesn't exist."),
            suggestion: format!("This document has {page_count} pages."),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        RenderError::InvalidScale(_) => HumanError {
            message: "That zoom level isn't supported.".into(),
            suggestion: "Pick a zoom level greater than zero.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        RenderError::Backend { page, .. } => HumanError {
            message: format!("Page {page} couldn't be displayed."),
            suggestion: "Try again. Pages with unusual fonts or damaged content sometimes fail to draw.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        RenderError::Superseded { .. } => HumanError {
            message: "A different document was opened.".into(),
            suggestion: "This page belonged to the previous document and was discarded.".into(),
            retriable: false,
            severity: Severity::Transient,
        },
    }
}

fn humanize_processing_error(err: &ProcessingError) -> HumanError {
    match err {
        ProcessingError::NoDocument => HumanError {
            message: "No document is open.".into(),
            suggestion: "Open a PDF before exporting.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        ProcessingError::Page { page, .. } => HumanError {
            message: format!("Page {page} couldn't be redacted."),
            suggestion: "The rest of the document was still processed. Check the output carefully.".into(),
            retriable: true,
            severity: Severity::Partial,
        },
        ProcessingError::Container(_) | ProcessingError::Encode(_) => HumanError {
            message: "The redacted PDF couldn't be created.".into(),
            suggestion: "Nothing was saved. Try again, or try a lower export quality.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        ProcessingError::NoPagesProduced => HumanError {
            message: "None of the pages could be redacted.".into(),
            suggestion: "Nothing was saved. The document may be damaged; try a different copy.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        ProcessingError::Superseded => HumanError {
            message: "The document changed while exporting.".into(),
            suggestion: "Nothing was saved. Export again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

/// Warning for an export that succeeded but dropped pages, or `None` when
/// every page made it.
pub fn humanize_partial_export(skipped_pages: &[u32], total_pages: u32) -> Option<HumanError> {
    if skipped_pages.is_empty() {
        return None;
    }
    let list = skipped_pages
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Some(HumanError {
        message: format!(
            "{} of {} pages may be missing from the redacted PDF.",
            skipped_pages.len(),
            total_pages
        ),
        suggestion: format!("These pages could not be processed: {list}. Everything else was redacted and saved."),
        retriable: true,
        severity: Severity::Partial,
    })
}
