// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error taxonomy for Blackbar.
//
// Per-page failures (`RenderError`, `ProcessingError::Page`) are recovered by
// the caller; whole-operation failures propagate with no partial artifact.

use thiserror::Error;

/// Why a document could not be loaded. No document handle survives any of
/// these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("not a valid PDF: {0}")]
    InvalidStructure(String),

    #[error("the document is empty or could not be read")]
    Missing,

    #[error("the document is password protected")]
    PasswordProtected,

    #[error("unexpected error while loading document: {0}")]
    Unknown(String),
}

/// Per-page render failure. `Clone` so coalesced waiters can all receive it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no document is loaded")]
    NoDocument,

    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("invalid render scale {0}")]
    InvalidScale(String),

    #[error("page {page} failed to render: {reason}")]
    Backend { page: u32, reason: String },

    #[error("page {page} render was superseded by a newer document")]
    Superseded { page: u32 },
}

impl RenderError {
    /// The page this error is about, when it is page-specific.
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::PageOutOfRange { page, .. }
            | Self::Backend { page, .. }
            | Self::Superseded { page } => Some(*page),
            Self::NoDocument | Self::InvalidScale(_) => None,
        }
    }
}

/// Failure while producing the redacted output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error("no document is loaded")]
    NoDocument,

    #[error("could not build output document: {0}")]
    Container(String),

    #[error("page {page} could not be processed: {reason}")]
    Page { page: u32, reason: String },

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("no page could be produced; nothing was exported")]
    NoPagesProduced,

    #[error("document changed during export")]
    Superseded,
}

/// A redaction mode name that does not map to any known mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported redaction mode: {0:?}")]
pub struct UnsupportedMode(pub String);

/// Top-level error type for all Blackbar operations.
#[derive(Debug, Error)]
pub enum BlackbarError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    UnsupportedMode(#[from] UnsupportedMode),

    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("not a PDF file: {0}")]
    NotPdf(String),

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlackbarError>;
