// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — rendering backend, source loading, and output assembly.

pub mod assembler;
pub mod backend;
pub mod loader;

pub use assembler::{DocumentAssembler, PageCodec};
pub use backend::{BackendError, PageRenderer, PdfiumRenderer};
pub use loader::DocumentHandle;
