// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test support: a deterministic renderer and generated fixture PDFs, so the
// pipeline can be exercised without a PDFium binary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use blackbar_core::PageSize;
use image::{Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::pdf::backend::{BackendError, PageRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Normal,
    Password,
    Unavailable,
}

/// Renders a fixed striped pattern per page, sized like a real page.
pub struct SyntheticRenderer {
    pages: u32,
    size: PageSize,
    delay: Option<Duration>,
    open_delay: Option<Duration>,
    failing: Vec<u32>,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl SyntheticRenderer {
    /// `pages` US Letter pages.
    pub fn letter(pages: u32) -> Self {
        Self {
            pages,
            size: PageSize::LETTER,
            delay: None,
            open_delay: None,
            failing: Vec::new(),
            behaviour: Behaviour::Normal,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every render.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep this long while counting pages, i.e. during every load.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Fail every render of `page`.
    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing.push(page);
        self
    }

    /// Refuse to open documents, as for an encrypted file.
    pub fn password_protected(mut self) -> Self {
        self.behaviour = Behaviour::Password;
        self
    }

    /// Fail to open documents for a non-format reason.
    pub fn unavailable(mut self) -> Self {
        self.behaviour = Behaviour::Unavailable;
        self
    }

    pub fn render_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn open(&self) -> Result<(), BackendError> {
        match self.behaviour {
            Behaviour::Normal => Ok(()),
            Behaviour::Password => Err(BackendError::Password),
            Behaviour::Unavailable => Err(BackendError::Other("renderer unavailable".to_string())),
        }
    }
}

impl PageRenderer for SyntheticRenderer {
    fn page_count(&self, _pdf: &[u8]) -> Result<u32, BackendError> {
        self.open()?;
        if let Some(delay) = self.open_delay {
            std::thread::sleep(delay);
        }
        Ok(self.pages)
    }

    fn render(&self, _pdf: &[u8], page: u32, scale: f32) -> Result<RgbaImage, BackendError> {
        self.open()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if page == 0 || page > self.pages {
            return Err(BackendError::NoSuchPage(page));
        }
        if self.failing.contains(&page) {
            return Err(BackendError::Other(format!("synthetic failure on page {page}")));
        }
        Ok(pattern(page, self.size.pixels_at(scale)))
    }
}

/// Dark "text lines" on a transparent background; the rasterizer flattens
/// the background onto white.
fn pattern(page: u32, (width, height): (u32, u32)) -> RgbaImage {
    let ink = Rgba([(page * 40 % 200) as u8, 20, 30, 255]);
    RgbaImage::from_fn(width, height, |x, y| {
        if (y / 6) % 3 == 0 && (x / 5) % 7 != 6 {
            ink
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// A real PDF with `pages` Letter pages, each showing `text` in Helvetica.
/// The MediaBox lives on the Pages node and is inherited.
pub fn fixture_pdf(pages: usize, text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for index in 0..pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{text} {}", index + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
