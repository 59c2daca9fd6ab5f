// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — build a brand-new PDF whose only page content is one
// sanitised image per page. Nothing from the source document is copied.

use std::io::Write;

use blackbar_core::RedactionMode;
use blackbar_core::error::ProcessingError;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info, instrument};

/// Producer string written to the fresh `/Info` dictionary.
const PRODUCER: &str = concat!("blackbar ", env!("CARGO_PKG_VERSION"));

/// Resource name the page content stream draws.
const IMAGE_NAME: &str = "Im0";

/// How a sanitised page is encoded before embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCodec {
    /// Raw RGB, zlib-compressed (`/FlateDecode`). Lossless.
    Flate,
    /// Baseline JPEG (`/DCTDecode`). Lossy.
    Jpeg { quality: u8 },
}

impl PageCodec {
    /// Lossless for solid fill, lossy for pixelate.
    pub fn for_mode(mode: RedactionMode, jpeg_quality: u8) -> Self {
        match mode {
            RedactionMode::SolidFill => Self::Flate,
            RedactionMode::Pixelate => Self::Jpeg {
                quality: jpeg_quality.clamp(1, 100),
            },
        }
    }

    fn filter(&self) -> &'static str {
        match self {
            Self::Flate => "FlateDecode",
            Self::Jpeg { .. } => "DCTDecode",
        }
    }
}

/// One page's image, encoded and ready to embed.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub width: u32,
    pub height: u32,
    pub codec: PageCodec,
    pub data: Vec<u8>,
}

/// Encode a sanitised raster with `codec`.
///
/// CPU-bound; the session runs it on the blocking pool.
pub fn encode_page(image: &RgbaImage, codec: PageCodec) -> Result<EncodedPage, ProcessingError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ProcessingError::Encode("empty raster".to_string()));
    }
    // Rasters are already flattened onto white, so alpha carries nothing.
    let rgb = RgbImage::from_fn(width, height, |x, y| {
        let p = image.get_pixel(x, y);
        Rgb([p[0], p[1], p[2]])
    });

    let data = match codec {
        PageCodec::Flate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(rgb.as_raw())
                .map_err(|e| ProcessingError::Encode(format!("flate: {e}")))?;
            encoder
                .finish()
                .map_err(|e| ProcessingError::Encode(format!("flate: {e}")))?
        }
        PageCodec::Jpeg { quality } => {
            let mut buf = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| ProcessingError::Encode(format!("jpeg: {e}")))?;
            buf
        }
    };

    debug!(width, height, ?codec, encoded_len = data.len(), "Page encoded");
    Ok(EncodedPage {
        width,
        height,
        codec,
        data,
    })
}

/// Builds the output document page by page.
pub struct DocumentAssembler {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Append a page sized 1:1 to the image's pixel dimensions.
    pub fn push_page(&mut self, page: EncodedPage) {
        let EncodedPage {
            width,
            height,
            codec,
            data,
        } = page;

        let image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => codec.filter(),
        };
        let image_id = self
            .document
            .add_object(Stream::new(image_dict, data).with_compression(false));

        let content = format!("q {width} 0 0 {height} 0 0 cm /{IMAGE_NAME} Do Q");
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(i64::from(width)),
                Object::Integer(i64::from(height)),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
            "Contents" => content_id,
        });
        self.kids.push(page_id.into());
    }

    /// Encode and append in one step.
    pub fn add_page(&mut self, image: &RgbaImage, codec: PageCodec) -> Result<(), ProcessingError> {
        self.push_page(encode_page(image, codec)?);
        Ok(())
    }

    pub fn pages_written(&self) -> usize {
        self.kids.len()
    }

    /// Serialise the document.
    #[instrument(skip(self), fields(pages = self.kids.len()))]
    pub fn finish(mut self) -> Result<Vec<u8>, ProcessingError> {
        if self.kids.is_empty() {
            return Err(ProcessingError::NoPagesProduced);
        }

        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.document.add_object(dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
        });
        self.document.trailer.set("Root", catalog_id);
        self.document.trailer.set("Info", info_id);

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|e| ProcessingError::Container(format!("failed to serialise PDF: {e}")))?;

        info!(pages = count, bytes_len = output.len(), "Output document assembled");
        Ok(output)
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble sanitised pages, in order, into a new document.
pub fn assemble(pages: &[RgbaImage], codec: PageCodec) -> Result<Vec<u8>, ProcessingError> {
    let mut assembler = DocumentAssembler::new();
    for image in pages {
        assembler.add_page(image, codec)?;
    }
    assembler.finish()
}
