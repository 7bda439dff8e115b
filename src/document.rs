//! PDF assembly from frame images.
//!
//! [`DocumentAssembler`] binds an ordered list of images into a PDF with one
//! page per image. The page size is taken from the *first* image, converting
//! pixels to millimetres at a fixed 96 px/inch, and applied to every page;
//! each image is stretched to fill its page exactly.
//!
//! # Example
//!
//! ```no_run
//! use vidshot::DocumentAssembler;
//!
//! let document = DocumentAssembler::new()
//!     .assemble(&["frame_0000.jpg", "frame_0001.jpg"], "frames.pdf")?;
//! println!("{} pages of {:?}", document.page_count, document.page_size);
//! # Ok::<(), vidshot::VidshotError>(())
//! ```

use std::{
    fs,
    io::{BufWriter, Cursor, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use image::{ColorType, ImageDecoder, ImageFormat, ImageReader, codecs::jpeg::JpegEncoder};
use lopdf::{
    Document, Object, ObjectId, Stream,
    content::{Content, Operation},
    dictionary,
};
use tempfile::NamedTempFile;

use crate::{
    error::VidshotError,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
};

/// Assumed pixel density of frame images.
pub const REFERENCE_DPI: f64 = 96.0;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

const PDF_VERSION: &str = "1.5";
const IMAGE_NAME: &str = "Im0";

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Page width in millimetres.
    pub width_mm: f64,
    /// Page height in millimetres.
    pub height_mm: f64,
}

impl PageSize {
    /// Page size for an image of `width` × `height` pixels at
    /// [`REFERENCE_DPI`].
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self {
            width_mm: pixels_to_mm(width),
            height_mm: pixels_to_mm(height),
        }
    }

    /// Width in PDF points.
    pub fn width_points(&self) -> f64 {
        mm_to_points(self.width_mm)
    }

    /// Height in PDF points.
    pub fn height_points(&self) -> f64 {
        mm_to_points(self.height_mm)
    }
}

/// `pixels × 25.4 / 96`
pub fn pixels_to_mm(pixels: u32) -> f64 {
    pixels as f64 * MM_PER_INCH / REFERENCE_DPI
}

fn mm_to_points(mm: f64) -> f64 {
    mm * POINTS_PER_INCH / MM_PER_INCH
}

/// Summary of a written PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDocument {
    /// Where the PDF was written.
    pub path: PathBuf,
    /// Number of pages, equal to the number of input images.
    pub page_count: usize,
    /// Size shared by every page.
    pub page_size: PageSize,
}

/// Builds multi-page PDFs from image files.
pub struct DocumentAssembler {
    jpeg_quality: u8,
    progress: Arc<dyn ProgressCallback>,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self {
            jpeg_quality: 95,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// JPEG quality used when a non-JPEG input has to be re-encoded.
    /// Clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Write `images` to `output` as one page each, in order.
    ///
    /// The PDF is written next to `output` under a temporary name and moved
    /// into place once complete, so a failure never leaves a partial file.
    ///
    /// # Errors
    ///
    /// - [`VidshotError::NoImages`] if `images` is empty. No file is created.
    /// - [`VidshotError::ImageError`] / [`VidshotError::IoError`] if an
    ///   image cannot be read.
    /// - [`VidshotError::PdfError`] / [`VidshotError::IoError`] if the PDF
    ///   cannot be written.
    pub fn assemble<P, Q>(
        &self,
        images: &[P],
        output: Q,
    ) -> Result<AssembledDocument, VidshotError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let output = output.as_ref();
        let first = images.first().ok_or(VidshotError::NoImages)?;

        let (width, height) = image::image_dimensions(first.as_ref())?;
        let page_size = PageSize::from_pixels(width, height);
        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            (page_size.width_points() as f32).into(),
            (page_size.height_points() as f32).into(),
        ];

        log::debug!(
            "Assembling {} page(s) at {:.2} x {:.2} mm into {}",
            images.len(),
            page_size.width_mm,
            page_size.height_mm,
            output.display()
        );

        let mut document = Document::with_version(PDF_VERSION);
        let pages_id = document.new_object_id();
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.progress),
            OperationType::DocumentAssembly,
            Some(images.len() as u64),
        );

        let mut kids: Vec<Object> = Vec::with_capacity(images.len());
        for image_path in images {
            let page_id = self.add_page(
                &mut document,
                pages_id,
                image_path.as_ref(),
                &page_size,
                &media_box,
            )?;
            kids.push(page_id.into());
            tracker.advance(1, None);
        }

        let page_count = kids.len();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        write_atomically(&mut document, output)?;
        tracker.finish();
        log::info!("Wrote {page_count} page(s) to {}", output.display());

        Ok(AssembledDocument {
            path: output.to_path_buf(),
            page_count,
            page_size,
        })
    }

    fn add_page(
        &self,
        document: &mut Document,
        pages_id: ObjectId,
        image_path: &Path,
        page_size: &PageSize,
        media_box: &[Object],
    ) -> Result<ObjectId, VidshotError> {
        let embedded = self.embed_image(image_path)?;
        let image_id = document.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => embedded.width as i64,
                "Height" => embedded.height as i64,
                "ColorSpace" => embedded.color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            embedded.data,
        )
        .with_compression(false));

        // Unit square scaled to the full page, origin at the bottom-left.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        (page_size.width_points() as f32).into(),
                        0.into(),
                        0.into(),
                        (page_size.height_points() as f32).into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));

        Ok(document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.to_vec(),
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
            "Contents" => content_id,
        }))
    }

    /// JPEG bytes ready for a `DCTDecode` stream.
    ///
    /// JPEG files are embedded as they are; anything else is decoded and
    /// re-encoded as RGB JPEG.
    fn embed_image(&self, path: &Path) -> Result<EmbeddedImage, VidshotError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;

        if reader.format() == Some(ImageFormat::Jpeg) {
            let decoder = reader.into_decoder()?;
            let (width, height) = decoder.dimensions();
            let color_space = match decoder.color_type() {
                ColorType::L8 => Some("DeviceGray"),
                ColorType::Rgb8 => Some("DeviceRGB"),
                _ => None,
            };
            if let Some(color_space) = color_space {
                return Ok(EmbeddedImage {
                    width,
                    height,
                    color_space,
                    data: fs::read(path)?,
                });
            }
        }

        let rgb = image::open(path)?.to_rgb8();
        let mut data = Vec::new();
        JpegEncoder::new_with_quality(Cursor::new(&mut data), self.jpeg_quality)
            .encode_image(&rgb)?;

        Ok(EmbeddedImage {
            width: rgb.width(),
            height: rgb.height(),
            color_space: "DeviceRGB",
            data,
        })
    }
}

struct EmbeddedImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    data: Vec<u8>,
}

fn write_atomically(document: &mut Document, output: &Path) -> Result<(), VidshotError> {
    let directory = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temporary = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(temporary.as_file());
        document.save_to(&mut writer)?;
        writer.flush()?;
    }
    temporary
        .persist(output)
        .map_err(|error| VidshotError::IoError(error.error))?;
    Ok(())
}
