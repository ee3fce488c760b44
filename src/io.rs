use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::canvas::PixelSurface;
use crate::components::colors::{Color, ColorPalette};
use crate::error::{EngineError, Result};

const JPEG_QUALITY: u8 = 90;

// ============================================================================
// RASTER FORMATS
// ============================================================================

/// Formats the editor can write. Anything `image` decodes can be opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Bmp,
    Webp,
}

impl SaveFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            "webp" => Some(SaveFormat::Webp),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| EngineError::UnsupportedFormat(ext.to_string()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Webp => "webp",
        }
    }
}

/// Decode an encoded image (PNG, JPEG, BMP, GIF, WebP) into a surface.
pub fn decode_image(bytes: &[u8]) -> Result<PixelSurface> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    Ok(PixelSurface::from_rgba_image(image))
}

pub fn load_image(path: &Path) -> Result<PixelSurface> {
    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    let image = reader.decode()?.to_rgba8();
    log::info!("io: loaded {} ({}x{})", path.display(), image.width(), image.height());
    Ok(PixelSurface::from_rgba_image(image))
}

/// Encode a surface's raw RGBA buffer. JPEG drops alpha.
pub fn encode_image(surface: &PixelSurface, format: SaveFormat) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    write_encoded(surface, format, &mut out)?;
    Ok(out.into_inner())
}

/// Encode to `path`, picking the format from its extension.
pub fn save_image(surface: &PixelSurface, path: &Path) -> Result<()> {
    let format = SaveFormat::from_path(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_encoded(surface, format, &mut writer)?;
    writer.flush()?;
    log::info!("io: saved {} as {:?}", path.display(), format);
    Ok(())
}

fn write_encoded<W: Write + std::io::Seek>(surface: &PixelSurface, format: SaveFormat, writer: &mut W) -> Result<()> {
    let (w, h) = (surface.width(), surface.height());
    match format {
        SaveFormat::Png => {
            PngEncoder::new(writer).write_image(surface.as_raw(), w, h, image::ColorType::Rgba8)?;
        }
        SaveFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(surface.as_image().clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
            encoder.encode(rgb.as_raw(), w, h, image::ColorType::Rgb8)?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(writer);
            encoder.encode(surface.as_raw(), w, h, image::ColorType::Rgba8)?;
        }
        SaveFormat::Webp => {
            DynamicImage::ImageRgba8(surface.as_image().clone()).write_to(writer, ImageFormat::WebP)?;
        }
    }
    Ok(())
}

// ============================================================================
// PXF DOCUMENT FORMAT
// ============================================================================

const PXF_MAGIC: &str = "PXF1";

/// Native document: the raster plus the palette state it was painted with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PxfDocument {
    magic: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub palette: Vec<Color>,
    pub selected: usize,
    pub opacity: f32,
}

impl PxfDocument {
    pub fn new(surface: &PixelSurface, palette: &ColorPalette) -> Self {
        Self {
            magic: PXF_MAGIC.to_string(),
            width: surface.width(),
            height: surface.height(),
            pixels: surface.as_raw().to_vec(),
            palette: palette.colors().to_vec(),
            selected: palette.selected_index(),
            opacity: palette.opacity(),
        }
    }

    /// Split back into the surface and palette it was built from.
    pub fn into_parts(self) -> Result<(PixelSurface, ColorPalette)> {
        let surface = PixelSurface::from_raw_rgba(self.width, self.height, self.pixels)?;
        let mut palette = ColorPalette::new(self.palette);
        palette.set_selected_index(self.selected);
        palette.set_opacity(self.opacity);
        Ok((surface, palette))
    }
}

pub fn save_document(surface: &PixelSurface, palette: &ColorPalette, path: &Path) -> Result<()> {
    let document = PxfDocument::new(surface, palette);
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &document)?;
    log::info!("io: wrote document {}", path.display());
    Ok(())
}

pub fn load_document(path: &Path) -> Result<PxfDocument> {
    let reader = BufReader::new(File::open(path)?);
    let document: PxfDocument = bincode::deserialize_from(reader)?;
    if document.magic != PXF_MAGIC {
        return Err(EngineError::Document(format!("unknown magic '{}'", document.magic)));
    }
    if document.width == 0 || document.height == 0 {
        return Err(EngineError::Document("canvas dimensions cannot be zero".into()));
    }
    Ok(document)
}
