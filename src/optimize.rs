//! Re-encodes raster images for publishing: PNGs losslessly at the highest
//! compression level, JPEGs lossily at [`JPEG_QUALITY`].

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat, ImageResult};

/// The quality JPEGs are re-encoded at.
pub const JPEG_QUALITY: u8 = 85;

/// The image formats the optimizer re-encodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Classifies a file by its extension, ignoring case. Returns `None` for
    /// files that should be copied as-is.
    pub fn from_path(path: &Path) -> Option<ImageKind> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Decodes `bytes` as `kind` and re-encodes them.
pub fn optimize(bytes: &[u8], kind: ImageKind) -> ImageResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, kind.format())?;
    let mut out = Vec::new();
    match kind {
        ImageKind::Png => img.write_with_encoder(PngEncoder::new_with_quality(
            &mut out,
            CompressionType::Best,
            FilterType::Adaptive,
        ))?,
        ImageKind::Jpeg => {
            // JPEG has no alpha channel.
            let img = match img.color().has_alpha() {
                true => DynamicImage::ImageRgb8(img.to_rgb8()),
                false => img,
            };
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?
        }
    }
    Ok(out)
}
