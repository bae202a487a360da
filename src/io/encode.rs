use std::{io::Cursor, path::Path};

use anyhow::Context;
use image::ImageFormat;

use crate::{
    buffer::pixel::PixelBuffer,
    foundation::error::{ArtificeError, ArtificeResult},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
/// Output container selection for [`save_image`].
pub enum SaveFormat {
    /// Pick from the file extension.
    #[default]
    Auto,
    /// PNG.
    Png,
    /// JPEG, honouring the quality setting.
    Jpeg,
    /// BMP.
    Bmp,
    /// TIFF.
    Tiff,
}

impl SaveFormat {
    /// Parameter names in declaration order.
    pub const NAMES: [&'static str; 5] = ["auto", "png", "jpeg", "bmp", "tiff"];

    /// Parse a parameter name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "auto" => Self::Auto,
            "png" => Self::Png,
            "jpeg" => Self::Jpeg,
            "bmp" => Self::Bmp,
            "tiff" => Self::Tiff,
            _ => return None,
        })
    }

    fn resolve(self, path: &Path) -> ArtificeResult<ImageFormat> {
        let fmt = match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
            Self::Auto => ImageFormat::from_path(path).map_err(|_| {
                ArtificeError::computation(format!(
                    "cannot infer image format from '{}'",
                    path.display()
                ))
            })?,
        };
        match fmt {
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Tiff => Ok(fmt),
            other => Err(ArtificeError::computation(format!(
                "unsupported output format {other:?}"
            ))),
        }
    }
}

fn to_dynamic(buffer: &PixelBuffer) -> ArtificeResult<image::DynamicImage> {
    let bytes: Vec<u8> = buffer
        .samples()
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    let (w, h) = (buffer.width(), buffer.height());
    let img = match buffer.channels() {
        1 => image::GrayImage::from_raw(w, h, bytes).map(image::DynamicImage::ImageLuma8),
        _ => image::RgbImage::from_raw(w, h, bytes).map(image::DynamicImage::ImageRgb8),
    };
    img.ok_or_else(|| ArtificeError::computation("pixel buffer does not fit an 8-bit image"))
}

/// Encode `buffer` as 8-bit `format`. `quality` (1-100) only affects JPEG.
pub fn encode_image(buffer: &PixelBuffer, format: ImageFormat, quality: u8) -> ArtificeResult<Vec<u8>> {
    let img = to_dynamic(buffer)?;
    let mut out = Vec::new();
    if format == ImageFormat::Jpeg {
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode_image(&img)
            .context("encode jpeg")?;
    } else {
        img.write_to(&mut Cursor::new(&mut out), format)
            .with_context(|| format!("encode {format:?}"))?;
    }
    Ok(out)
}

/// Encode and write `buffer` to `path`, creating parent directories.
#[tracing::instrument(skip(buffer), fields(w = buffer.width(), h = buffer.height()))]
pub fn save_image(buffer: &PixelBuffer, path: &Path, format: SaveFormat, quality: u8) -> ArtificeResult<()> {
    let fmt = format.resolve(path)?;
    let bytes = encode_image(buffer, fmt, quality)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write image '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/io/encode.rs"]
mod tests;
