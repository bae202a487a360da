use std::path::Path;

use anyhow::Context;

use crate::{buffer::pixel::PixelBuffer, foundation::error::ArtificeResult};

/// Decode encoded image bytes into a three-channel buffer.
///
/// Alpha is composited over white; grayscale sources are replicated to three channels.
pub fn decode_image(bytes: &[u8]) -> ArtificeResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba32f();
    let (width, height) = rgba.dimensions();

    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for px in rgba.into_raw().chunks_exact(4) {
        let a = px[3].clamp(0.0, 1.0);
        for &c in &px[..3] {
            data.push(c * a + (1.0 - a));
        }
    }
    PixelBuffer::from_vec(width, height, 3, data)
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> ArtificeResult<PixelBuffer> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/io/decode.rs"]
mod tests;
