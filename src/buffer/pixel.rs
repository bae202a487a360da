use std::sync::Arc;

use crate::foundation::{
    error::{ArtificeError, ArtificeResult},
    math::{Fingerprint, StableHasher},
};

/// Canonical image representation shared by all nodes.
///
/// Samples are `f32`, interleaved row-major (`(y * width + x) * channels + c`). Image data is
/// normalized to `[0, 1]`; residual streams use `[-1, 1]`. Buffers are value-like: the sample
/// storage is shared behind an [`Arc`] and every transform produces a new buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Arc<Vec<f32>>,
}

impl PixelBuffer {
    /// Build a buffer from interleaved samples.
    pub fn from_vec(width: u32, height: u32, channels: u8, data: Vec<f32>) -> ArtificeResult<Self> {
        if channels != 1 && channels != 3 {
            return Err(ArtificeError::computation(format!(
                "pixel buffer channel count must be 1 or 3, got {channels}"
            )));
        }
        let expected = sample_count(width, height, channels)?;
        if data.len() != expected {
            return Err(ArtificeError::computation(format!(
                "pixel buffer expects {expected} samples for {width}x{height}x{channels}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data: Arc::new(data),
        })
    }

    /// Buffer with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: f32) -> ArtificeResult<Self> {
        let n = sample_count(width, height, channels)?;
        Self::from_vec(width, height, channels, vec![value; n])
    }

    /// Build a buffer by evaluating `f(x, y, c)` for every sample.
    pub fn from_fn(
        width: u32,
        height: u32,
        channels: u8,
        mut f: impl FnMut(u32, u32, usize) -> f32,
    ) -> ArtificeResult<Self> {
        let n = sample_count(width, height, channels)?;
        let mut data = Vec::with_capacity(n);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels as usize {
                    data.push(f(x, y, c));
                }
            }
        }
        Self::from_vec(width, height, channels, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel count (1 or 3).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// `true` when width or height is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Sample at `(x, y)` in channel `c`. Panics when out of bounds.
    pub fn get(&self, x: u32, y: u32, c: usize) -> f32 {
        self.data[self.index(x, y, c)]
    }

    pub(crate) fn index(&self, x: u32, y: u32, c: usize) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * (self.channels as usize) + c
    }

    /// `true` when both buffers have the same width, height and channel count.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    /// Apply `f` to every sample, producing a new buffer of the same shape.
    pub fn map(&self, f: impl Fn(f32) -> f32 + Sync) -> Self {
        use rayon::prelude::*;
        let data: Vec<f32> = self.data.par_iter().map(|&v| f(v)).collect();
        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: Arc::new(data),
        }
    }

    /// Combine two equally shaped buffers sample by sample.
    pub fn zip_map(&self, other: &Self, f: impl Fn(f32, f32) -> f32 + Sync) -> ArtificeResult<Self> {
        use rayon::prelude::*;
        if !self.same_shape(other) {
            return Err(ArtificeError::computation(format!(
                "buffer shape mismatch: {}x{}x{} vs {}x{}x{}",
                self.width, self.height, self.channels, other.width, other.height, other.channels
            )));
        }
        let data: Vec<f32> = self
            .data
            .par_iter()
            .zip(other.data.par_iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: Arc::new(data),
        })
    }

    /// Replicate a single-channel buffer to three channels; three-channel buffers are returned
    /// unchanged.
    pub fn to_rgb(&self) -> Self {
        if self.channels == 3 {
            return self.clone();
        }
        let data = self.data.iter().flat_map(|&v| [v, v, v]).collect();
        Self {
            width: self.width,
            height: self.height,
            channels: 3,
            data: Arc::new(data),
        }
    }

    /// Stable content fingerprint over shape and exact sample bits.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_u32(self.width);
        h.write_u32(self.height);
        h.write_u8(self.channels);
        for &v in self.data.iter() {
            h.write_f32(v);
        }
        h.finish()
    }

    /// Number of live references to the shared sample storage.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

pub(crate) fn sample_count(width: u32, height: u32, channels: u8) -> ArtificeResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels as usize))
        .ok_or_else(|| ArtificeError::computation("pixel buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/pixel.rs"]
mod tests;
