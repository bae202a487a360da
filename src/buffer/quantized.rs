use std::sync::Arc;

use crate::{
    buffer::pixel::sample_count,
    foundation::error::{ArtificeError, ArtificeResult},
};

/// Integer samples produced by quantization, tagged with the parameters that produced them.
///
/// The integers are meaningless without the `(bit_depth, signed)` tag; decoders may still
/// choose to reinterpret them with different parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantizedArray {
    width: u32,
    height: u32,
    channels: u8,
    bit_depth: u8,
    signed: bool,
    data: Arc<Vec<i32>>,
}

impl QuantizedArray {
    /// Build an array from interleaved integer samples.
    pub fn from_vec(
        width: u32,
        height: u32,
        channels: u8,
        bit_depth: u8,
        signed: bool,
        data: Vec<i32>,
    ) -> ArtificeResult<Self> {
        let expected = sample_count(width, height, channels)?;
        if data.len() != expected {
            return Err(ArtificeError::computation(format!(
                "quantized array expects {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            bit_depth,
            signed,
            data: Arc::new(data),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel count.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Bit depth used at quantize time.
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// Whether the samples were quantized as signed (bipolar) values.
    pub fn signed(&self) -> bool {
        self.signed
    }

    /// Interleaved integer samples.
    pub fn samples(&self) -> &[i32] {
        &self.data
    }
}
