use crate::{
    buffer::{pixel::PixelBuffer, quantized::QuantizedArray},
    foundation::error::{ArtificeError, ArtificeResult},
};

/// Smallest accepted bit depth.
pub const MIN_BIT_DEPTH: u8 = 1;
/// Largest accepted bit depth.
pub const MAX_BIT_DEPTH: u8 = 16;

/// Integer code range and scale for one `(bit_depth, signed)` pair.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Levels {
    min: i32,
    max: i32,
    scale: f32,
}

impl Levels {
    fn new(bit_depth: u8, signed: bool) -> Self {
        let bits = u32::from(bit_depth.clamp(MIN_BIT_DEPTH, MAX_BIT_DEPTH));
        if signed {
            let s = 1i32 << (bits - 1);
            Self {
                min: -s,
                max: s - 1,
                scale: s as f32,
            }
        } else {
            let max = (1i32 << bits) - 1;
            Self {
                min: 0,
                max,
                scale: max as f32,
            }
        }
    }

    fn encode(&self, v: f32, signed: bool) -> i32 {
        let v = if signed {
            v.clamp(-1.0, 1.0)
        } else {
            v.clamp(0.0, 1.0)
        };
        ((v * self.scale).round() as i32).clamp(self.min, self.max)
    }

    /// Shared by quantize's visual output and [`dequantize`], so both agree exactly.
    fn value(&self, q: i32) -> f32 {
        q as f32 / self.scale
    }
}

fn check_bit_depth(bit_depth: u8) -> ArtificeResult<()> {
    if (MIN_BIT_DEPTH..=MAX_BIT_DEPTH).contains(&bit_depth) {
        return Ok(());
    }
    Err(ArtificeError::configuration(format!(
        "bit depth must be in {MIN_BIT_DEPTH}..={MAX_BIT_DEPTH}, got {bit_depth}"
    )))
}

/// Reduce `buffer` to `bit_depth` bits per sample.
///
/// Returns the visual image (levels mapped back to floats) and the integer codes tagged with
/// `(bit_depth, signed)`. Unsigned input is clamped to `[0, 1]`, signed input to `[-1, 1]`.
#[tracing::instrument(skip(buffer), fields(w = buffer.width(), h = buffer.height()))]
pub fn quantize(
    buffer: &PixelBuffer,
    bit_depth: u8,
    signed: bool,
) -> ArtificeResult<(PixelBuffer, QuantizedArray)> {
    check_bit_depth(bit_depth)?;
    let levels = Levels::new(bit_depth, signed);
    let codes: Vec<i32> = buffer
        .samples()
        .iter()
        .map(|&v| levels.encode(v, signed))
        .collect();
    let visual: Vec<f32> = codes.iter().map(|&q| levels.value(q)).collect();
    let (w, h, c) = (buffer.width(), buffer.height(), buffer.channels());
    Ok((
        PixelBuffer::from_vec(w, h, c, visual)?,
        QuantizedArray::from_vec(w, h, c, bit_depth, signed, codes)?,
    ))
}

/// Map integer codes back to floats using `(bit_depth, signed)`.
///
/// A `bit_depth` of 0 uses the depth the array was tagged with; depths above
/// [`MAX_BIT_DEPTH`] are configuration errors. Codes outside the range of the given parameters
/// are not clamped, so reinterpreting an array with a different tag produces out-of-range
/// values instead of an error.
pub fn dequantize(array: &QuantizedArray, bit_depth: u8, signed: bool) -> ArtificeResult<PixelBuffer> {
    let bit_depth = match bit_depth {
        0 => array.bit_depth(),
        b => b,
    };
    check_bit_depth(bit_depth)?;
    let levels = Levels::new(bit_depth, signed);
    let data = array.samples().iter().map(|&q| levels.value(q)).collect();
    PixelBuffer::from_vec(array.width(), array.height(), array.channels(), data)
}

/// [`dequantize`] using the tag the array was produced with.
pub fn dequantize_tagged(array: &QuantizedArray) -> ArtificeResult<PixelBuffer> {
    dequantize(array, array.bit_depth(), array.signed())
}

#[cfg(test)]
#[path = "../../tests/unit/glic/quantize.rs"]
mod tests;
