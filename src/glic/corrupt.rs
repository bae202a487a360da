use rayon::prelude::*;

use crate::{
    buffer::pixel::PixelBuffer,
    foundation::{
        error::{ArtificeError, ArtificeResult},
        math::{Rng64, resolve_seed},
    },
};

fn to_byte(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn from_byte(b: u8) -> f32 {
    f32::from(b) / 255.0
}

fn map_bytes(buffer: &PixelBuffer, f: impl Fn(usize, u8) -> u8 + Sync) -> ArtificeResult<PixelBuffer> {
    let data: Vec<f32> = buffer
        .samples()
        .par_iter()
        .enumerate()
        .map(|(i, &v)| from_byte(f(i, to_byte(v))))
        .collect();
    PixelBuffer::from_vec(buffer.width(), buffer.height(), buffer.channels(), data)
}

/// Flip each of the low `bits` bits of every 8-bit sample with `probability`.
///
/// Every sample draws from its own stream derived from `seed`; zero picks a fresh seed.
pub fn bit_flip(buffer: &PixelBuffer, probability: f64, bits: u8, seed: u64) -> ArtificeResult<PixelBuffer> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(ArtificeError::configuration(format!(
            "bit flip probability must be in [0, 1], got {probability}"
        )));
    }
    if !(1..=8).contains(&bits) {
        return Err(ArtificeError::configuration(format!(
            "bit flip bits must be in 1..=8, got {bits}"
        )));
    }
    let seed = resolve_seed(seed);
    map_bytes(buffer, |i, b| {
        let mut rng = Rng64::for_index(seed, i as u64);
        let mut mask = 0u8;
        for bit in 0..bits {
            if rng.next_f64_01() < probability {
                mask |= 1 << bit;
            }
        }
        b ^ mask
    })
}

/// Shift every 8-bit sample left (`shift > 0`) or right (`shift < 0`); rotate when `wrap`.
pub fn bit_shift(buffer: &PixelBuffer, shift: i32, wrap: bool) -> ArtificeResult<PixelBuffer> {
    if !(-7..=7).contains(&shift) {
        return Err(ArtificeError::configuration(format!(
            "bit shift must be in -7..=7, got {shift}"
        )));
    }
    let n = shift.unsigned_abs();
    map_bytes(buffer, |_, b| match (shift >= 0, wrap) {
        (true, true) => b.rotate_left(n),
        (false, true) => b.rotate_right(n),
        (true, false) => b << n,
        (false, false) => b >> n,
    })
}

/// XOR every 8-bit sample with a seeded random byte masked by `round(intensity * 255)`.
pub fn xor_noise(buffer: &PixelBuffer, intensity: f64, seed: u64) -> ArtificeResult<PixelBuffer> {
    if !(0.0..=1.0).contains(&intensity) {
        return Err(ArtificeError::configuration(format!(
            "xor noise intensity must be in [0, 1], got {intensity}"
        )));
    }
    let mask = (intensity * 255.0).round() as u8;
    let seed = resolve_seed(seed);
    map_bytes(buffer, |i, b| {
        let noise = Rng64::for_index(seed, i as u64).next_u64() as u8;
        b ^ (noise & mask)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/glic/corrupt.rs"]
mod tests;
