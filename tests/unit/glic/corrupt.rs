use super::*;

fn ramp() -> PixelBuffer {
    PixelBuffer::from_fn(16, 16, 3, |x, y, c| ((x + 16 * y + c as u32) % 256) as f32 / 255.0).unwrap()
}

#[test]
fn seeded_corruption_is_deterministic() {
    let img = ramp();
    assert_eq!(bit_flip(&img, 0.3, 8, 11).unwrap(), bit_flip(&img, 0.3, 8, 11).unwrap());
    assert_eq!(xor_noise(&img, 0.7, 5).unwrap(), xor_noise(&img, 0.7, 5).unwrap());
    assert_ne!(bit_flip(&img, 0.3, 8, 11).unwrap(), bit_flip(&img, 0.3, 8, 12).unwrap());
}

#[test]
fn zero_probability_and_intensity_are_identity_on_8bit_data() {
    let img = ramp();
    assert_eq!(bit_flip(&img, 0.0, 8, 3).unwrap(), img);
    assert_eq!(xor_noise(&img, 0.0, 3).unwrap(), img);
}

#[test]
fn certain_flip_touches_only_low_bits() {
    let img = PixelBuffer::filled(1, 1, 1, 0.0).unwrap();
    let out = bit_flip(&img, 1.0, 3, 9).unwrap();
    assert_eq!(out.get(0, 0, 0), 7.0 / 255.0);
}

#[test]
fn shift_and_rotate() {
    let img = PixelBuffer::from_vec(1, 1, 1, vec![129.0 / 255.0]).unwrap();
    assert_eq!(bit_shift(&img, 1, false).unwrap().get(0, 0, 0), 2.0 / 255.0);
    assert_eq!(bit_shift(&img, 1, true).unwrap().get(0, 0, 0), 3.0 / 255.0);
    assert_eq!(bit_shift(&img, -1, false).unwrap().get(0, 0, 0), 64.0 / 255.0);
    assert_eq!(bit_shift(&img, -1, true).unwrap().get(0, 0, 0), 192.0 / 255.0);
    assert_eq!(bit_shift(&img, 0, true).unwrap(), img);
}

#[test]
fn out_of_range_arguments_are_rejected() {
    let img = ramp();
    assert!(matches!(bit_shift(&img, 8, false), Err(ArtificeError::Configuration(_))));
    assert!(bit_flip(&img, 1.5, 8, 1).is_err());
    assert!(bit_flip(&img, 0.5, 0, 1).is_err());
    assert!(xor_noise(&img, -0.1, 1).is_err());
}
