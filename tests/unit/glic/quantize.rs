use super::*;

fn row(values: &[f32]) -> PixelBuffer {
    PixelBuffer::from_vec(values.len() as u32, 1, 1, values.to_vec()).unwrap()
}

#[test]
fn one_bit_unsigned_thresholds_at_half() {
    let (visual, codes) = quantize(&row(&[0.0, 0.49, 0.51, 1.0]), 1, false).unwrap();
    assert_eq!(codes.samples(), &[0, 0, 1, 1]);
    assert_eq!(visual.samples(), &[0.0, 0.0, 1.0, 1.0]);
    assert_eq!(dequantize(&codes, 1, false).unwrap().samples(), &[0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn dequantize_matches_visual_output_exactly() {
    let img = PixelBuffer::from_fn(9, 7, 3, |x, y, c| {
        ((x * 31 + y * 17 + c as u32 * 5) % 101) as f32 / 50.0 - 1.0
    })
    .unwrap();
    for bits in MIN_BIT_DEPTH..=MAX_BIT_DEPTH {
        for signed in [false, true] {
            let (visual, codes) = quantize(&img, bits, signed).unwrap();
            assert_eq!(dequantize_tagged(&codes).unwrap(), visual, "{bits} {signed}");
        }
    }
}

#[test]
fn signed_levels_are_twos_complement() {
    let (visual, codes) = quantize(&row(&[-1.0, -0.5, 0.0, 0.5, 1.0, 3.0]), 4, true).unwrap();
    assert_eq!(codes.samples(), &[-8, -4, 0, 4, 7, 7]);
    assert_eq!(visual.get(0, 0, 0), -1.0);
    assert_eq!(visual.get(4, 0, 0), 7.0 / 8.0);
    assert!(codes.signed());
    assert_eq!(codes.bit_depth(), 4);
}

#[test]
fn unsigned_clamps_negative_input() {
    let (_, codes) = quantize(&row(&[-0.3, 1.7]), 8, false).unwrap();
    assert_eq!(codes.samples(), &[0, 255]);
}

#[test]
fn reinterpreting_codes_is_not_an_error() {
    let (_, codes) = quantize(&row(&[1.0]), 8, false).unwrap();
    // 255 read as 4-bit signed lands far outside [-1, 1].
    let out = dequantize(&codes, 4, true).unwrap();
    assert_eq!(out.get(0, 0, 0), 255.0 / 8.0);
}

#[test]
fn bit_depth_outside_range_is_rejected() {
    let img = row(&[0.5]);
    for bad in [0, 17] {
        assert!(matches!(
            quantize(&img, bad, false),
            Err(ArtificeError::Configuration(_))
        ));
    }
}

#[test]
fn dequantize_depth_zero_reads_the_tag() {
    let (visual, codes) = quantize(&row(&[0.0, 0.3, 0.8]), 3, false).unwrap();
    assert_eq!(dequantize(&codes, 0, false).unwrap(), visual);
    assert!(matches!(
        dequantize(&codes, 17, false),
        Err(ArtificeError::Configuration(_))
    ));
}
