use super::*;
use crate::io::decode::{decode_image, load_image};

#[test]
fn png_round_trip_is_exact_on_8bit_grid() {
    let buf = PixelBuffer::from_fn(5, 3, 3, |x, y, c| ((x * 40 + y * 70 + c as u32 * 9) % 256) as f32 / 255.0)
        .unwrap();
    let bytes = encode_image(&buf, ImageFormat::Png, 90).unwrap();
    assert_eq!(decode_image(&bytes).unwrap(), buf);
}

#[test]
fn out_of_range_samples_are_clamped() {
    let buf = PixelBuffer::from_vec(2, 1, 1, vec![-0.5, 1.5]).unwrap();
    let bytes = encode_image(&buf, ImageFormat::Png, 90).unwrap();
    let back = decode_image(&bytes).unwrap();
    assert_eq!(back.samples(), &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn save_infers_format_and_creates_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out.jpg");
    let buf = PixelBuffer::filled(8, 8, 3, 0.5).unwrap();
    save_image(&buf, &path, SaveFormat::Auto, 95).unwrap();
    let back = load_image(&path).unwrap();
    assert_eq!((back.width(), back.height()), (8, 8));
    assert!(back.samples().iter().all(|&v| (v - 0.5).abs() < 0.02));
}

#[test]
fn unknown_extension_is_rejected_for_auto() {
    let dir = tempfile::tempdir().unwrap();
    let buf = PixelBuffer::filled(1, 1, 1, 0.0).unwrap();
    let err = save_image(&buf, &dir.path().join("out.xyz"), SaveFormat::Auto, 90).unwrap_err();
    assert!(matches!(err, ArtificeError::Computation(_)));
    save_image(&buf, &dir.path().join("out.xyz"), SaveFormat::Bmp, 90).unwrap();
}

#[test]
fn format_names_parse() {
    for name in SaveFormat::NAMES {
        assert!(SaveFormat::from_name(name).is_some());
    }
    assert_eq!(SaveFormat::from_name("gif"), None);
}
