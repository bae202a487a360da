use super::*;
use crate::buffer::pixel::PixelBuffer;
use serde_json::json;

fn params_of(op: &dyn Operator, set: &[(&str, serde_json::Value)]) -> Params {
    let mut p = Params::new(op.params());
    for (k, v) in set {
        p.set(k, v).unwrap();
    }
    p
}

#[test]
fn saver_then_loader_round_trips_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.png");
    let path_str = path.to_string_lossy().into_owned();
    let img = PixelBuffer::from_fn(4, 4, 3, |x, y, c| ((x + y * 4) * 16 + c as u32) as f32 / 255.0)
        .unwrap();

    let saver = ImageSaver;
    let out = saver
        .compute(
            &Inputs::new().with("image", Some(PortValue::Image(img.clone()))),
            &params_of(&saver, &[("path", json!(path_str))]),
        )
        .unwrap();
    assert!(out.is_empty());

    let loader = ImageLoader;
    let loaded = loader
        .compute(&Inputs::new(), &params_of(&loader, &[("path", json!(path_str))]))
        .unwrap();
    assert_eq!(loaded.get("image").and_then(PortValue::as_image), Some(&img));
}

#[test]
fn loader_failures_are_computation_errors() {
    let loader = ImageLoader;
    let unset = loader.compute(&Inputs::new(), &params_of(&loader, &[])).unwrap_err();
    assert!(matches!(unset, ArtificeError::Computation(_)));

    let missing = loader
        .compute(
            &Inputs::new(),
            &params_of(&loader, &[("path", json!("/no/such/file.png"))]),
        )
        .unwrap_err();
    assert!(matches!(missing, ArtificeError::Computation(_)));
}

#[test]
fn saver_rejects_bad_quality_at_set_time() {
    let mut p = params_of(&ImageSaver, &[]);
    assert!(matches!(
        p.set("quality", &json!(0)),
        Err(ArtificeError::Configuration(_))
    ));
    assert!(p.set("format", &json!("gif")).is_err());
}
