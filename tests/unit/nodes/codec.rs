use super::*;
use crate::buffer::pixel::PixelBuffer;
use serde_json::json;

fn ramp() -> PixelBuffer {
    PixelBuffer::from_fn(8, 8, 3, |x, y, c| ((x * 31 + y * 7 + c as u32 * 3) % 256) as f32 / 255.0)
        .unwrap()
}

fn params_of(op: &dyn Operator, set: &[(&str, serde_json::Value)]) -> Params {
    let mut p = Params::new(op.params());
    for (k, v) in set {
        p.set(k, v).unwrap();
    }
    p
}

#[test]
fn declared_choices_all_parse() {
    for name in Criterion::NAMES {
        assert!(Criterion::from_name(name).is_some());
    }
    for name in ClampMethod::NAMES {
        assert!(ClampMethod::from_name(name).is_some());
    }
    for name in PREDICTOR_NAMES {
        assert!(Predictor::from_name(name).is_some());
    }
}

#[test]
fn segment_node_emits_segments_and_boundaries() {
    let op = SegmentNode;
    let p = params_of(&op, &[("threshold", json!(0.0)), ("min_size", json!(4))]);
    let out = op
        .compute(&Inputs::new().with("image", Some(PortValue::Image(ramp()))), &p)
        .unwrap();
    let list = out.get("segments").and_then(PortValue::as_segments).unwrap();
    assert_eq!(list.len(), 4);
    assert!(out.get("boundaries").and_then(PortValue::as_image).is_some());
}

#[test]
fn segment_node_reports_inconsistent_sizes() {
    let op = SegmentNode;
    let p = params_of(&op, &[("min_size", json!(64)), ("max_size", json!(8))]);
    let err = op
        .compute(&Inputs::new().with("image", Some(PortValue::Image(ramp()))), &p)
        .unwrap_err();
    assert!(matches!(err, ArtificeError::Configuration(_)));
}

#[test]
fn predict_without_segments_uses_whole_image() {
    let op = PredictNode;
    let p = params_of(&op, &[("predictor", json!("vertical")), ("border", json!(0.25))]);
    let img = ramp();
    let out = op
        .compute(&Inputs::new().with("image", Some(PortValue::Image(img.clone()))), &p)
        .unwrap();
    let expected = predict(
        &img,
        &SegmentList::whole(8, 8),
        Predictor::Vertical,
        0,
        0.25,
    )
    .unwrap();
    assert_eq!(out.get("image").and_then(PortValue::as_image), Some(&expected.buffer));
}

#[test]
fn residual_then_reconstruct_nodes_round_trip() {
    let actual = ramp();
    let predicted = PixelBuffer::filled(8, 8, 3, 0.9).unwrap();
    let res = ResidualNode;
    let p = params_of(&res, &[("clamp", json!("mod256"))]);
    let r = res
        .compute(
            &Inputs::new()
                .with("actual", Some(PortValue::Image(actual.clone())))
                .with("predicted", Some(PortValue::Image(predicted.clone()))),
            &p,
        )
        .unwrap();
    let r = r.get("image").cloned().unwrap();

    let rec = ReconstructNode;
    let p = params_of(&rec, &[("clamp", json!("mod256"))]);
    let back = rec
        .compute(
            &Inputs::new()
                .with("predicted", Some(PortValue::Image(predicted)))
                .with("residual", Some(r)),
            &p,
        )
        .unwrap();
    let back = back.get("image").and_then(PortValue::as_image).unwrap().clone();
    for (a, b) in back.samples().iter().zip(actual.samples()) {
        assert_eq!((a * 255.0).round(), (b * 255.0).round());
    }
}

#[test]
fn dequantize_node_uses_tag_unless_overridden() {
    let q = QuantizeNode;
    let p = params_of(&q, &[("bit_depth", json!(3)), ("signed", json!(false))]);
    let out = q
        .compute(&Inputs::new().with("image", Some(PortValue::Image(ramp()))), &p)
        .unwrap();
    let visual = out.get("image").and_then(PortValue::as_image).unwrap().clone();
    let codes = out.get("integers").cloned().unwrap();

    let d = DequantizeNode;
    let tagged = d
        .compute(
            &Inputs::new().with("integers", Some(codes.clone())),
            &params_of(&d, &[]),
        )
        .unwrap();
    assert_eq!(tagged.get("image").and_then(PortValue::as_image), Some(&visual));

    let wrong = d
        .compute(
            &Inputs::new().with("integers", Some(codes)),
            &params_of(&d, &[("bit_depth", json!(2)), ("signedness", json!("signed"))]),
        )
        .unwrap();
    assert_ne!(wrong.get("image").and_then(PortValue::as_image), Some(&visual));
}

#[test]
fn node_choices_follow_enum_variants() {
    fn choices(op: &dyn Operator, name: &str) -> Vec<&'static str> {
        let spec = op.params().into_iter().find(|p| p.name == name).unwrap();
        match spec.kind {
            crate::graph::param::ParamKind::Enum { choices } => choices.to_vec(),
            other => panic!("{name} is not an enum: {other:?}"),
        }
    }
    let criteria: Vec<_> = Criterion::ALL.iter().map(|c| c.as_str()).collect();
    assert_eq!(choices(&SegmentNode, "criterion"), criteria);
    let clamps: Vec<_> = ClampMethod::ALL.iter().map(|m| m.as_str()).collect();
    assert_eq!(choices(&ResidualNode, "clamp"), clamps);
    assert_eq!(choices(&ReconstructNode, "clamp"), clamps);

    use crate::{glic::colorspace::ColorSpace, nodes::color::ColorSpaceNode};
    let spaces: Vec<_> = ColorSpace::ALL.iter().map(|s| s.as_str()).collect();
    assert_eq!(choices(&ColorSpaceNode, "from_space"), spaces);
    assert_eq!(choices(&ColorSpaceNode, "to_space"), spaces);
}
