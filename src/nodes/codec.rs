use crate::{
    foundation::{
        core::PortType,
        error::{ArtificeError, ArtificeResult},
    },
    glic::{
        predict::{PREDICTOR_NAMES, Predictor, predict},
        quantize::{MAX_BIT_DEPTH, MIN_BIT_DEPTH, dequantize, quantize},
        residual::{ClampMethod, reconstruct, residual},
        segment::{Criterion, MAX_THRESHOLD, SegmentList, render_boundaries, segment},
    },
    graph::{
        operator::{Inputs, Operator, Outputs},
        param::{ParamSpec, Params},
        port::{InputSpec, OutputSpec, PortValue},
    },
    nodes::{MAX_SEED, choice, int_as},
};

const SIGNEDNESS: [&str; 3] = ["auto", "unsigned", "signed"];

/// Quadtree segmentation of an image.
#[derive(Clone, Copy, Debug, Default)]
pub struct SegmentNode;

impl Operator for SegmentNode {
    fn kind(&self) -> &'static str {
        "Segment"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("image", PortType::Image)]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![
            OutputSpec::new("segments", PortType::SegmentList),
            OutputSpec::new("boundaries", PortType::Image),
        ]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::int("min_size", 4, 1, 4096),
            ParamSpec::int("max_size", 256, 1, 4096),
            ParamSpec::float("threshold", 0.01, 0.0, MAX_THRESHOLD),
            ParamSpec::choice("criterion", "variance", &Criterion::NAMES),
        ]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let img = inputs.image("image")?;
        let list = segment(
            img,
            int_as(params, "min_size")?,
            int_as(params, "max_size")?,
            params.float("threshold")?,
            choice(params, "criterion", Criterion::from_name)?,
        )?;
        let boundaries = render_boundaries(img, &list)?;
        Ok(Outputs::new()
            .with("segments", PortValue::Segments(list))
            .with("boundaries", PortValue::Image(boundaries)))
    }
}

/// Per-segment prediction. Without a segment list the whole image is one segment.
#[derive(Clone, Copy, Debug, Default)]
pub struct PredictNode;

impl Operator for PredictNode {
    fn kind(&self) -> &'static str {
        "Predict"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![
            InputSpec::required("image", PortType::Image),
            InputSpec::optional("segments", PortType::SegmentList),
        ]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("image", PortType::Image)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::choice("predictor", "sad", &PREDICTOR_NAMES),
            ParamSpec::int("seed", 0, 0, MAX_SEED),
            ParamSpec::float("border", 0.0, -1.0, 1.0),
        ]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let img = inputs.image("image")?;
        let whole;
        let segments = match inputs.opt_segments("segments")? {
            Some(list) => list,
            None => {
                whole = SegmentList::whole(img.width(), img.height());
                &whole
            }
        };
        let out = predict(
            img,
            segments,
            choice(params, "predictor", Predictor::from_name)?,
            int_as(params, "seed")?,
            params.float("border")? as f32,
        )?;
        Ok(Outputs::single("image", PortValue::Image(out.buffer)))
    }
}

/// `actual - predicted` under a clamp method.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResidualNode;

impl Operator for ResidualNode {
    fn kind(&self) -> &'static str {
        "Residual"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![
            InputSpec::required("actual", PortType::Image),
            InputSpec::required("predicted", PortType::Image),
        ]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("image", PortType::Image)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::choice("clamp", "none", &ClampMethod::NAMES)]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let out = residual(
            inputs.image("actual")?,
            inputs.image("predicted")?,
            choice(params, "clamp", ClampMethod::from_name)?,
        )?;
        Ok(Outputs::single("image", PortValue::Image(out)))
    }
}

/// `predicted + residual` under a clamp method.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReconstructNode;

impl Operator for ReconstructNode {
    fn kind(&self) -> &'static str {
        "Reconstruct"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![
            InputSpec::required("predicted", PortType::Image),
            InputSpec::required("residual", PortType::Image),
        ]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("image", PortType::Image)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::choice("clamp", "none", &ClampMethod::NAMES)]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let out = reconstruct(
            inputs.image("predicted")?,
            inputs.image("residual")?,
            choice(params, "clamp", ClampMethod::from_name)?,
        )?;
        Ok(Outputs::single("image", PortValue::Image(out)))
    }
}

/// Bit-depth reduction with both the visual and the integer result.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuantizeNode;

impl Operator for QuantizeNode {
    fn kind(&self) -> &'static str {
        "Quantize"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("image", PortType::Image)]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![
            OutputSpec::new("image", PortType::Image),
            OutputSpec::new("integers", PortType::IntArray),
        ]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::int("bit_depth", 8, i64::from(MIN_BIT_DEPTH), i64::from(MAX_BIT_DEPTH)),
            ParamSpec::bool("signed", false),
        ]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let (visual, codes) = quantize(
            inputs.image("image")?,
            int_as(params, "bit_depth")?,
            params.bool("signed")?,
        )?;
        Ok(Outputs::new()
            .with("image", PortValue::Image(visual))
            .with("integers", PortValue::IntArray(codes)))
    }
}

/// Integer codes back to floats. `bit_depth = 0` and `signedness = auto` use the array's tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct DequantizeNode;

impl Operator for DequantizeNode {
    fn kind(&self) -> &'static str {
        "Dequantize"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("integers", PortType::IntArray)]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("image", PortType::Image)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::int("bit_depth", 0, 0, i64::from(MAX_BIT_DEPTH)),
            ParamSpec::choice("signedness", "auto", &SIGNEDNESS),
        ]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let codes = inputs.int_array("integers")?;
        let bits: u8 = int_as(params, "bit_depth")?;
        let signed = match params.choice("signedness")? {
            "auto" => codes.signed(),
            "unsigned" => false,
            "signed" => true,
            other => {
                return Err(ArtificeError::configuration(format!(
                    "param 'signedness' has unknown value '{other}'"
                )));
            }
        };
        let out = dequantize(codes, bits, signed)?;
        Ok(Outputs::single("image", PortValue::Image(out)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/codec.rs"]
mod tests;
