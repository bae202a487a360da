use crate::{
    foundation::{core::PortType, error::ArtificeResult},
    glic::corrupt::{bit_flip, bit_shift, xor_noise},
    graph::{
        operator::{Inputs, Operator, Outputs},
        param::{ParamSpec, Params},
        port::{InputSpec, OutputSpec, PortValue},
    },
    nodes::{MAX_SEED, int_as},
};

fn image_io() -> (Vec<InputSpec>, Vec<OutputSpec>) {
    (
        vec![InputSpec::required("image", PortType::Image)],
        vec![OutputSpec::new("image", PortType::Image)],
    )
}

/// Random bit flips on 8-bit samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct BitFlip;

impl Operator for BitFlip {
    fn kind(&self) -> &'static str {
        "BitFlip"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        image_io().0
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        image_io().1
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::float("probability", 0.01, 0.0, 1.0),
            ParamSpec::int("bits", 8, 1, 8),
            ParamSpec::int("seed", 0, 0, MAX_SEED),
        ]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let out = bit_flip(
            inputs.image("image")?,
            params.float("probability")?,
            int_as(params, "bits")?,
            int_as(params, "seed")?,
        )?;
        Ok(Outputs::single("image", PortValue::Image(out)))
    }
}

/// Bit shift or rotation of 8-bit samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct BitShift;

impl Operator for BitShift {
    fn kind(&self) -> &'static str {
        "BitShift"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        image_io().0
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        image_io().1
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::int("shift", 1, -7, 7), ParamSpec::bool("wrap", false)]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let out = bit_shift(
            inputs.image("image")?,
            int_as(params, "shift")?,
            params.bool("wrap")?,
        )?;
        Ok(Outputs::single("image", PortValue::Image(out)))
    }
}

/// Seeded XOR noise on 8-bit samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct XorNoise;

impl Operator for XorNoise {
    fn kind(&self) -> &'static str {
        "XorNoise"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        image_io().0
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        image_io().1
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::float("intensity", 0.5, 0.0, 1.0),
            ParamSpec::int("seed", 0, 0, MAX_SEED),
        ]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let out = xor_noise(
            inputs.image("image")?,
            params.float("intensity")?,
            int_as(params, "seed")?,
        )?;
        Ok(Outputs::single("image", PortValue::Image(out)))
    }
}
