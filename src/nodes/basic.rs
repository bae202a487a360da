use crate::{
    buffer::pixel::PixelBuffer,
    foundation::{
        core::PortType,
        error::ArtificeResult,
        math::{Rng64, resolve_seed},
    },
    graph::{
        operator::{Inputs, Operator, Outputs},
        param::{ParamSpec, Params},
        port::{InputSpec, OutputSpec, PortValue},
    },
    nodes::{MAX_SEED, int_as},
};

/// Synthetic square RGB image: color bars, a channel gradient, a checkerboard and seeded
/// noise.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestCard;

const BARS: [[f32; 3]; 8] = [
    [1.0, 1.0, 1.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 0.0, 1.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, 0.0],
];

/// Render the test card pattern at `size`x`size`.
pub fn test_card(size: u32, seed: u64) -> ArtificeResult<PixelBuffer> {
    let seed = resolve_seed(seed);
    let third = (size / 3).max(1);
    let cell = (size / 16).max(1);
    PixelBuffer::from_fn(size, size, 3, |x, y, c| {
        let u = x as f32 / (size.max(2) - 1) as f32;
        if y < third {
            BARS[(x * 8 / size) as usize % 8][c]
        } else if y < 2 * third {
            let v = (y - third) as f32 / third as f32;
            match c {
                0 => u,
                1 => v,
                _ => 0.5 + 0.5 * (u * 12.0).sin() * (1.0 - v),
            }
        } else if x < size / 2 {
            if (x / cell + y / cell) % 2 == 0 { 1.0 } else { 0.0 }
        } else {
            let idx = u64::from(y) * u64::from(size) + u64::from(x);
            let mut rng = Rng64::for_index(seed, idx * 3 + c as u64);
            rng.next_f64_01() as f32
        }
    })
}

impl Operator for TestCard {
    fn kind(&self) -> &'static str {
        "TestCard"
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("image", PortType::Image)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::int("size", 256, 16, 4096),
            ParamSpec::int("seed", 1, 0, MAX_SEED),
        ]
    }

    fn compute(&self, _: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let size: u32 = int_as(params, "size")?;
        let seed: u64 = int_as(params, "seed")?;
        Ok(Outputs::single("image", PortValue::Image(test_card(size, seed)?)))
    }
}

/// Passes its input through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Null;

impl Operator for Null {
    fn kind(&self) -> &'static str {
        "Null"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("image", PortType::Image)]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("image", PortType::Image)]
    }

    fn compute(&self, inputs: &Inputs, _: &Params) -> ArtificeResult<Outputs> {
        Ok(Outputs::single("image", PortValue::Image(inputs.image("image")?.clone())))
    }
}

/// Emits its `value` parameter as a scalar.
#[derive(Clone, Copy, Debug, Default)]
pub struct Constant;

impl Operator for Constant {
    fn kind(&self) -> &'static str {
        "Constant"
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("value", PortType::Scalar)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::float("value", 0.0, -1.0e6, 1.0e6)]
    }

    fn compute(&self, _: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        Ok(Outputs::single("value", PortValue::Scalar(params.float("value")?)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/basic.rs"]
mod tests;
