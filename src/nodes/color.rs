use crate::{
    foundation::{core::PortType, error::ArtificeResult},
    glic::colorspace::{ColorSpace, convert},
    graph::{
        operator::{Inputs, Operator, Outputs},
        param::{ParamSpec, Params},
        port::{InputSpec, OutputSpec, PortValue},
    },
    nodes::choice,
};

/// Reinterprets an image encoded in `from_space` as `to_space`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColorSpaceNode;

impl Operator for ColorSpaceNode {
    fn kind(&self) -> &'static str {
        "ColorSpace"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("image", PortType::Image)]
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("image", PortType::Image)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::choice("from_space", "rgb", &ColorSpace::NAMES),
            ParamSpec::choice("to_space", "rgb", &ColorSpace::NAMES),
        ]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let out = convert(
            inputs.image("image")?,
            choice(params, "from_space", ColorSpace::from_name)?,
            choice(params, "to_space", ColorSpace::from_name)?,
        )?;
        Ok(Outputs::single("image", PortValue::Image(out)))
    }
}
