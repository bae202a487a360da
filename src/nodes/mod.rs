use crate::{
    foundation::error::{ArtificeError, ArtificeResult},
    graph::{
        operator::{Operator, OperatorRegistry},
        param::Params,
    },
};

pub(crate) mod basic;
pub(crate) mod codec;
pub(crate) mod color;
pub(crate) mod corrupt;
pub(crate) mod io;

/// Upper bound of every `seed` parameter.
pub(crate) const MAX_SEED: i64 = 999_999;

fn boxed<T: Operator + Default + 'static>() -> Box<dyn Operator> {
    Box::new(T::default())
}

/// Add every built-in node kind to `registry`.
pub fn register_builtins(registry: &mut OperatorRegistry) {
    registry.insert(boxed::<io::ImageLoader>);
    registry.insert(boxed::<io::ImageSaver>);
    registry.insert(boxed::<basic::TestCard>);
    registry.insert(boxed::<basic::Null>);
    registry.insert(boxed::<basic::Constant>);
    registry.insert(boxed::<color::ColorSpaceNode>);
    registry.insert(boxed::<codec::SegmentNode>);
    registry.insert(boxed::<codec::PredictNode>);
    registry.insert(boxed::<codec::ResidualNode>);
    registry.insert(boxed::<codec::ReconstructNode>);
    registry.insert(boxed::<codec::QuantizeNode>);
    registry.insert(boxed::<codec::DequantizeNode>);
    registry.insert(boxed::<corrupt::BitFlip>);
    registry.insert(boxed::<corrupt::BitShift>);
    registry.insert(boxed::<corrupt::XorNoise>);
}

/// Enum parameter `name` parsed through `from_name`.
pub(crate) fn choice<T>(params: &Params, name: &str, from_name: fn(&str) -> Option<T>) -> ArtificeResult<T> {
    let s = params.choice(name)?;
    from_name(s).ok_or_else(|| ArtificeError::configuration(format!("param '{name}' has unknown value '{s}'")))
}

/// Integer parameter `name` converted to a narrower type.
pub(crate) fn int_as<T: TryFrom<i64>>(params: &Params, name: &str) -> ArtificeResult<T> {
    let v = params.int(name)?;
    T::try_from(v).map_err(|_| ArtificeError::configuration(format!("param '{name}' value {v} is out of range")))
}
