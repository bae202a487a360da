use std::collections::BTreeMap;

use crate::{
    buffer::{pixel::PixelBuffer, quantized::QuantizedArray},
    foundation::error::{ArtificeError, ArtificeResult},
    glic::segment::SegmentList,
    graph::{
        param::{ParamSpec, Params},
        port::{InputSpec, OutputSpec, PortValue},
    },
};

/// Pure computation hosted by a graph node.
///
/// Operators are stateless: configuration lives in the node's [`Params`], data arrives through
/// [`Inputs`]. `compute` must not touch shared state; the only permitted side effect is a sink
/// writing its file.
pub trait Operator: Send + Sync {
    /// Registry kind name, e.g. `"Predict"`.
    fn kind(&self) -> &'static str;

    /// Declared inputs in order.
    fn inputs(&self) -> Vec<InputSpec> {
        Vec::new()
    }

    /// Declared outputs in order.
    fn outputs(&self) -> Vec<OutputSpec> {
        Vec::new()
    }

    /// Declared parameters in order.
    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Produce one value per declared output.
    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs>;
}

/// Resolved input values for one compute call; unconnected optional ports are absent.
#[derive(Clone, Debug, Default)]
pub struct Inputs {
    values: Vec<(&'static str, Option<PortValue>)>,
}

impl Inputs {
    /// Empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the value for port `name`.
    pub fn with(mut self, name: &'static str, value: Option<PortValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: Option<PortValue>) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Value on port `name`, if present.
    pub fn get(&self, name: &str) -> Option<&PortValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    fn require(&self, name: &str) -> ArtificeResult<&PortValue> {
        self.get(name)
            .ok_or_else(|| ArtificeError::computation(format!("input '{name}' has no value")))
    }

    /// Image on port `name`.
    pub fn image(&self, name: &str) -> ArtificeResult<&PixelBuffer> {
        self.require(name)?
            .as_image()
            .ok_or_else(|| mismatch(name, "an image"))
    }

    /// Integer array on port `name`.
    pub fn int_array(&self, name: &str) -> ArtificeResult<&QuantizedArray> {
        self.require(name)?
            .as_int_array()
            .ok_or_else(|| mismatch(name, "an int array"))
    }

    /// Segment list on optional port `name`; `None` when absent.
    pub fn opt_segments(&self, name: &str) -> ArtificeResult<Option<&SegmentList>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v
                .as_segments()
                .map(Some)
                .ok_or_else(|| mismatch(name, "a segment list")),
        }
    }
}

fn mismatch(name: &str, want: &str) -> ArtificeError {
    ArtificeError::computation(format!("input '{name}' does not hold {want}"))
}

/// Values produced by one compute call, keyed by output port name.
#[derive(Clone, Debug, Default)]
pub struct Outputs {
    values: Vec<(String, PortValue)>,
}

impl Outputs {
    /// Empty output set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-output shorthand.
    pub fn single(name: &str, value: PortValue) -> Self {
        Self::new().with(name, value)
    }

    /// Add (or replace) the value for port `name`.
    pub fn with(mut self, name: &str, value: PortValue) -> Self {
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name.to_owned(), value)),
        }
        self
    }

    /// Value produced for port `name`.
    pub fn get(&self, name: &str) -> Option<&PortValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of produced values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when nothing was produced.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_values(self) -> Vec<(String, PortValue)> {
        self.values
    }
}

/// Constructor registered for an operator kind.
pub type OperatorFactory = fn() -> Box<dyn Operator>;

/// Maps kind names to operator constructors.
#[derive(Clone, Debug)]
pub struct OperatorRegistry {
    factories: BTreeMap<&'static str, OperatorFactory>,
}

impl OperatorRegistry {
    /// Registry with no kinds.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with every built-in node kind.
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        crate::nodes::register_builtins(&mut reg);
        reg
    }

    /// Register `factory` under the kind name its operator reports.
    pub fn register(&mut self, factory: OperatorFactory) -> ArtificeResult<()> {
        let kind = factory().kind();
        if self.factories.contains_key(kind) {
            return Err(ArtificeError::configuration(format!(
                "operator kind '{kind}' is already registered"
            )));
        }
        self.factories.insert(kind, factory);
        Ok(())
    }

    /// Register `factory`, replacing any previous registration of the same kind.
    pub(crate) fn insert(&mut self, factory: OperatorFactory) {
        self.factories.insert(factory().kind(), factory);
    }

    /// Instantiate the operator registered as `kind`.
    pub fn create(&self, kind: &str) -> ArtificeResult<Box<dyn Operator>> {
        self.factories
            .get(kind)
            .map(|f| f())
            .ok_or_else(|| ArtificeError::configuration(format!("unknown operator kind '{kind}'")))
    }

    /// `true` when `kind` is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kind names in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
