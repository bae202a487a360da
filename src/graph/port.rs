use crate::{
    buffer::{pixel::PixelBuffer, quantized::QuantizedArray},
    foundation::core::PortType,
    glic::segment::SegmentList,
};

/// Value carried by a port. Cloning is cheap: payloads share their storage.
#[derive(Clone, Debug, PartialEq)]
pub enum PortValue {
    /// Pixel data.
    Image(PixelBuffer),
    /// Tagged integer samples.
    IntArray(QuantizedArray),
    /// Quadtree leaves.
    Segments(SegmentList),
    /// Single number.
    Scalar(f64),
}

impl PortValue {
    /// Type tag of the payload.
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Image(_) => PortType::Image,
            Self::IntArray(_) => PortType::IntArray,
            Self::Segments(_) => PortType::SegmentList,
            Self::Scalar(_) => PortType::Scalar,
        }
    }

    /// Image payload, if any.
    pub fn as_image(&self) -> Option<&PixelBuffer> {
        match self {
            Self::Image(b) => Some(b),
            _ => None,
        }
    }

    /// Integer array payload, if any.
    pub fn as_int_array(&self) -> Option<&QuantizedArray> {
        match self {
            Self::IntArray(a) => Some(a),
            _ => None,
        }
    }

    /// Segment list payload, if any.
    pub fn as_segments(&self) -> Option<&SegmentList> {
        match self {
            Self::Segments(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar payload, if any.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }
}

/// Declared input slot of an operator.
#[derive(Clone, Debug, PartialEq)]
pub struct InputSpec {
    /// Port name, unique among the operator's inputs.
    pub name: &'static str,
    /// Accepted value type.
    pub ty: PortType,
    /// Whether execution fails when the port is unconnected and has no default.
    pub required: bool,
    /// Value used when the port is unconnected.
    pub default: Option<PortValue>,
}

impl InputSpec {
    /// Required input with no default.
    pub fn required(name: &'static str, ty: PortType) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
        }
    }

    /// Optional input; absent when unconnected.
    pub fn optional(name: &'static str, ty: PortType) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
        }
    }

    /// Attach a default value used when the port is unconnected.
    pub fn with_default(mut self, value: PortValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Declared output slot of an operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputSpec {
    /// Port name, unique among the operator's outputs.
    pub name: &'static str,
    /// Produced value type.
    pub ty: PortType,
}

impl OutputSpec {
    /// Output named `name` of type `ty`.
    pub fn new(name: &'static str, ty: PortType) -> Self {
        Self { name, ty }
    }
}
