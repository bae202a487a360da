//! Artifice is a node-graph image processing engine built around GLIC, a deliberately
//! breakable predictive codec for glitch art.
//!
//! The public API is graph-oriented:
//!
//! - Build a [`Graph`] from [`OperatorRegistry`] kinds, or load a [`GraphDesc`] from JSON
//! - Connect typed ports and set validated parameters
//! - [`Graph::execute`] only the dirty part of the graph, in parallel, and read node outputs
//!
//! The codec stages (segmentation, prediction, residuals, quantization, color spaces and
//! corruption) are also exposed as plain functions over [`PixelBuffer`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod foundation;
mod glic;
mod graph;
mod io;
mod nodes;

pub use crate::buffer::{pixel::PixelBuffer, quantized::QuantizedArray};
pub use crate::foundation::core::{NodeId, PortType};
pub use crate::foundation::error::{ArtificeError, ArtificeResult};
pub use crate::foundation::math::{Fingerprint, Rng64, resolve_seed};

pub use crate::glic::colorspace::{ColorSpace, convert, from_space, to_space};
pub use crate::glic::corrupt::{bit_flip, bit_shift, xor_noise};
pub use crate::glic::predict::{
    BASE_PREDICTOR_COUNT, PREDICTOR_NAMES, Prediction, Predictor, predict, segment_energies,
};
pub use crate::glic::quantize::{
    MAX_BIT_DEPTH, MIN_BIT_DEPTH, dequantize, dequantize_tagged, quantize,
};
pub use crate::glic::residual::{ClampMethod, reconstruct, residual};
pub use crate::glic::segment::{
    Criterion, MAX_THRESHOLD, Segment, SegmentList, render_boundaries, segment,
};

pub use crate::graph::desc::{ConnectionDesc, GraphDesc, NodeDesc};
pub use crate::graph::graph::{
    CancelToken, Connection, ExecOptions, ExecReport, Graph, NodeFailure,
};
pub use crate::graph::operator::{Inputs, Operator, OperatorFactory, OperatorRegistry, Outputs};
pub use crate::graph::param::{ParamKind, ParamSpec, ParamValue, Params};
pub use crate::graph::port::{InputSpec, OutputSpec, PortValue};

pub use crate::io::decode::{decode_image, load_image};
pub use crate::io::encode::{SaveFormat, encode_image, save_image};

pub use crate::nodes::basic::{Constant, Null, TestCard, test_card};
pub use crate::nodes::codec::{
    DequantizeNode, PredictNode, QuantizeNode, ReconstructNode, ResidualNode, SegmentNode,
};
pub use crate::nodes::color::ColorSpaceNode;
pub use crate::nodes::corrupt::{BitFlip, BitShift, XorNoise};
pub use crate::nodes::io::{ImageLoader, ImageSaver};
pub use crate::nodes::register_builtins;
