use std::fmt;

/// Stable identifier of a node inside a [`crate::Graph`].
///
/// Ids are never reused within a graph, so edges stored as id pairs stay valid across removals.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Declared data type of a port. Connections are only allowed between equal types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PortType {
    /// A [`crate::PixelBuffer`].
    Image,
    /// A [`crate::QuantizedArray`].
    IntArray,
    /// A [`crate::SegmentList`].
    SegmentList,
    /// A single `f64`.
    Scalar,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Image => "image",
            Self::IntArray => "int-array",
            Self::SegmentList => "segment-list",
            Self::Scalar => "scalar",
        };
        f.write_str(s)
    }
}
