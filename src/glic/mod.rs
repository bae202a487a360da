pub(crate) mod colorspace;
pub(crate) mod corrupt;
pub(crate) mod predict;
pub(crate) mod quantize;
pub(crate) mod residual;
pub(crate) mod segment;
