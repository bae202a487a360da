use crate::{
    buffer::pixel::PixelBuffer,
    foundation::error::{ArtificeError, ArtificeResult},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
/// How out-of-range residuals are folded.
pub enum ClampMethod {
    /// Plain float difference, range `[-1, 1]`.
    #[default]
    None,
    /// Difference taken modulo 256 in the 8-bit domain, centred on zero.
    Mod256,
}

impl ClampMethod {
    /// All methods in declaration order.
    pub const ALL: [ClampMethod; 2] = [ClampMethod::None, ClampMethod::Mod256];

    /// Parameter names, indexed like [`ClampMethod::ALL`].
    pub const NAMES: [&'static str; 2] = ["none", "mod256"];

    /// Canonical parameter name.
    pub fn as_str(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Parse a canonical parameter name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

fn to_level(v: f32) -> i32 {
    (v * 255.0).round() as i32
}

fn wrap_centered(d: i32) -> i32 {
    let d = d.rem_euclid(256);
    if d >= 128 { d - 256 } else { d }
}

/// `actual - predicted`, folded per `method`.
///
/// With [`ClampMethod::Mod256`] the result lies in `[-128/255, 127/255]`.
pub fn residual(
    actual: &PixelBuffer,
    predicted: &PixelBuffer,
    method: ClampMethod,
) -> ArtificeResult<PixelBuffer> {
    check_shapes("residual", actual, predicted)?;
    match method {
        ClampMethod::None => actual.zip_map(predicted, |a, p| a - p),
        ClampMethod::Mod256 => actual.zip_map(predicted, |a, p| {
            let a8 = to_level(a);
            let p8 = to_level(p).clamp(0, 255);
            wrap_centered(a8 - p8) as f32 / 255.0
        }),
    }
}

/// Inverse of [`residual`]: `predicted + residual`, unfolded per `method`.
///
/// For 8-bit-representable inputs `reconstruct(p, residual(a, p, m), m) == a` holds for both
/// methods, up to float rounding for [`ClampMethod::None`].
pub fn reconstruct(
    predicted: &PixelBuffer,
    residual: &PixelBuffer,
    method: ClampMethod,
) -> ArtificeResult<PixelBuffer> {
    check_shapes("reconstruct", predicted, residual)?;
    match method {
        ClampMethod::None => predicted.zip_map(residual, |p, r| p + r),
        ClampMethod::Mod256 => predicted.zip_map(residual, |p, r| {
            let p8 = to_level(p).clamp(0, 255);
            (p8 + to_level(r)).rem_euclid(256) as f32 / 255.0
        }),
    }
}

fn check_shapes(op: &str, a: &PixelBuffer, b: &PixelBuffer) -> ArtificeResult<()> {
    if a.same_shape(b) {
        return Ok(());
    }
    Err(ArtificeError::computation(format!(
        "{op}: input shapes differ ({}x{}x{} vs {}x{}x{})",
        a.width(),
        a.height(),
        a.channels(),
        b.width(),
        b.height(),
        b.channels()
    )))
}

#[cfg(test)]
#[path = "../../tests/unit/glic/residual.rs"]
mod tests;
