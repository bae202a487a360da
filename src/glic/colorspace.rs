use rayon::prelude::*;

use crate::{buffer::pixel::PixelBuffer, foundation::error::ArtificeResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Color spaces a three-channel buffer can be encoded in.
///
/// Every non-RGB encoding is rescaled so each channel lands roughly in `[0, 1]`.
pub enum ColorSpace {
    #[default]
    /// Identity.
    Rgb,
    /// `1 - rgb`.
    Cmy,
    /// BT.601 luma replicated to three channels (lossy).
    Grey,
    /// BT.601 YUV.
    Yuv,
    /// JPEG YCbCr.
    YCbCr,
    /// BT.709 YPbPr.
    YPbPr,
    /// SECAM YDbDr.
    YDbDr,
    /// Ohta I1I2I3.
    Ohta,
    /// Hue, saturation, brightness.
    Hsb,
    /// Hue, whiteness, blackness.
    Hwb,
    /// CIE XYZ (D65, normalized by the white point).
    Xyz,
    /// CIE L*a*b* (D65).
    Lab,
}

type PixelFn = fn([f32; 3]) -> [f32; 3];

const ENCODERS: [PixelFn; 12] = [
    identity, cmy, grey_to, yuv_to, ycbcr_to, ypbpr_to, ydbdr_to, ohta_to, hsb_to, hwb_to, xyz_to,
    lab_to,
];

const DECODERS: [PixelFn; 12] = [
    identity, cmy, identity, yuv_from, ycbcr_from, ypbpr_from, ydbdr_from, ohta_from, hsb_from,
    hwb_from, xyz_from, lab_from,
];

impl ColorSpace {
    /// All spaces in declaration order.
    pub const ALL: [ColorSpace; 12] = [
        ColorSpace::Rgb,
        ColorSpace::Cmy,
        ColorSpace::Grey,
        ColorSpace::Yuv,
        ColorSpace::YCbCr,
        ColorSpace::YPbPr,
        ColorSpace::YDbDr,
        ColorSpace::Ohta,
        ColorSpace::Hsb,
        ColorSpace::Hwb,
        ColorSpace::Xyz,
        ColorSpace::Lab,
    ];

    /// Parameter names, indexed like [`ColorSpace::ALL`].
    pub const NAMES: [&'static str; 12] = [
        "rgb", "cmy", "grey", "yuv", "ycbcr", "ypbpr", "ydbdr", "ohta", "hsb", "hwb", "xyz", "lab",
    ];

    /// Canonical parameter name.
    pub fn as_str(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Parse a canonical parameter name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

fn map_pixels(
    buffer: &PixelBuffer,
    f: impl Fn([f32; 3]) -> [f32; 3] + Sync,
) -> ArtificeResult<PixelBuffer> {
    if buffer.channels() != 3 {
        return Ok(buffer.clone());
    }
    let data: Vec<f32> = buffer
        .samples()
        .par_chunks_exact(3)
        .flat_map_iter(|px| f([px[0], px[1], px[2]]))
        .collect();
    PixelBuffer::from_vec(buffer.width(), buffer.height(), 3, data)
}

/// Encode an RGB buffer into `space`. Single-channel buffers pass through.
pub fn to_space(buffer: &PixelBuffer, space: ColorSpace) -> ArtificeResult<PixelBuffer> {
    map_pixels(buffer, ENCODERS[space as usize])
}

/// Decode a buffer encoded in `space` back to RGB. Single-channel buffers pass through.
pub fn from_space(buffer: &PixelBuffer, space: ColorSpace) -> ArtificeResult<PixelBuffer> {
    map_pixels(buffer, DECODERS[space as usize])
}

/// Reinterpret a buffer encoded in `from` as `to`.
pub fn convert(buffer: &PixelBuffer, from: ColorSpace, to: ColorSpace) -> ArtificeResult<PixelBuffer> {
    if from == to {
        return Ok(buffer.clone());
    }
    let decode = DECODERS[from as usize];
    let encode = ENCODERS[to as usize];
    map_pixels(buffer, |p| encode(decode(p)))
}

fn identity(p: [f32; 3]) -> [f32; 3] {
    p
}

fn cmy([r, g, b]: [f32; 3]) -> [f32; 3] {
    [1.0 - r, 1.0 - g, 1.0 - b]
}

fn luma601(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

fn grey_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    let y = luma601(r, g, b);
    [y, y, y]
}

const U_MAX: f32 = 0.436;
const V_MAX: f32 = 0.615;

fn yuv_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    let y = luma601(r, g, b);
    let u = -0.147_13 * r - 0.288_86 * g + 0.436 * b;
    let v = 0.615 * r - 0.514_99 * g - 0.100_01 * b;
    [y, u / (2.0 * U_MAX) + 0.5, v / (2.0 * V_MAX) + 0.5]
}

fn yuv_from([y, u, v]: [f32; 3]) -> [f32; 3] {
    let u = (u - 0.5) * 2.0 * U_MAX;
    let v = (v - 0.5) * 2.0 * V_MAX;
    [
        y + 1.139_83 * v,
        y - 0.394_65 * u - 0.580_60 * v,
        y + 2.032_11 * u,
    ]
}

fn ycbcr_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    [
        luma601(r, g, b),
        0.5 - 0.168_736 * r - 0.331_264 * g + 0.5 * b,
        0.5 + 0.5 * r - 0.418_688 * g - 0.081_312 * b,
    ]
}

fn ycbcr_from([y, cb, cr]: [f32; 3]) -> [f32; 3] {
    let (cb, cr) = (cb - 0.5, cr - 0.5);
    [
        y + 1.402 * cr,
        y - 0.344_136 * cb - 0.714_136 * cr,
        y + 1.772 * cb,
    ]
}

const KR709: f32 = 0.2126;
const KB709: f32 = 0.0722;
const KG709: f32 = 1.0 - KR709 - KB709;

fn ypbpr_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    let y = KR709 * r + KG709 * g + KB709 * b;
    [
        y,
        (b - y) / (2.0 * (1.0 - KB709)) + 0.5,
        (r - y) / (2.0 * (1.0 - KR709)) + 0.5,
    ]
}

fn ypbpr_from([y, pb, pr]: [f32; 3]) -> [f32; 3] {
    let b = y + (pb - 0.5) * 2.0 * (1.0 - KB709);
    let r = y + (pr - 0.5) * 2.0 * (1.0 - KR709);
    let g = (y - KR709 * r - KB709 * b) / KG709;
    [r, g, b]
}

const D_SCALE: f32 = 1.333;

fn ydbdr_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    let y = luma601(r, g, b);
    let db = D_SCALE * (b - y);
    let dr = -D_SCALE * (r - y);
    [y, db / (2.0 * D_SCALE) + 0.5, dr / (2.0 * D_SCALE) + 0.5]
}

fn ydbdr_from([y, db, dr]: [f32; 3]) -> [f32; 3] {
    let b = y + (db - 0.5) * 2.0;
    let r = y - (dr - 0.5) * 2.0;
    let g = (y - 0.299 * r - 0.114 * b) / 0.587;
    [r, g, b]
}

fn ohta_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    [
        (r + g + b) / 3.0,
        (r - b) / 2.0 + 0.5,
        (2.0 * g - r - b) / 4.0 + 0.5,
    ]
}

fn ohta_from([i1, i2, i3]: [f32; 3]) -> [f32; 3] {
    let (i2, i3) = (i2 - 0.5, i3 - 0.5);
    [
        i1 + i2 - 2.0 / 3.0 * i3,
        i1 + 4.0 / 3.0 * i3,
        i1 - i2 - 2.0 / 3.0 * i3,
    ]
}

fn hue(r: f32, g: f32, b: f32, max: f32, delta: f32) -> f32 {
    if delta <= 0.0 {
        return 0.0;
    }
    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    h / 6.0
}

fn hsb_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    [hue(r, g, b, max, delta), s, max]
}

fn hsb_from([h, s, v]: [f32; 3]) -> [f32; 3] {
    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor().min(5.0);
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as i32 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

fn hwb_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    [hue(r, g, b, max, max - min), min, 1.0 - max]
}

fn hwb_from([h, w, bl]: [f32; 3]) -> [f32; 3] {
    let v = 1.0 - bl;
    let s = if v > 0.0 { 1.0 - w / v } else { 0.0 };
    hsb_from([h, s, v])
}

const WHITE_D65: [f32; 3] = [0.950_47, 1.0, 1.088_83];

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn xyz_to([r, g, b]: [f32; 3]) -> [f32; 3] {
    let (r, g, b) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));
    [
        (0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / WHITE_D65[0],
        (0.212_672_9 * r + 0.715_152_2 * g + 0.072_175 * b) / WHITE_D65[1],
        (0.019_333_9 * r + 0.119_192 * g + 0.950_304_1 * b) / WHITE_D65[2],
    ]
}

fn xyz_from([x, y, z]: [f32; 3]) -> [f32; 3] {
    let (x, y, z) = (x * WHITE_D65[0], y * WHITE_D65[1], z * WHITE_D65[2]);
    let r = 3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z;
    let g = -0.969_266 * x + 1.876_010_8 * y + 0.041_556 * z;
    let b = 0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z;
    [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b)]
}

const LAB_EPS: f32 = 216.0 / 24389.0;
const LAB_KAPPA: f32 = 24389.0 / 27.0;

fn lab_f(t: f32) -> f32 {
    if t > LAB_EPS {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let t = f * f * f;
    if t > LAB_EPS {
        t
    } else {
        (116.0 * f - 16.0) / LAB_KAPPA
    }
}

fn lab_to(rgb: [f32; 3]) -> [f32; 3] {
    let [x, y, z] = xyz_to(rgb);
    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);
    [l / 100.0, a / 256.0 + 0.5, b / 256.0 + 0.5]
}

fn lab_from([l, a, b]: [f32; 3]) -> [f32; 3] {
    let fy = (l * 100.0 + 16.0) / 116.0;
    let fx = fy + (a - 0.5) * 256.0 / 500.0;
    let fz = fy - (b - 0.5) * 256.0 / 200.0;
    xyz_from([lab_f_inv(fx), lab_f_inv(fy), lab_f_inv(fz)])
}

#[cfg(test)]
#[path = "../../tests/unit/glic/colorspace.rs"]
mod tests;
