use rayon::prelude::*;

use crate::{
    buffer::pixel::PixelBuffer,
    foundation::{
        error::{ArtificeError, ArtificeResult},
        math::{Rng64, resolve_seed},
    },
    glic::segment::{Segment, SegmentList},
};

/// Number of base (non-meta) predictors.
pub const BASE_PREDICTOR_COUNT: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
/// Per-segment prediction function. Ids 0-15 are base predictors, 16-18 meta-predictors.
///
/// `H` is the sample left of the current row, `V` the sample above the current column and `C`
/// the top-left corner of the segment.
pub enum Predictor {
    /// Predicts 0.
    None = 0,
    /// `C`.
    Corner = 1,
    /// `H`.
    Horizontal = 2,
    /// `V`.
    Vertical = 3,
    /// Mean of the above row and left column.
    DcMean = 4,
    /// Median of the above row and left column.
    DcMedian = 5,
    /// `median(H, V, C)`.
    Median = 6,
    /// `(H + V) / 2`.
    Average = 7,
    /// `H + V - C`.
    TrueMotion = 8,
    /// Closest of `H`, `V`, `C` to `H + V - C`.
    Paeth = 9,
    /// Extends the top-left diagonal into the block.
    LeftDiagonal = 10,
    /// `V` above the block diagonal, `H` on and below it.
    HvByPosition = 11,
    /// JPEG-LS median edge detector.
    JpegLsMed = 12,
    /// `|H - V|`.
    Difference = 13,
    /// Copies the neighbouring block whose border context best matches.
    Reference = 14,
    /// Extrapolates along the dominant context direction.
    Angle = 15,
    /// Per segment, the base predictor with the lowest residual energy.
    Sad = 16,
    /// Per segment, the base predictor with the highest residual energy.
    Bsad = 17,
    /// Per segment, a seeded uniform draw over the base predictors.
    Random = 18,
}

impl Predictor {
    /// Base predictors in id order.
    pub const BASE: [Predictor; BASE_PREDICTOR_COUNT] = [
        Predictor::None,
        Predictor::Corner,
        Predictor::Horizontal,
        Predictor::Vertical,
        Predictor::DcMean,
        Predictor::DcMedian,
        Predictor::Median,
        Predictor::Average,
        Predictor::TrueMotion,
        Predictor::Paeth,
        Predictor::LeftDiagonal,
        Predictor::HvByPosition,
        Predictor::JpegLsMed,
        Predictor::Difference,
        Predictor::Reference,
        Predictor::Angle,
    ];

    /// Every predictor in id order.
    pub const ALL: [Predictor; 19] = [
        Predictor::None,
        Predictor::Corner,
        Predictor::Horizontal,
        Predictor::Vertical,
        Predictor::DcMean,
        Predictor::DcMedian,
        Predictor::Median,
        Predictor::Average,
        Predictor::TrueMotion,
        Predictor::Paeth,
        Predictor::LeftDiagonal,
        Predictor::HvByPosition,
        Predictor::JpegLsMed,
        Predictor::Difference,
        Predictor::Reference,
        Predictor::Angle,
        Predictor::Sad,
        Predictor::Bsad,
        Predictor::Random,
    ];

    /// Numeric id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Predictor with numeric id `id`.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    /// `true` for SAD, BSAD and RANDOM.
    pub fn is_meta(self) -> bool {
        self.id() as usize >= BASE_PREDICTOR_COUNT
    }

    /// Canonical parameter name.
    pub fn as_str(self) -> &'static str {
        PREDICTOR_NAMES[self as usize]
    }

    /// Parse a canonical parameter name.
    pub fn from_name(name: &str) -> Option<Self> {
        PREDICTOR_NAMES
            .iter()
            .position(|&n| n == name)
            .and_then(|i| Self::from_id(i as u8))
    }
}

/// Canonical names in id order.
pub const PREDICTOR_NAMES: [&str; 19] = [
    "none",
    "corner",
    "horizontal",
    "vertical",
    "dc-mean",
    "dc-median",
    "median",
    "average",
    "true-motion",
    "paeth",
    "left-diagonal",
    "hv-by-position",
    "jpeg-ls-med",
    "difference",
    "reference",
    "angle",
    "sad",
    "bsad",
    "random",
];

/// Output of [`predict`].
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    /// Predicted buffer, same shape as the input. Not clamped.
    pub buffer: PixelBuffer,
    /// Base predictor actually used for each segment, in segment order.
    pub choices: Vec<Predictor>,
}

/// Predict every segment of `buffer` from its border context.
///
/// `border` stands in for context that falls outside the image. `seed` only matters for
/// [`Predictor::Random`]; zero draws a fresh seed for the call.
#[tracing::instrument(skip(buffer, segments), fields(segments = segments.len()))]
pub fn predict(
    buffer: &PixelBuffer,
    segments: &SegmentList,
    predictor: Predictor,
    seed: u64,
    border: f32,
) -> ArtificeResult<Prediction> {
    segments.validate_for(buffer)?;
    if !border.is_finite() {
        return Err(ArtificeError::configuration("predictor border value must be finite"));
    }
    let seed = if predictor == Predictor::Random {
        resolve_seed(seed)
    } else {
        seed
    };

    let blocks: Vec<(Predictor, Vec<Vec<f32>>)> = segments
        .segments()
        .par_iter()
        .enumerate()
        .map(|(i, seg)| predict_segment(buffer, seg, predictor, seed, i as u64, border))
        .collect();

    let mut out = vec![0.0f32; buffer.samples().len()];
    let mut choices = Vec::with_capacity(blocks.len());
    for (seg, (choice, planes)) in segments.segments().iter().zip(blocks) {
        scatter(buffer, seg, &planes, &mut out);
        choices.push(choice);
    }

    Ok(Prediction {
        buffer: PixelBuffer::from_vec(buffer.width(), buffer.height(), buffer.channels(), out)?,
        choices,
    })
}

/// Residual energy (sum of absolute error over all channels) of every base predictor on
/// `segment`, indexed by predictor id.
pub fn segment_energies(
    buffer: &PixelBuffer,
    segment: &Segment,
    border: f32,
) -> [f64; BASE_PREDICTOR_COUNT] {
    let ctxs = contexts(buffer, segment, border);
    let mut energies = [0.0; BASE_PREDICTOR_COUNT];
    for p in Predictor::BASE {
        energies[p as usize] = block_energy(buffer, segment, &planes_for(&ctxs, p));
    }
    energies
}

fn predict_segment(
    buffer: &PixelBuffer,
    seg: &Segment,
    predictor: Predictor,
    seed: u64,
    index: u64,
    border: f32,
) -> (Predictor, Vec<Vec<f32>>) {
    let ctxs = contexts(buffer, seg, border);
    match predictor {
        Predictor::Sad | Predictor::Bsad => {
            let want_min = predictor == Predictor::Sad;
            let mut best: Option<(Predictor, f64, Vec<Vec<f32>>)> = None;
            for p in Predictor::BASE {
                let planes = planes_for(&ctxs, p);
                let e = block_energy(buffer, seg, &planes);
                // Strict comparison keeps the lowest id on ties.
                let better = match &best {
                    None => true,
                    Some((_, be, _)) => {
                        if want_min {
                            e < *be
                        } else {
                            e > *be
                        }
                    }
                };
                if better {
                    best = Some((p, e, planes));
                }
            }
            match best {
                Some((p, _, planes)) => (p, planes),
                None => (Predictor::None, planes_for(&ctxs, Predictor::None)),
            }
        }
        Predictor::Random => {
            let mut rng = Rng64::for_index(seed, index);
            let p = Predictor::BASE[rng.next_below(BASE_PREDICTOR_COUNT as u64) as usize];
            (p, planes_for(&ctxs, p))
        }
        base => (base, planes_for(&ctxs, base)),
    }
}

fn scatter(buffer: &PixelBuffer, seg: &Segment, planes: &[Vec<f32>], out: &mut [f32]) {
    let w = seg.w as usize;
    for (c, plane) in planes.iter().enumerate() {
        for i in 0..seg.h {
            for j in 0..seg.w {
                out[buffer.index(seg.x + j, seg.y + i, c)] = plane[i as usize * w + j as usize];
            }
        }
    }
}

fn block_energy(buffer: &PixelBuffer, seg: &Segment, planes: &[Vec<f32>]) -> f64 {
    let w = seg.w as usize;
    let mut e = 0.0;
    for (c, plane) in planes.iter().enumerate() {
        for i in 0..seg.h {
            for j in 0..seg.w {
                let actual = buffer.get(seg.x + j, seg.y + i, c);
                e += f64::from((actual - plane[i as usize * w + j as usize]).abs());
            }
        }
    }
    e
}

/// Border context of one channel of one segment.
struct BlockContext<'a> {
    source: &'a PixelBuffer,
    seg: Segment,
    channel: usize,
    above: Vec<f32>,
    left: Vec<f32>,
    corner: f32,
    border: f32,
}

impl BlockContext<'_> {
    fn w(&self) -> usize {
        self.seg.w as usize
    }

    fn h(&self) -> usize {
        self.seg.h as usize
    }

    fn fill(&self, out: &mut [f32], f: impl Fn(usize, usize) -> f32) {
        let w = self.w();
        for i in 0..self.h() {
            for j in 0..w {
                out[i * w + j] = f(i, j);
            }
        }
    }
}

fn contexts<'a>(buffer: &'a PixelBuffer, seg: &Segment, border: f32) -> Vec<BlockContext<'a>> {
    (0..buffer.channels() as usize)
        .map(|c| context_at(buffer, seg.x, seg.y, seg, c, border))
        .collect()
}

/// Context of a `seg`-sized block placed at `(x, y)`.
fn context_at<'a>(
    buffer: &'a PixelBuffer,
    x: u32,
    y: u32,
    seg: &Segment,
    channel: usize,
    border: f32,
) -> BlockContext<'a> {
    let above = (0..seg.w)
        .map(|j| {
            if y > 0 {
                buffer.get(x + j, y - 1, channel)
            } else {
                border
            }
        })
        .collect();
    let left = (0..seg.h)
        .map(|i| {
            if x > 0 {
                buffer.get(x - 1, y + i, channel)
            } else {
                border
            }
        })
        .collect();
    let corner = if x > 0 && y > 0 {
        buffer.get(x - 1, y - 1, channel)
    } else {
        border
    };
    BlockContext {
        source: buffer,
        seg: Segment { x, y, ..*seg },
        channel,
        above,
        left,
        corner,
        border,
    }
}

fn planes_for(ctxs: &[BlockContext<'_>], p: Predictor) -> Vec<Vec<f32>> {
    ctxs.iter()
        .map(|ctx| {
            let mut out = vec![0.0; ctx.w() * ctx.h()];
            BASE_TABLE[p as usize](ctx, &mut out);
            out
        })
        .collect()
}

type BaseFn = fn(&BlockContext<'_>, &mut [f32]);

const BASE_TABLE: [BaseFn; BASE_PREDICTOR_COUNT] = [
    pred_none,
    pred_corner,
    pred_horizontal,
    pred_vertical,
    pred_dc_mean,
    pred_dc_median,
    pred_median,
    pred_average,
    pred_true_motion,
    pred_paeth,
    pred_left_diagonal,
    pred_hv_by_position,
    pred_jpeg_ls_med,
    pred_difference,
    pred_reference,
    pred_angle,
];

fn pred_none(_: &BlockContext<'_>, out: &mut [f32]) {
    out.fill(0.0);
}

fn pred_corner(ctx: &BlockContext<'_>, out: &mut [f32]) {
    out.fill(ctx.corner);
}

fn pred_horizontal(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, _| ctx.left[i]);
}

fn pred_vertical(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |_, j| ctx.above[j]);
}

fn pred_dc_mean(ctx: &BlockContext<'_>, out: &mut [f32]) {
    let n = (ctx.above.len() + ctx.left.len()) as f64;
    let sum: f64 = ctx.above.iter().chain(&ctx.left).map(|&v| f64::from(v)).sum();
    out.fill((sum / n) as f32);
}

fn pred_dc_median(ctx: &BlockContext<'_>, out: &mut [f32]) {
    let mut all: Vec<f32> = ctx.above.iter().chain(&ctx.left).copied().collect();
    all.sort_by(f32::total_cmp);
    let mid = all.len() / 2;
    let m = if all.len() % 2 == 0 {
        (all[mid - 1] + all[mid]) / 2.0
    } else {
        all[mid]
    };
    out.fill(m);
}

fn median3(a: f32, b: f32, c: f32) -> f32 {
    a.min(b).max(a.max(b).min(c))
}

fn pred_median(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, j| median3(ctx.left[i], ctx.above[j], ctx.corner));
}

fn pred_average(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, j| (ctx.left[i] + ctx.above[j]) / 2.0);
}

fn pred_true_motion(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, j| ctx.left[i] + ctx.above[j] - ctx.corner);
}

fn paeth(h: f32, v: f32, c: f32) -> f32 {
    let base = h + v - c;
    let (dh, dv, dc) = ((base - h).abs(), (base - v).abs(), (base - c).abs());
    if dh <= dv && dh <= dc {
        h
    } else if dv <= dc {
        v
    } else {
        c
    }
}

fn pred_paeth(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, j| paeth(ctx.left[i], ctx.above[j], ctx.corner));
}

fn pred_left_diagonal(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, j| match j.cmp(&i) {
        std::cmp::Ordering::Greater => ctx.above[j - i - 1],
        std::cmp::Ordering::Less => ctx.left[i - j - 1],
        std::cmp::Ordering::Equal => ctx.corner,
    });
}

fn pred_hv_by_position(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, j| if j > i { ctx.above[j] } else { ctx.left[i] });
}

fn jpeg_ls_med(h: f32, v: f32, c: f32) -> f32 {
    if c >= h.max(v) {
        h.min(v)
    } else if c <= h.min(v) {
        h.max(v)
    } else {
        h + v - c
    }
}

fn pred_jpeg_ls_med(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, j| jpeg_ls_med(ctx.left[i], ctx.above[j], ctx.corner));
}

fn pred_difference(ctx: &BlockContext<'_>, out: &mut [f32]) {
    ctx.fill(out, |i, j| (ctx.left[i] - ctx.above[j]).abs());
}

fn context_sad(a: &BlockContext<'_>, b: &BlockContext<'_>) -> f64 {
    let rows = a.above.iter().zip(&b.above);
    let cols = a.left.iter().zip(&b.left);
    rows.chain(cols)
        .map(|(&x, &y)| f64::from((x - y).abs()))
        .sum::<f64>()
        + f64::from((a.corner - b.corner).abs())
}

fn pred_reference(ctx: &BlockContext<'_>, out: &mut [f32]) {
    let src = ctx.source;
    let (x, y, w, h) = (
        i64::from(ctx.seg.x),
        i64::from(ctx.seg.y),
        i64::from(ctx.seg.w),
        i64::from(ctx.seg.h),
    );
    let (bw, bh) = (i64::from(src.width()), i64::from(src.height()));
    let candidates = [(x, y - h), (x - w, y), (x - w, y - h), (x + w, y - h)];

    let mut best: Option<(f64, u32, u32)> = None;
    for (cx, cy) in candidates {
        if cx < 0 || cy < 0 || cx + w > bw || cy + h > bh {
            continue;
        }
        let (cx, cy) = (cx as u32, cy as u32);
        let cand = context_at(src, cx, cy, &ctx.seg, ctx.channel, ctx.border);
        let score = context_sad(ctx, &cand);
        if best.is_none_or(|(s, _, _)| score < s) {
            best = Some((score, cx, cy));
        }
    }

    match best {
        Some((_, cx, cy)) => ctx.fill(out, |i, j| {
            src.get(cx + j as u32, cy + i as u32, ctx.channel)
        }),
        None => out.fill(ctx.border),
    }
}

fn mean_abs_step(v: &[f32]) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let sum: f64 = v.windows(2).map(|p| f64::from((p[1] - p[0]).abs())).sum();
    sum / (v.len() - 1) as f64
}

fn pred_angle(ctx: &BlockContext<'_>, out: &mut [f32]) {
    // theta = 0 copies vertically, theta = pi/2 copies horizontally.
    let theta = mean_abs_step(&ctx.left).atan2(mean_abs_step(&ctx.above));
    let t = theta.tan();
    let (w, h) = (ctx.w(), ctx.h());
    ctx.fill(out, |i, j| {
        let col = j as f64 - (i as f64 + 1.0) * t;
        if col >= 0.0 {
            return ctx.above[(col.round() as usize).min(w - 1)];
        }
        let row = i as f64 - (j as f64 + 1.0) / t;
        if row >= 0.0 {
            ctx.left[(row.round() as usize).min(h - 1)]
        } else {
            ctx.corner
        }
    });
}

#[cfg(test)]
#[path = "../../tests/unit/glic/predict.rs"]
mod tests;
