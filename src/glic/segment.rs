use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    buffer::pixel::PixelBuffer,
    foundation::error::{ArtificeError, ArtificeResult},
};

/// Largest accepted segmentation threshold; at this value only `max_size` forces splits.
pub const MAX_THRESHOLD: f64 = 1.0e6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Rectangular leaf region produced by the quadtree segmenter.
pub struct Segment {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
    /// Quadtree depth (0 = whole buffer).
    pub depth: u32,
}

impl Segment {
    /// Side length used by the split rules: `max(w, h)`.
    pub fn side(&self) -> u32 {
        self.w.max(self.h)
    }

    /// Pixel count.
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    fn quadrants(&self) -> impl Iterator<Item = Segment> {
        let hw = self.w / 2;
        let hh = self.h / 2;
        let depth = self.depth + 1;
        // Odd remainders go to the right column and bottom row of quadrants.
        [
            (self.x, self.y, hw, hh),
            (self.x + hw, self.y, self.w - hw, hh),
            (self.x, self.y + hh, hw, self.h - hh),
            (self.x + hw, self.y + hh, self.w - hw, self.h - hh),
        ]
        .into_iter()
        .filter(|&(_, _, w, h)| w > 0 && h > 0)
        .map(move |(x, y, w, h)| Segment { x, y, w, h, depth })
    }
}

/// Flat list of leaf segments, tagged with the dimensions of the buffer they partition.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentList {
    width: u32,
    height: u32,
    segments: Arc<Vec<Segment>>,
}

impl SegmentList {
    /// Wrap an explicit list of segments for a `width`x`height` buffer.
    ///
    /// Bounds are not checked here; consumers validate against the buffer they operate on.
    pub fn new(width: u32, height: u32, segments: Vec<Segment>) -> Self {
        Self {
            width,
            height,
            segments: Arc::new(segments),
        }
    }

    /// A single segment covering the whole buffer.
    pub fn whole(width: u32, height: u32) -> Self {
        Self::new(
            width,
            height,
            vec![Segment {
                x: 0,
                y: 0,
                w: width,
                h: height,
                depth: 0,
            }],
        )
    }

    /// Width of the partitioned buffer.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the partitioned buffer.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Leaf segments in quadtree Z-order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// `true` when the list holds no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check that the list describes `buffer` and every segment lies inside it.
    pub fn validate_for(&self, buffer: &PixelBuffer) -> ArtificeResult<()> {
        if self.width != buffer.width() || self.height != buffer.height() {
            return Err(ArtificeError::computation(format!(
                "segment list describes a {}x{} buffer, got {}x{}",
                self.width,
                self.height,
                buffer.width(),
                buffer.height()
            )));
        }
        for (i, s) in self.segments.iter().enumerate() {
            let in_x = s.x.checked_add(s.w).is_some_and(|r| r <= self.width);
            let in_y = s.y.checked_add(s.h).is_some_and(|b| b <= self.height);
            if s.w == 0 || s.h == 0 || !in_x || !in_y {
                return Err(ArtificeError::computation(format!(
                    "segment {i} ({},{} {}x{}) lies outside the {}x{} buffer",
                    s.x, s.y, s.w, s.h, self.width, self.height
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Content measure deciding whether a region is split.
pub enum Criterion {
    /// Population variance of the samples.
    Variance,
    /// Mean squared 4-neighbour Laplacian.
    EdgeEnergy,
    /// Mean forward-difference gradient magnitude.
    GradientMagnitude,
}

type ScoreFn = fn(&PixelBuffer, &Segment) -> f64;

const SCORERS: [ScoreFn; 3] = [score_variance, score_edge_energy, score_gradient];

impl Criterion {
    /// All criteria in declaration order.
    pub const ALL: [Criterion; 3] = [
        Criterion::Variance,
        Criterion::EdgeEnergy,
        Criterion::GradientMagnitude,
    ];

    /// Parameter names, indexed like [`Criterion::ALL`].
    pub const NAMES: [&'static str; 3] = ["variance", "edge-energy", "gradient-magnitude"];

    /// Canonical parameter name.
    pub fn as_str(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Parse a canonical parameter name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Score `region` of `buffer`, averaged over channels.
    pub fn score(self, buffer: &PixelBuffer, region: &Segment) -> f64 {
        SCORERS[self as usize](buffer, region)
    }
}

/// Partition `buffer` into content-adaptive quadtree leaves.
///
/// A region splits when its side exceeds `max_size`, or when its side exceeds `min_size` and
/// its score is above `threshold`. A threshold of exactly zero always splits down to
/// `min_size`.
#[tracing::instrument(skip(buffer), fields(w = buffer.width(), h = buffer.height()))]
pub fn segment(
    buffer: &PixelBuffer,
    min_size: u32,
    max_size: u32,
    threshold: f64,
    criterion: Criterion,
) -> ArtificeResult<SegmentList> {
    if min_size == 0 {
        return Err(ArtificeError::configuration("segment min_size must be >= 1"));
    }
    if max_size < min_size {
        return Err(ArtificeError::configuration(
            "segment max_size must be >= min_size",
        ));
    }
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ArtificeError::configuration(
            "segment threshold must be finite and >= 0",
        ));
    }
    if buffer.is_empty() {
        return Err(ArtificeError::computation("cannot segment an empty buffer"));
    }

    let root = Segment {
        x: 0,
        y: 0,
        w: buffer.width(),
        h: buffer.height(),
        depth: 0,
    };
    let rules = SplitRules {
        min_size,
        max_size,
        threshold,
        criterion,
    };
    let mut leaves = Vec::new();
    subdivide(buffer, root, &rules, &mut leaves);
    tracing::debug!(leaves = leaves.len(), "quadtree segmentation done");
    Ok(SegmentList::new(buffer.width(), buffer.height(), leaves))
}

struct SplitRules {
    min_size: u32,
    max_size: u32,
    threshold: f64,
    criterion: Criterion,
}

impl SplitRules {
    fn should_split(&self, buffer: &PixelBuffer, region: &Segment) -> bool {
        let side = region.side();
        if side <= self.min_size {
            return false;
        }
        if side > self.max_size || self.threshold == 0.0 {
            return true;
        }
        self.criterion.score(buffer, region) > self.threshold
    }
}

fn subdivide(buffer: &PixelBuffer, region: Segment, rules: &SplitRules, out: &mut Vec<Segment>) {
    if !rules.should_split(buffer, &region) {
        out.push(region);
        return;
    }
    for q in region.quadrants() {
        subdivide(buffer, q, rules, out);
    }
}

/// Copy of `buffer` with the top and left edge of every leaf inverted (`1 - v`).
pub fn render_boundaries(buffer: &PixelBuffer, segments: &SegmentList) -> ArtificeResult<PixelBuffer> {
    segments.validate_for(buffer)?;
    let w = buffer.width() as usize;
    let mut edge = vec![false; w * buffer.height() as usize];
    for s in segments.segments() {
        for x in s.x..s.x + s.w {
            edge[s.y as usize * w + x as usize] = true;
        }
        for y in s.y..s.y + s.h {
            edge[y as usize * w + s.x as usize] = true;
        }
    }
    let channels = buffer.channels() as usize;
    let src = buffer.samples();
    let data: Vec<f32> = src
        .par_iter()
        .enumerate()
        .map(|(i, &v)| if edge[i / channels] { 1.0 - v } else { v })
        .collect();
    PixelBuffer::from_vec(buffer.width(), buffer.height(), buffer.channels(), data)
}

fn channel_samples<'a>(
    buffer: &'a PixelBuffer,
    region: &'a Segment,
    c: usize,
) -> impl Iterator<Item = f64> + 'a {
    (region.y..region.y + region.h).flat_map(move |y| {
        (region.x..region.x + region.w).map(move |x| f64::from(buffer.get(x, y, c)))
    })
}

fn score_variance(buffer: &PixelBuffer, region: &Segment) -> f64 {
    let n = region.area() as f64;
    let channels = buffer.channels() as usize;
    let mut total = 0.0;
    for c in 0..channels {
        let (sum, sum_sq) = channel_samples(buffer, region, c)
            .fold((0.0, 0.0), |(s, s2), v| (s + v, s2 + v * v));
        let mean = sum / n;
        total += (sum_sq / n - mean * mean).max(0.0);
    }
    total / channels as f64
}

fn score_edge_energy(buffer: &PixelBuffer, region: &Segment) -> f64 {
    let channels = buffer.channels() as usize;
    let (x0, y0) = (region.x as i64, region.y as i64);
    let (x1, y1) = (x0 + region.w as i64 - 1, y0 + region.h as i64 - 1);
    let at = |x: i64, y: i64, c: usize| {
        f64::from(buffer.get(x.clamp(x0, x1) as u32, y.clamp(y0, y1) as u32, c))
    };
    let mut total = 0.0;
    for c in 0..channels {
        let mut acc = 0.0;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let lap = at(x - 1, y, c) + at(x + 1, y, c) + at(x, y - 1, c) + at(x, y + 1, c)
                    - 4.0 * at(x, y, c);
                acc += lap * lap;
            }
        }
        total += acc / region.area() as f64;
    }
    total / channels as f64
}

fn score_gradient(buffer: &PixelBuffer, region: &Segment) -> f64 {
    let channels = buffer.channels() as usize;
    let (x1, y1) = (region.x + region.w - 1, region.y + region.h - 1);
    let mut total = 0.0;
    for c in 0..channels {
        let mut acc = 0.0;
        for y in region.y..=y1 {
            for x in region.x..=x1 {
                let v = f64::from(buffer.get(x, y, c));
                let dx = if x < x1 {
                    f64::from(buffer.get(x + 1, y, c)) - v
                } else {
                    0.0
                };
                let dy = if y < y1 {
                    f64::from(buffer.get(x, y + 1, c)) - v
                } else {
                    0.0
                };
                acc += (dx * dx + dy * dy).sqrt();
            }
        }
        total += acc / region.area() as f64;
    }
    total / channels as f64
}

#[cfg(test)]
#[path = "../../tests/unit/glic/segment.rs"]
mod tests;
