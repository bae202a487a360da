use super::*;

fn checkerboard(size: u32) -> PixelBuffer {
    PixelBuffer::from_fn(size, size, 1, |x, y, _| ((x + y) % 2) as f32).unwrap()
}

fn coverage(list: &SegmentList) -> Vec<u32> {
    let mut hits = vec![0u32; (list.width() * list.height()) as usize];
    for s in list.segments() {
        for y in s.y..s.y + s.h {
            for x in s.x..s.x + s.w {
                hits[(y * list.width() + x) as usize] += 1;
            }
        }
    }
    hits
}

#[test]
fn checkerboard_threshold_zero_yields_sixteen_4x4_leaves() {
    let list = segment(&checkerboard(16), 4, 16, 0.0, Criterion::Variance).unwrap();
    assert_eq!(list.len(), 16);
    for s in list.segments() {
        assert_eq!((s.w, s.h), (4, 4));
        assert_eq!(s.depth, 2);
    }
}

#[test]
fn threshold_zero_splits_flat_regions_to_min_size() {
    let flat = PixelBuffer::filled(32, 32, 3, 0.5).unwrap();
    let list = segment(&flat, 8, 32, 0.0, Criterion::EdgeEnergy).unwrap();
    assert!(list.segments().iter().all(|s| s.side() == 8));
    assert_eq!(list.len(), 16);
}

#[test]
fn max_threshold_keeps_single_segment() {
    let list = segment(&checkerboard(16), 2, 16, MAX_THRESHOLD, Criterion::Variance).unwrap();
    assert_eq!(list.segments(), &[Segment { x: 0, y: 0, w: 16, h: 16, depth: 0 }]);
}

#[test]
fn max_size_forces_split_regardless_of_score() {
    let flat = PixelBuffer::filled(32, 32, 1, 0.0).unwrap();
    let list = segment(&flat, 1, 8, MAX_THRESHOLD, Criterion::GradientMagnitude).unwrap();
    assert_eq!(list.len(), 16);
    assert!(list.segments().iter().all(|s| s.side() == 8));
}

#[test]
fn odd_sizes_are_fully_covered_without_overlap() {
    let img = PixelBuffer::from_fn(13, 7, 3, |x, y, c| ((x * 7 + y * 3 + c as u32) % 5) as f32 / 4.0)
        .unwrap();
    for criterion in Criterion::ALL {
        let list = segment(&img, 1, 13, 0.0, criterion).unwrap();
        assert!(coverage(&list).iter().all(|&n| n == 1), "{criterion:?}");
        list.validate_for(&img).unwrap();
    }
}

#[test]
fn leaves_come_out_in_z_order() {
    let list = segment(&checkerboard(8), 4, 8, 0.0, Criterion::Variance).unwrap();
    let origins: Vec<(u32, u32)> = list.segments().iter().map(|s| (s.x, s.y)).collect();
    assert_eq!(origins, vec![(0, 0), (4, 0), (0, 4), (4, 4)]);
}

#[test]
fn only_busy_quadrant_is_refined() {
    // Top-left 8x8 quadrant is a checkerboard, the rest is flat.
    let img = PixelBuffer::from_fn(16, 16, 1, |x, y, _| {
        if x < 8 && y < 8 { ((x + y) % 2) as f32 } else { 0.5 }
    })
    .unwrap();
    let list = segment(&img, 4, 16, 0.01, Criterion::Variance).unwrap();
    // Four 4x4 leaves in the busy quadrant + three flat 8x8 quadrants.
    assert_eq!(list.len(), 7);
    assert_eq!(list.segments().iter().filter(|s| s.side() == 8).count(), 3);
}

#[test]
fn criterion_scores_are_zero_on_flat_regions() {
    let flat = PixelBuffer::filled(8, 8, 3, 0.7).unwrap();
    let whole = Segment { x: 0, y: 0, w: 8, h: 8, depth: 0 };
    for c in Criterion::ALL {
        assert!(c.score(&flat, &whole).abs() < 1e-9);
    }
    let busy = checkerboard(8);
    assert!((Criterion::Variance.score(&busy, &whole) - 0.25).abs() < 1e-9);
    assert!(Criterion::GradientMagnitude.score(&busy, &whole) > 0.5);
}

#[test]
fn invalid_arguments_are_configuration_errors() {
    let img = checkerboard(4);
    assert!(matches!(
        segment(&img, 0, 4, 0.0, Criterion::Variance),
        Err(ArtificeError::Configuration(_))
    ));
    assert!(matches!(
        segment(&img, 4, 2, 0.0, Criterion::Variance),
        Err(ArtificeError::Configuration(_))
    ));
    assert!(matches!(
        segment(&img, 1, 4, f64::NAN, Criterion::Variance),
        Err(ArtificeError::Configuration(_))
    ));
}

#[test]
fn out_of_bounds_segments_are_rejected() {
    let img = checkerboard(4);
    let bad = SegmentList::new(4, 4, vec![Segment { x: 2, y: 2, w: 4, h: 1, depth: 0 }]);
    assert!(matches!(bad.validate_for(&img), Err(ArtificeError::Computation(_))));
    let wrong_dims = SegmentList::whole(8, 8);
    assert!(wrong_dims.validate_for(&img).is_err());
}

#[test]
fn boundaries_invert_leaf_edges_only() {
    let img = PixelBuffer::filled(4, 4, 1, 0.0).unwrap();
    let list = segment(&img, 2, 4, 0.0, Criterion::Variance).unwrap();
    let vis = render_boundaries(&img, &list).unwrap();
    assert_eq!(vis.get(0, 0, 0), 1.0);
    assert_eq!(vis.get(2, 1, 0), 1.0);
    assert_eq!(vis.get(1, 1, 0), 0.0);
    assert_eq!(vis.get(3, 3, 0), 0.0);
}

#[test]
fn criterion_names_round_trip() {
    for c in Criterion::ALL {
        assert_eq!(Criterion::from_name(c.as_str()), Some(c));
    }
    assert_eq!(Criterion::from_name("entropy"), None);
}
