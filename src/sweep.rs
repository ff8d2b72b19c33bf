use crate::config::SweepConfig;
use crate::crop::crop_probs_and_labels;
use crate::error::{Result, Slab, StitchError};
use crate::matcher::is_consistent_with;
use crate::oracle::SegmentationOracle;
use crate::vol::{BBox, LabelVol, ProbVol};
use rayon::prelude::*;
use serde::Serialize;

/// z ranges `[near, far)` of the two slabs for overlap width `w`.
pub fn slab_z_ranges(thickness: usize, w: usize) -> ((usize, usize), (usize, usize)) {
    debug_assert!(w <= thickness);
    ((0, thickness), (thickness - w, 2 * thickness - w))
}

/// Plane indices, local to slab A (of depth `len_a`) and slab B, of the one
/// physical plane both slabs are compared on. With `k = w / 2` both name global
/// plane `thickness - w + k`.
pub fn overlap_planes(len_a: usize, w: usize) -> (usize, usize) {
    let k = w / 2;
    (len_a - k - 1, k)
}

/// Pass/fail per (threshold, overlap) cell, `cells[threshold_i][overlap_j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMatrix {
    pub thresholds: Vec<f64>,
    pub overlaps: Vec<usize>,
    pub cells: Vec<Vec<bool>>,
}

impl ResultMatrix {
    /// Did every threshold pass at overlap column `j`?
    pub fn column_passed(&self, j: usize) -> bool {
        self.cells.iter().all(|row| row[j])
    }

    /// Smallest overlap width that passed for every threshold.
    pub fn min_safe_overlap(&self) -> Option<usize> {
        self.overlaps
            .iter()
            .enumerate()
            .filter(|&(j, _)| self.column_passed(j))
            .map(|(_, &w)| w)
            .min()
    }
}

/// One finished cell, reported as it completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellOutcome {
    pub overlap: usize,
    pub threshold: f64,
    pub consistent: bool,
}

pub fn run_sweep<O>(probs: &ProbVol, labels: &LabelVol, oracle: &O, config: &SweepConfig) -> Result<ResultMatrix>
where
    O: SegmentationOracle + ?Sized,
{
    run_sweep_observed(probs, labels, oracle, config, |_| {})
}

/// Run the overlap × threshold sweep, calling `on_cell` after each cell.
///
/// The first oracle failure aborts the whole sweep; no partial matrix is returned.
pub fn run_sweep_observed<O, F>(
    probs: &ProbVol,
    labels: &LabelVol,
    oracle: &O,
    config: &SweepConfig,
    on_cell: F,
) -> Result<ResultMatrix>
where
    O: SegmentationOracle + ?Sized,
    F: Fn(&CellOutcome) + Sync,
{
    if probs.shape() != labels.shape() {
        return Err(StitchError::shape_mismatch("sweep inputs", probs.shape(), labels.shape()));
    }
    config.validate(probs.d)?;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = config.workers {
        builder = builder.num_threads(n);
    }
    let pool = builder.build()?;

    tracing::info!(
        shape = ?probs.shape(),
        thickness = config.thickness,
        n_overlaps = config.overlaps.len(),
        n_thresholds = config.thresholds.len(),
        workers = pool.current_num_threads(),
        "starting overlap sweep"
    );

    // columns[overlap_j][threshold_i]
    let columns: Vec<Vec<bool>> = pool.install(|| {
        config
            .overlaps
            .par_iter()
            .map(|&w| sweep_overlap(probs, labels, oracle, config, w, &on_cell))
            .collect::<Result<Vec<_>>>()
    })?;

    let cells = (0..config.thresholds.len())
        .map(|i| columns.iter().map(|col| col[i]).collect())
        .collect();

    Ok(ResultMatrix {
        thresholds: config.thresholds.clone(),
        overlaps: config.overlaps.clone(),
        cells,
    })
}

/// All thresholds for one overlap width. The slabs are cropped once and shared.
fn sweep_overlap<O, F>(
    probs: &ProbVol,
    labels: &LabelVol,
    oracle: &O,
    config: &SweepConfig,
    w: usize,
    on_cell: &F,
) -> Result<Vec<bool>>
where
    O: SegmentationOracle + ?Sized,
    F: Fn(&CellOutcome) + Sync,
{
    let ((a_near, a_far), (b_near, b_far)) = slab_z_ranges(config.thickness, w);
    let (probs_a, labels_a) =
        crop_probs_and_labels(&BBox::from_xy_crop(&config.xy_crop, a_near, a_far), probs, labels)?;
    let (probs_b, labels_b) =
        crop_probs_and_labels(&BBox::from_xy_crop(&config.xy_crop, b_near, b_far), probs, labels)?;

    let (plane_a, plane_b) = overlap_planes(labels_a.d, w);
    tracing::debug!(overlap = w, slab_a = ?(a_near, a_far), slab_b = ?(b_near, labels_b.d + b_near), plane_a, plane_b, "cropped slabs");

    config
        .thresholds
        .par_iter()
        .map(|&t| {
            let seg_a = segment_slab(oracle, &probs_a, &labels_a, t, w, Slab::A)?;
            let seg_b = segment_slab(oracle, &probs_b, &labels_b, t, w, Slab::B)?;

            let consistent = is_consistent_with(&seg_a.z_plane(plane_a), &seg_b.z_plane(plane_b), config.direction)?;
            if consistent {
                tracing::debug!(overlap = w, threshold = t, "labelings agree");
            } else {
                tracing::debug!(overlap = w, threshold = t, "labelings disagree");
            }

            on_cell(&CellOutcome { overlap: w, threshold: t, consistent });
            Ok(consistent)
        })
        .collect()
}

fn segment_slab<O>(oracle: &O, probs: &ProbVol, labels: &LabelVol, t: f64, w: usize, slab: Slab) -> Result<LabelVol>
where
    O: SegmentationOracle + ?Sized,
{
    let fail = |source| StitchError::OracleFailure { overlap: w, threshold: t, slab, source };

    let seg = oracle.segment(probs, labels, t).map_err(fail)?;
    if seg.shape() != labels.shape() {
        return Err(fail(
            format!("returned shape {:?}, expected {:?}", seg.shape(), labels.shape()).into(),
        ));
    }
    Ok(seg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchDirection;
    use crate::oracle::{BoundaryThresholdOracle, OracleError};
    use crate::test_helpers::{FailingOracle, OneRegionOracle, PassThroughOracle, WrongShapeOracle, flat_probs};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cfg(thickness: usize, thresholds: &[f64], overlaps: &[usize]) -> SweepConfig {
        SweepConfig {
            thickness,
            thresholds: thresholds.to_vec(),
            overlaps: overlaps.to_vec(),
            workers: Some(2),
            ..SweepConfig::default()
        }
    }

    /// Columns of x-stripes that run the whole depth: every slab sees the same regions.
    fn striped_labels(w: usize, h: usize, d: usize) -> LabelVol {
        let mut vol = LabelVol::new(w, h, d);
        for z in 0..d {
            for y in 0..h {
                for x in 0..w {
                    let i = vol.idx(x, y, z);
                    vol.arr[i] = (x / 2) as u32 + 1;
                }
            }
        }
        vol
    }

    #[test]
    fn slab_ranges_share_w_planes() {
        let ((a0, a1), (b0, b1)) = slab_z_ranges(20, 5);
        assert_eq!((a0, a1), (0, 20));
        assert_eq!((b0, b1), (15, 35));
        assert_eq!(a1 - b0, 5);
    }

    #[test]
    fn overlap_planes_name_the_same_global_plane() {
        let thickness = 20;
        for w in [3, 5, 9, 17] {
            let ((a0, _), (b0, _)) = slab_z_ranges(thickness, w);
            let (pa, pb) = overlap_planes(thickness, w);
            assert_eq!(a0 + pa, b0 + pb, "w={w}");
            assert_eq!(b0 + pb, thickness - w + w / 2);
        }
    }

    #[test]
    fn fixed_oracle_passes_every_cell() {
        let probs = flat_probs(4, 3, 12, 0.0);
        let labels = LabelVol::new(4, 3, 12);
        let config = cfg(6, &[100.0, 200.0], &[3, 5]);

        let m = run_sweep(&probs, &labels, &OneRegionOracle, &config).unwrap();
        assert_eq!(m.cells, vec![vec![true, true], vec![true, true]]);
        assert!(m.column_passed(0) && m.column_passed(1));
        assert_eq!(m.min_safe_overlap(), Some(3));
    }

    #[test]
    fn through_going_regions_stitch() {
        let probs = flat_probs(6, 2, 20, 0.0);
        let labels = striped_labels(6, 2, 20);
        let config = SweepConfig { direction: MatchDirection::Bijective, ..cfg(10, &[1.0, 2.0, 3.0], &[3, 5, 9]) };

        let m = run_sweep(&probs, &labels, &PassThroughOracle, &config).unwrap();
        assert!(m.cells.iter().flatten().all(|&c| c));
    }

    #[test]
    fn slab_local_merge_is_caught() {
        // Two x-halves joined only by a bridge in the last plane. Slab B contains the
        // bridge and merges the halves; slab A does not and keeps them apart.
        let (w, h, d) = (4, 1, 9);
        let mut labels = LabelVol::new(w, h, d);
        for z in 0..d {
            for x in 0..w {
                let i = labels.idx(x, 0, z);
                labels.arr[i] = if z == d - 1 { 9 } else if x < 2 { 1 } else { 2 };
            }
        }
        let probs = flat_probs(w, h, d, 0.0);

        // Merges every region when the slab's last plane is a single region.
        let oracle = |_: &ProbVol, l: &LabelVol, _: f64| -> std::result::Result<LabelVol, OracleError> {
            let last = &l.arr[l.arr.len() - l.ps..];
            let bridged = last[0] != 0 && last.iter().all(|&v| v == last[0]);
            Ok(if bridged { l.map(|v| u32::from(v != 0)) } else { l.clone() })
        };

        // Slabs [0, 6) and [3, 9), compared on plane 4.
        let config = cfg(6, &[1.0], &[3]);
        let forward = run_sweep(&probs, &labels, &oracle, &config).unwrap();
        assert_eq!(forward.cells, vec![vec![true]]);

        let bij = SweepConfig { direction: MatchDirection::Bijective, ..config };
        let m = run_sweep(&probs, &labels, &oracle, &bij).unwrap();
        assert_eq!(m.cells, vec![vec![false]]);
        assert_eq!(m.min_safe_overlap(), None);
    }

    #[test]
    fn thickness_below_overlap_fails_before_cropping() {
        let calls = AtomicUsize::new(0);
        let oracle = |_: &ProbVol, l: &LabelVol, _: f64| -> std::result::Result<LabelVol, OracleError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(l.clone())
        };
        let probs = flat_probs(2, 2, 40, 0.0);
        let labels = LabelVol::new(2, 2, 40);

        let err = run_sweep(&probs, &labels, &oracle, &cfg(10, &[1.0], &[17])).unwrap_err();
        assert!(matches!(err, StitchError::InvalidConfiguration(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn oracle_failure_aborts_and_names_the_cell() {
        let probs = flat_probs(2, 2, 12, 0.0);
        let labels = LabelVol::new(2, 2, 12);
        let config = cfg(6, &[1.0, 2.0], &[3]);

        let err = run_sweep(&probs, &labels, &FailingOracle { fail_at: 2.0 }, &config).unwrap_err();
        match err {
            StitchError::OracleFailure { overlap, threshold, .. } => {
                assert_eq!(overlap, 3);
                assert_eq!(threshold, 2.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_output_is_an_oracle_failure() {
        let probs = flat_probs(2, 2, 12, 0.0);
        let labels = LabelVol::new(2, 2, 12);
        let err = run_sweep(&probs, &labels, &WrongShapeOracle, &cfg(6, &[1.0], &[3])).unwrap_err();
        assert!(matches!(err, StitchError::OracleFailure { slab: Slab::A, .. }));
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let probs = flat_probs(2, 2, 12, 0.0);
        let labels = LabelVol::new(2, 3, 12);
        let err = run_sweep(&probs, &labels, &PassThroughOracle, &cfg(6, &[1.0], &[3])).unwrap_err();
        assert!(matches!(err, StitchError::ShapeMismatch { .. }));
    }

    #[test]
    fn observer_sees_every_cell() {
        let probs = flat_probs(2, 2, 12, 0.0);
        let labels = LabelVol::new(2, 2, 12);
        let config = cfg(6, &[1.0, 2.0, 3.0], &[3, 5]);
        let seen = Mutex::new(Vec::new());

        run_sweep_observed(&probs, &labels, &PassThroughOracle, &config, |c| {
            seen.lock().unwrap().push((c.overlap, c.threshold as i64));
        })
        .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec![(3, 1), (3, 2), (3, 3), (5, 1), (5, 2), (5, 3)]);
    }

    #[test]
    fn overlap_growth_is_measured() {
        // Larger overlaps are expected, not guaranteed, to pass at least as often.
        // This records the pass counts per column without asserting an order.
        let (w, h, d) = (8, 8, 40);
        let mut probs = ProbVol::new(w, h, d);
        for (i, p) in probs.arr.iter_mut().enumerate() {
            *p = ((i * 7919) % 256) as f32;
        }
        let labels = crate::oracle::superpixels(&probs, 128.0);
        let config = cfg(20, &[64.0, 128.0, 192.0], &[3, 5, 9, 17]);

        let m = run_sweep(&probs, &labels, &BoundaryThresholdOracle, &config).unwrap();
        let passes: Vec<usize> = (0..m.overlaps.len())
            .map(|j| m.cells.iter().filter(|row| row[j]).count())
            .collect();
        let non_monotone = passes.windows(2).filter(|p| p[1] < p[0]).count();
        eprintln!("pass counts per overlap {:?}: {passes:?}, {non_monotone} decreases", m.overlaps);

        assert_eq!(m.cells.len(), 3);
        assert!(m.cells.iter().all(|row| row.len() == 4));
    }
}
