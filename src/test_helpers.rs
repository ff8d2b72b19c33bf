use crate::oracle::{OracleError, SegmentationOracle};
use crate::vol::{LabelVol, ProbVol, Vol};

/// Build a label volume from one ASCII grid per z plane. Each char is a digit label.
pub fn labels_from_ascii(planes: &[&str]) -> LabelVol {
    let grids: Vec<Vec<&str>> = planes
        .iter()
        .map(|p| p.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect())
        .collect();

    let d = grids.len();
    assert!(d > 0, "need at least one plane");
    let h = grids[0].len();
    assert!(h > 0, "plane must have at least one non-empty row");
    let w = grids[0][0].len();
    for rows in &grids {
        assert_eq!(rows.len(), h, "all planes must have equal height");
        for r in rows {
            assert_eq!(r.len(), w, "all rows must have equal length");
        }
    }

    let mut vol = LabelVol::new(w, h, d);
    for (z, rows) in grids.iter().enumerate() {
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let v = ch
                    .to_digit(10)
                    .unwrap_or_else(|| panic!("invalid label char '{ch}', expected digit"));
                let i = vol.idx(x, y, z);
                vol.arr[i] = v;
            }
        }
    }
    vol
}

/// Repeat one 2-D label grid (rows of label values) along z.
pub fn repeat_plane(rows: &[&[u32]], d: usize) -> LabelVol {
    let h = rows.len();
    let w = rows.first().map_or(0, |r| r.len());
    let mut vol = LabelVol::new(w, h, d);
    for z in 0..d {
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                let i = vol.idx(x, y, z);
                vol.arr[i] = v;
            }
        }
    }
    vol
}

/// A probability volume with every voxel set to `v`.
pub fn flat_probs(w: usize, h: usize, d: usize, v: f32) -> ProbVol {
    let mut vol = ProbVol::new(w, h, d);
    vol.arr.fill(v);
    vol
}

pub fn vol_to_ascii(vol: &Vol<u32>) -> String {
    let mut out = String::new();
    for z in 0..vol.d {
        for y in 0..vol.h {
            for x in 0..vol.w {
                let v = vol.arr[vol.idx(x, y, z)];
                let ch = match v {
                    0..=9 => (b'0' + (v as u8)) as char,
                    10..=35 => (b'A' + ((v as u8) - 10)) as char,
                    _ => '*',
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Returns the initial labels untouched, whatever the threshold.
pub struct PassThroughOracle;

impl SegmentationOracle for PassThroughOracle {
    fn segment(&self, _probs: &ProbVol, labels: &LabelVol, _threshold: f64) -> Result<LabelVol, OracleError> {
        Ok(labels.clone())
    }
}

/// Every voxel in one region.
pub struct OneRegionOracle;

impl SegmentationOracle for OneRegionOracle {
    fn segment(&self, _probs: &ProbVol, labels: &LabelVol, _threshold: f64) -> Result<LabelVol, OracleError> {
        Ok(labels.map(|_| 1))
    }
}

/// Fails for one threshold, passes labels through otherwise.
pub struct FailingOracle {
    pub fail_at: f64,
}

impl SegmentationOracle for FailingOracle {
    fn segment(&self, _probs: &ProbVol, labels: &LabelVol, threshold: f64) -> Result<LabelVol, OracleError> {
        if threshold == self.fail_at {
            return Err(format!("agglomeration diverged at {threshold}").into());
        }
        Ok(labels.clone())
    }
}

/// Returns a volume one plane too short.
pub struct WrongShapeOracle;

impl SegmentationOracle for WrongShapeOracle {
    fn segment(&self, _probs: &ProbVol, labels: &LabelVol, _threshold: f64) -> Result<LabelVol, OracleError> {
        Ok(LabelVol::new(labels.w, labels.h, labels.d.saturating_sub(1)))
    }
}
