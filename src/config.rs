use crate::error::{Result, StitchError};
use crate::matcher::MatchDirection;
use crate::vol::XyCrop;
use serde::Deserialize;

pub const DEFAULT_THICKNESS: usize = 250;
pub const DEFAULT_THRESHOLD: f64 = 128.0;

/// Overlap widths `2^k + 1` for k = 1..=7.
pub fn default_overlaps() -> Vec<usize> {
    (1..8).map(|k| (1usize << k) + 1).collect()
}

fn default_thickness() -> usize {
    DEFAULT_THICKNESS
}

fn default_thresholds() -> Vec<f64> {
    vec![DEFAULT_THRESHOLD]
}

/// Parameters of one overlap sweep.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Slab thickness along z.
    #[serde(default = "default_thickness")]
    pub thickness: usize,
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<f64>,
    #[serde(default = "default_overlaps")]
    pub overlaps: Vec<usize>,
    #[serde(default)]
    pub xy_crop: XyCrop,
    #[serde(default)]
    pub direction: MatchDirection,
    /// Worker pool size; all cores when unset.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            thickness: DEFAULT_THICKNESS,
            thresholds: default_thresholds(),
            overlaps: default_overlaps(),
            xy_crop: XyCrop::default(),
            direction: MatchDirection::default(),
            workers: None,
        }
    }
}

impl SweepConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the sweep can run on a volume `depth` planes deep.
    pub fn validate(&self, depth: usize) -> Result<()> {
        let bad = |msg: String| Err(StitchError::InvalidConfiguration(msg));

        if self.thresholds.is_empty() {
            return bad("threshold list is empty".to_string());
        }
        if let Some(t) = self.thresholds.iter().find(|t| !t.is_finite()) {
            return bad(format!("threshold {t} is not finite"));
        }
        if self.overlaps.is_empty() {
            return bad("overlap list is empty".to_string());
        }
        if let Some(w) = self.overlaps.iter().find(|&&w| w == 0 || w % 2 == 0) {
            return bad(format!("overlap width {w} is not a positive odd number"));
        }

        let max_overlap = self.overlaps.iter().copied().max().unwrap_or(0);
        if self.thickness < max_overlap {
            return bad(format!(
                "thickness {} is smaller than the largest overlap width {max_overlap}",
                self.thickness
            ));
        }
        if depth < self.thickness {
            return bad(format!("volume depth {depth} is smaller than thickness {}", self.thickness));
        }
        if self.workers == Some(0) {
            return bad("worker count must be at least 1".to_string());
        }
        Ok(())
    }
}
