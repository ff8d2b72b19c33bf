use crate::vol::{LabelVol, ProbVol, label_vol, relabel};

pub type OracleError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A segmentation engine: probabilities plus an initial labeling in, final labels out.
///
/// Implementations must be deterministic and return a volume of the input shape.
/// The sweep calls this concurrently from worker threads.
pub trait SegmentationOracle: Sync {
    fn segment(&self, probs: &ProbVol, labels: &LabelVol, threshold: f64) -> Result<LabelVol, OracleError>;
}

impl<F> SegmentationOracle for F
where
    F: Fn(&ProbVol, &LabelVol, f64) -> Result<LabelVol, OracleError> + Sync,
{
    fn segment(&self, probs: &ProbVol, labels: &LabelVol, threshold: f64) -> Result<LabelVol, OracleError> {
        self(probs, labels, threshold)
    }
}

/// Initial superpixels when no precomputed labeling is available: connected
/// components of voxels whose boundary probability is below `level`.
pub fn superpixels(probs: &ProbVol, level: f32) -> LabelVol {
    let interior = probs.map(|p| u8::from(p < level));
    let (labels, infos) = label_vol(&interior);
    tracing::debug!(level, n_superpixels = infos.len() - 1, "derived initial superpixels");
    labels
}

/// Baseline oracle: keep the voxels of each initial region whose probability is
/// below the threshold, then split what is left into connected pieces.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundaryThresholdOracle;

impl SegmentationOracle for BoundaryThresholdOracle {
    fn segment(&self, probs: &ProbVol, labels: &LabelVol, threshold: f64) -> Result<LabelVol, OracleError> {
        if probs.shape() != labels.shape() {
            return Err(format!("probs {:?} and labels {:?} differ in shape", probs.shape(), labels.shape()).into());
        }

        let mut keyed = labels.clone();
        for (k, &p) in keyed.arr.iter_mut().zip(&probs.arr) {
            if f64::from(p) >= threshold {
                *k = 0;
            }
        }
        Ok(relabel(&keyed))
    }
}
