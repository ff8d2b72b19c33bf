use crate::error::{Result, StitchError};
use crate::vol::{BBox, LabelVol, ProbVol, relabel};

/// Crop a probability volume and its label volume to the same box.
///
/// The cropped labels are recomputed as connected components, so a region cut in
/// two by the box comes back as two labels and ids only mean something inside
/// the crop.
pub fn crop_probs_and_labels(bbox: &BBox, probs: &ProbVol, labels: &LabelVol) -> Result<(ProbVol, LabelVol)> {
    if probs.shape() != labels.shape() {
        return Err(StitchError::shape_mismatch("crop inputs", probs.shape(), labels.shape()));
    }

    let roi = bbox.resolve(probs.shape())?;
    let probs = probs.sub_vol(&roi);
    let labels = relabel(&labels.sub_vol(&roi));
    Ok((probs, labels))
}
