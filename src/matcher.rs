use crate::error::{Result, StitchError};
use crate::vol::LabelVol;
use serde::Deserialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Which way label correspondence must be functional.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDirection {
    /// Every label in `a` co-occurs with exactly one label in `b`.
    /// `b` may still merge several `a` regions.
    #[default]
    Forward,
    /// Forward, and every label in `b` co-occurs with exactly one label in `a`.
    Bijective,
}

/// Record `src -> tar`; false if `src` was already seen with another target.
#[inline(always)]
fn note(map: &mut HashMap<u32, u32>, src: u32, tar: u32) -> bool {
    match map.entry(src) {
        Entry::Vacant(e) => {
            e.insert(tar);
            true
        }
        Entry::Occupied(e) => *e.get() == tar,
    }
}

/// True when every label of `a` maps to a single label of `b` at every voxel.
pub fn is_consistent(a: &LabelVol, b: &LabelVol) -> Result<bool> {
    is_consistent_with(a, b, MatchDirection::Forward)
}

/// Label-correspondence test between two segmentations of the same voxels.
///
/// Background (0) is compared like any other label. Empty volumes are trivially
/// consistent.
pub fn is_consistent_with(a: &LabelVol, b: &LabelVol, direction: MatchDirection) -> Result<bool> {
    if a.shape() != b.shape() {
        return Err(StitchError::shape_mismatch("overlap comparison", a.shape(), b.shape()));
    }

    let mut a_to_b: HashMap<u32, u32> = HashMap::new();
    let mut b_to_a: HashMap<u32, u32> = HashMap::new();
    let check_reverse = direction == MatchDirection::Bijective;

    for (&la, &lb) in a.arr.iter().zip(&b.arr) {
        if !note(&mut a_to_b, la, lb) {
            return Ok(false);
        }
        if check_reverse && !note(&mut b_to_a, lb, la) {
            return Ok(false);
        }
    }
    Ok(true)
}
