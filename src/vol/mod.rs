pub mod core;
pub use core::{LabelVol, ProbVol, Vol};

pub mod roi;
pub use roi::{BBox, Roi3, XyCrop};

pub mod label;
pub use label::{LabelInfo, label_vol, relabel};

// Optional extras
// -----------------------------------------------------------------------------

#[cfg(feature = "vol-io")]
pub mod io;
