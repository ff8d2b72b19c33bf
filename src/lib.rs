// Library crate root.
//
// The `substack` binary (src/main.rs) is a thin CLI over these modules.

pub mod config;
pub mod crop;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod oracle;
pub mod sweep;
pub mod table;
pub mod vol;

pub use config::SweepConfig;
pub use crop::crop_probs_and_labels;
pub use error::{Result, StitchError};
pub use matcher::{MatchDirection, is_consistent, is_consistent_with};
pub use oracle::{BoundaryThresholdOracle, OracleError, SegmentationOracle};
pub use sweep::{ResultMatrix, run_sweep, run_sweep_observed};
pub use table::ResultTable;

#[cfg(test)]
pub mod test_helpers;
