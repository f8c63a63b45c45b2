//! ctseg-ingest library - catalog construction from a NIfTI tree
//!
//! Walks a data-root directory of base CT volumes and per-team
//! segmentation runs, verifies the run files, and populates the
//! catalog database the ctseg-ui service reads.

pub mod populate;
pub mod scanner;

pub use populate::{populate, PopulateSummary};
pub use scanner::{ScanError, ScanOutcome, ScannedBaseImage, ScannedRun, TreeScanner};
