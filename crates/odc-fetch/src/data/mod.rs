//! Immutable data types for manifest transfers.
//!
//! Configuration, manifests, statistics and progress snapshots. These types
//! are built once per invocation and passed by reference; only the batch
//! runner mutates its own [`BatchStats`] accumulator.

pub mod listing;
pub mod manifest;
pub mod options;
pub mod progress;
pub mod stats;
pub mod verification;

pub use listing::DirEntry;
pub use manifest::{Manifest, ManifestEntry, ManifestSlot};
pub use options::{BatchOptions, TransferOptions};
pub use progress::Progress;
pub use stats::{BatchStats, FileOutcome, FileStatus, TransferOutcome};
pub use verification::{
    VerificationOutcome, VerificationReport, VerificationResult, VerificationStats,
};
