//! Resumable manifest downloads with post-transfer verification.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Manifest, options, statistics and progress snapshots
//! - [`core`] - Pure transformations: retry policy, status classification, filters
//! - [`effects`] - I/O: byte sources, the transfer engine, batches, verification
//!
//! # Key Features
//!
//! - **Strict resume**: the destination is re-stat'ed on every attempt and a
//!   server that ignores the range request causes a rewrite, never an append
//! - **Bounded retry**: a fixed sleep between a bounded number of attempts
//! - **Protocol-neutral**: HTTP and mounted remote filesystems share one engine
//!   through the [`ByteSource`] trait
//! - **Independent verification**: sizes and checksums are recomputed from disk

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{
    BatchOptions, BatchStats, DirEntry, FileStatus, Manifest, ManifestEntry, ManifestSlot, Progress,
    TransferOptions, TransferOutcome, VerificationOutcome, VerificationReport,
    VerificationResult, VerificationStats,
};
pub use effects::{
    BatchRunner, BoxStream, ByteSource, HttpSource, MountSource, OpenedSource, ProgressHub,
    ProgressWriter, SourceRouter, Transfer, verify,
};
pub use error::{BatchError, FetchError, Result};

pub use odc_verify::Checksum;

pub use tokio_util::sync::CancellationToken;
