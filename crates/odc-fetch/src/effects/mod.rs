//! I/O for manifest transfers.
//!
//! Byte sources, the single-file transfer engine, the batch runner, progress
//! rendering and verification of files on disk. Decisions that do not need
//! I/O are delegated to [`crate::core`].

mod batch;
mod http;
mod mount;
mod progress;
mod source;
mod transfer;
mod verify;

pub use batch::BatchRunner;
pub use http::HttpSource;
pub use mount::MountSource;
pub use progress::{ProgressHub, ProgressWriter};
pub use source::{BoxStream, ByteSource, OpenedSource, SourceRouter};
pub use transfer::Transfer;
pub use verify::verify;
