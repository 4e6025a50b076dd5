//! Chunked upload primitives with resume support and progress tracking.
//!
//! Everything here is transport-agnostic: reading a seekable handle in
//! fixed-size chunks, computing the MD5/SHA-256 digests the service asks
//! for, peeking the Crypt4GH envelope header, and tracking per-file
//! progress.

mod chunked;
mod container;
mod progress;
mod types;
mod validation;

use std::path::PathBuf;

pub use chunked::{Chunk, ChunkReader, md5_hex, sha256_hex};
pub use container::{ContainerError, ContainerHeader, MAGIC, VERSION, peek_header};
pub use progress::{ProgressCallback, ProgressTracker, ProgressUpdate, SpeedCalculator, TransferProgress};
pub use types::UploadSession;
pub use validation::{TargetKind, TransferTarget, validate_file_name};

/// Default chunk size: 50 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 50 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}: neither a regular file nor a directory", .0.display())]
    NotFileOrDirectory(PathBuf),

    #[error("invalid file name: {0}")]
    InvalidName(String),
}
