//! Upload and download flows against the submission service.
//!
//! This crate holds the **business logic**; the network and the remote
//! listings come in through the [`Transport`](sealpost_http::Transport)
//! and [`Inventory`] traits so every flow is testable with mocks.
//!
//! # Upload pipeline
//!
//! 1. **Resolve**: classify the path; directories recurse child by child
//! 2. **Resume lookup**: optional, picks the server's last acknowledged chunk
//! 3. **Duplicate check**: refuse names already present in the inbox
//! 4. **Container check**: peek the Crypt4GH header, seek back
//! 5. **Chunks**: MD5 per chunk, sent one at a time, fail-fast
//! 6. **Finalize**: SHA-256 and declared size, exactly once

pub mod error;
pub mod inventory;
pub mod orchestrator;
pub mod settings;
pub mod strategy;
pub mod uploader;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience.
pub use error::StreamError;
pub use inventory::{HttpInventory, Inventory};
pub use orchestrator::Streamer;
pub use settings::StreamSettings;
pub use strategy::{ChunkRequest, DirectUpload, FinalizeRequest, ProxiedUpload, UploadStrategy};
pub use uploader::ChunkUploader;
