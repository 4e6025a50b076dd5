use std::path::PathBuf;

use sealpost_transfer::DEFAULT_CHUNK_SIZE;

/// Endpoint and sizing values the flows need, built once by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Proxy base URL, without a trailing slash.
    pub instance_url: String,
    /// Direct-mode base URL (`{base}/v1/{project}/ega`), without a trailing slash.
    pub tsd_url: String,
    /// Upload chunk size in bytes.
    pub chunk_size: usize,
    /// Where downloads are written.
    pub download_dir: PathBuf,
}

impl StreamSettings {
    pub fn new(instance_url: &str, tsd_url: &str) -> Self {
        Self {
            instance_url: trim_url(instance_url),
            tsd_url: trim_url(tsd_url),
            chunk_size: DEFAULT_CHUNK_SIZE,
            download_dir: PathBuf::from("."),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
