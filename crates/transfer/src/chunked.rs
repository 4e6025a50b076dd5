use std::io::SeekFrom;

use md5::Md5;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::{DEFAULT_CHUNK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// Digest helpers
// ---------------------------------------------------------------------------

/// Computes MD5 of `data` and returns the hex-encoded digest.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// A chunk of file data ready to be sent.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
    /// MD5 hex digest of `data`.
    pub md5: String,
}

impl Chunk {
    /// Size of this chunk in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads a seekable handle in fixed-size chunks with MD5 digests.
///
/// Every chunk except the last is exactly `chunk_size` bytes, regardless
/// of how the underlying reader splits its reads.
pub struct ChunkReader<R> {
    inner: R,
    chunk_size: usize,
    offset: u64,
}

impl<R: AsyncRead + AsyncSeek + Unpin> ChunkReader<R> {
    /// Wraps `inner`, assuming it is positioned at offset 0.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(inner: R, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            inner,
            chunk_size,
            offset: 0,
        }
    }

    /// Seeks to the given byte offset (for resume).
    pub async fn seek_to(&mut self, offset: u64) -> Result<(), TransferError> {
        self.offset = self.inner.seek(SeekFrom::Start(offset)).await?;
        Ok(())
    }

    /// Reads the next chunk. Returns `None` at end of stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let chunk = Chunk {
            offset: self.offset,
            md5: md5_hex(&buf),
            data: buf,
        };
        self.offset += filled as u64;
        Ok(Some(chunk))
    }

    /// SHA-256 over everything from the current position to end of stream.
    ///
    /// Consumes the remainder; once the chunk loop has drained the reader
    /// this is the digest of zero bytes.
    pub async fn digest_remaining(&mut self) -> Result<String, TransferError> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = self.inner.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            self.offset += n as u64;
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Configured chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Gives the handle back.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
