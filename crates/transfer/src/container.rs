//! Crypt4GH envelope header check.
//!
//! # Header layout
//!
//! ```text
//! [8 bytes: "crypt4gh"]
//! [4 bytes LE: version, must be 1]
//! [4 bytes LE: header packet count]
//! PER PACKET:
//!   [4 bytes LE: packet length, including these 4 bytes]
//!   [4 bytes LE: encryption method, 0 = X25519 + ChaCha20-IETF-Poly1305]
//!   [packet length - 8 bytes: writer key, nonce, encrypted payload, MAC]
//! ```
//!
//! Only the framing is checked. Packets are never decrypted.

use std::io::SeekFrom;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// File magic.
pub const MAGIC: &[u8; 8] = b"crypt4gh";

/// The only header version in use.
pub const VERSION: u32 = 1;

/// Length prefix + method + writer public key + nonce + MAC.
const MIN_PACKET_LEN: u32 = 4 + 4 + 32 + 12 + 16;

const X25519_CHACHA20_IETF_POLY1305: u32 = 0;

/// Reasons a file is rejected as a Crypt4GH container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("not a Crypt4GH file")]
    NotCrypt4gh,

    #[error("unsupported Crypt4GH version {0}")]
    UnsupportedVersion(u32),

    #[error("Crypt4GH header has no packets")]
    NoPackets,

    #[error("Crypt4GH header packet {index} is malformed")]
    MalformedPacket { index: u32 },

    #[error("Crypt4GH header packet {index} uses unsupported encryption method {method}")]
    UnsupportedMethod { index: u32, method: u32 },

    #[error("truncated Crypt4GH header")]
    Truncated,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a parsed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u32,
    pub packet_count: u32,
    /// Total header length in bytes; the encrypted data blocks start here.
    pub header_len: u64,
}

/// Parses the Crypt4GH header at the reader's current position, then seeks
/// back to that position.
///
/// The handle is left where it was on success, so the caller owns the
/// decision of where to start reading.
pub async fn peek_header<R>(reader: &mut R) -> Result<ContainerHeader, ContainerError>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    let start = reader.stream_position().await?;
    let header = read_header(reader).await?;
    reader.seek(SeekFrom::Start(start)).await?;
    Ok(header)
}

async fn read_header<R>(reader: &mut R) -> Result<ContainerHeader, ContainerError>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    let mut magic = [0u8; 8];
    read_exact(reader, &mut magic)
        .await
        .map_err(|e| match e {
            ContainerError::Truncated => ContainerError::NotCrypt4gh,
            other => other,
        })?;
    if &magic != MAGIC {
        return Err(ContainerError::NotCrypt4gh);
    }

    let version = read_u32_le(reader).await?;
    if version != VERSION {
        return Err(ContainerError::UnsupportedVersion(version));
    }

    let packet_count = read_u32_le(reader).await?;
    if packet_count == 0 {
        return Err(ContainerError::NoPackets);
    }

    let mut header_len: u64 = 16;
    for index in 0..packet_count {
        let packet_len = read_u32_le(reader).await?;
        if packet_len < MIN_PACKET_LEN {
            return Err(ContainerError::MalformedPacket { index });
        }
        let method = read_u32_le(reader).await?;
        if method != X25519_CHACHA20_IETF_POLY1305 {
            return Err(ContainerError::UnsupportedMethod { index, method });
        }

        let rest = u64::from(packet_len - 8);
        let skipped = tokio::io::copy(&mut (&mut *reader).take(rest), &mut tokio::io::sink()).await?;
        if skipped != rest {
            return Err(ContainerError::Truncated);
        }
        header_len += u64::from(packet_len);
    }

    Ok(ContainerHeader {
        version,
        packet_count,
        header_len,
    })
}

async fn read_u32_le<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32, ContainerError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf).await?;
    Ok(u32::from_le_bytes(buf))
}

async fn read_exact<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), ContainerError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(ContainerError::Truncated),
        Err(e) => Err(ContainerError::Io(e)),
    }
}
