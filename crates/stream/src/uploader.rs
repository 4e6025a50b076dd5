//! Per-file upload: duplicate check, container check, chunk loop, finalize.

use sealpost_transfer::{ChunkReader, ProgressTracker, UploadSession, peek_header};
use tokio::io::{AsyncRead, AsyncSeek};
use tracing::{debug, info, warn};

use crate::strategy::{ChunkRequest, FinalizeRequest, UploadStrategy};
use crate::{Inventory, StreamError};

/// Drives one file through a chosen [`UploadStrategy`].
///
/// Chunks are sent strictly in order and the first failure aborts the
/// file; there are no retries.
pub struct ChunkUploader<'a> {
    inventory: &'a dyn Inventory,
    strategy: &'a dyn UploadStrategy,
    progress: &'a ProgressTracker,
    chunk_size: usize,
}

impl<'a> ChunkUploader<'a> {
    pub fn new(
        inventory: &'a dyn Inventory,
        strategy: &'a dyn UploadStrategy,
        progress: &'a ProgressTracker,
        chunk_size: usize,
    ) -> Self {
        Self {
            inventory,
            strategy,
            progress,
            chunk_size,
        }
    }

    /// Uploads `reader` as `file_name`.
    ///
    /// `display` names the local file in errors, `size` is the declared
    /// total size and `session` carries any resumed state.
    pub async fn upload<R>(
        &self,
        file_name: &str,
        display: &str,
        mut reader: R,
        size: u64,
        mut session: UploadSession,
    ) -> Result<(), StreamError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let inbox = self.inventory.list_files(true).await?;
        if let Some(remote) = inbox.iter().find(|f| f.base_name() == file_name) {
            return Err(StreamError::AlreadyUploaded {
                file: display.to_string(),
                remote: remote.base_name().to_string(),
            });
        }

        let header = peek_header(&mut reader)
            .await
            .map_err(|source| StreamError::InvalidContainer {
                file: display.to_string(),
                source,
            })?;
        debug!(file = %file_name, packets = header.packet_count, "container header ok");

        let mut chunks = ChunkReader::new(reader, self.chunk_size);
        chunks.seek_to(session.byte_offset()).await?;
        info!(
            file = %file_name,
            size,
            chunk = session.next_chunk(),
            offset = session.byte_offset(),
            "uploading"
        );

        let mut progress = self.progress.begin(file_name, size, session.byte_offset());
        while let Some(chunk) = chunks.next_chunk().await? {
            let index = session.next_chunk();
            let bytes = chunk.len() as u64;
            debug!(file = %file_name, chunk = index, bytes, md5 = %chunk.md5, "sending chunk");

            let request = ChunkRequest {
                index,
                md5: chunk.md5,
                data: chunk.data,
            };
            let ack = self
                .strategy
                .upload_chunk(file_name, request, session.upload_id())
                .await?;
            if !session.accept(&ack.id, bytes) {
                warn!(
                    file = %file_name,
                    expected = session.upload_id().unwrap_or_default(),
                    got = %ack.id,
                    "server acknowledged chunk with a different upload id, keeping ours"
                );
            }
            progress.advance(bytes);
        }

        let sha256 = chunks.digest_remaining().await?;
        let Some(upload_id) = session.upload_id() else {
            return Err(StreamError::MissingUploadId(file_name.to_string()));
        };
        info!(file = %file_name, upload_id = %upload_id, "assembling upload");
        self.strategy
            .finalize(
                file_name,
                FinalizeRequest {
                    upload_id,
                    file_size: size,
                    sha256: &sha256,
                },
            )
            .await?;

        progress.finish();
        info!(file = %file_name, "upload complete");
        Ok(())
    }
}
