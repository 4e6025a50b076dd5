/// State of one upload call, created and dropped within it.
///
/// The chunk index only moves forward and the upload id, once assigned by
/// the first acknowledgement, never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    upload_id: Option<String>,
    next_chunk: u64,
    byte_offset: u64,
}

impl UploadSession {
    /// A session for a file the server has never seen.
    pub fn fresh() -> Self {
        Self {
            upload_id: None,
            next_chunk: 1,
            byte_offset: 0,
        }
    }

    /// A session continuing a server-side resumable record.
    ///
    /// A chunk index of 0 is clamped to 1.
    pub fn resume(upload_id: impl Into<String>, byte_offset: u64, next_chunk: u64) -> Self {
        Self {
            upload_id: Some(upload_id.into()),
            next_chunk: next_chunk.max(1),
            byte_offset,
        }
    }

    /// Records an accepted chunk of `bytes` acknowledged with `ack_id`.
    ///
    /// Returns `false` if an id was already held and `ack_id` differs from
    /// it; the held id is kept either way.
    pub fn accept(&mut self, ack_id: &str, bytes: u64) -> bool {
        self.next_chunk += 1;
        self.byte_offset += bytes;
        match &self.upload_id {
            Some(id) => id == ack_id,
            None => {
                self.upload_id = Some(ack_id.to_string());
                true
            }
        }
    }

    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Index of the next chunk to send.
    pub fn next_chunk(&self) -> u64 {
        self.next_chunk
    }

    /// Bytes accepted so far, including any resumed prefix.
    pub fn byte_offset(&self) -> u64 {
        self.byte_offset
    }
}
