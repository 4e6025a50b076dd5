use serde::{Deserialize, Serialize};

/// Body returned by `GET /gettoken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEnvelope {
    pub token: String,
}

/// Body returned for every accepted chunk.
///
/// `id` is the upload-session identifier the server correlates later
/// requests with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkAck {
    pub id: String,
}
