use serde::{Deserialize, Serialize};

/// An entry in the inbox or outbox listing.
///
/// Owned by the service; the client only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub file_name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_date: String,
}

impl RemoteFile {
    /// Returns the last path component of `file_name`.
    ///
    /// The service may report names with a directory prefix; duplicate and
    /// outbox lookups compare base names only.
    pub fn base_name(&self) -> &str {
        base_name(&self.file_name)
    }
}

/// Body of `GET /files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

/// Server-side bookkeeping for a partially completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumableRecord {
    /// Upload-session identifier.
    pub id: String,
    #[serde(rename = "fileName")]
    pub name: String,
    /// Bytes the server has confirmed.
    #[serde(default)]
    pub size: u64,
    /// Next chunk index the server expects.
    #[serde(default = "first_chunk")]
    pub chunk: u64,
}

fn first_chunk() -> u64 {
    1
}

/// Body of `GET /resumables`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumableList {
    #[serde(default)]
    pub resumables: Vec<ResumableRecord>,
}

/// Last `/`-separated component of a remote name.
pub fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
