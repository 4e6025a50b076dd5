use std::path::{Component, Path, PathBuf};

use crate::TransferError;

/// Validates that `name` is a bare file name safe to create in a download
/// directory.
///
/// Rejects:
/// - Empty names
/// - Names containing `/` or `\`
/// - `.` and `..`
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidName("empty name".into()));
    }
    if name.contains(['/', '\\']) {
        return Err(TransferError::InvalidName(format!(
            "path separators not allowed: {name}"
        )));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(TransferError::InvalidName(format!(
            "not a plain file name: {name}"
        ))),
    }
}

/// Whether a local path is a single file or a directory to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Directory,
}

/// A local path resolved before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub path: PathBuf,
    /// Base file name used on the remote side.
    pub name: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    pub kind: TargetKind,
}

impl TransferTarget {
    /// Stats `path` and classifies it.
    ///
    /// Anything other than a regular file or a directory (sockets, devices,
    /// dangling links) is rejected.
    pub async fn resolve(path: &Path) -> Result<Self, TransferError> {
        let metadata = tokio::fs::metadata(path).await?;
        let kind = if metadata.is_file() {
            TargetKind::File
        } else if metadata.is_dir() {
            TargetKind::Directory
        } else {
            return Err(TransferError::NotFileOrDirectory(path.to_path_buf()));
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: if kind == TargetKind::File {
                metadata.len()
            } else {
                0
            },
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(validate_file_name("").is_err());
    }

    #[test]
    fn rejects_parent_dir() {
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("../etc/passwd").is_err());
    }

    #[test]
    fn rejects_current_dir() {
        assert!(validate_file_name(".").is_err());
    }

    #[test]
    fn rejects_separators() {
        assert!(validate_file_name("sub/file.enc").is_err());
        assert!(validate_file_name("sub\\file.enc").is_err());
        assert!(validate_file_name("/tmp/file.enc").is_err());
    }

    #[test]
    fn accepts_plain_names() {
        assert!(validate_file_name("sample.txt.enc").is_ok());
        assert!(validate_file_name(".hidden.enc").is_ok());
    }

    #[tokio::test]
    async fn resolves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.enc");
        std::fs::write(&path, b"12345").unwrap();

        let target = TransferTarget::resolve(&path).await.unwrap();
        assert_eq!(target.kind, TargetKind::File);
        assert_eq!(target.name, "a.enc");
        assert_eq!(target.size, 5);
    }

    #[tokio::test]
    async fn resolves_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = TransferTarget::resolve(dir.path()).await.unwrap();
        assert_eq!(target.kind, TargetKind::Directory);
        assert_eq!(target.size, 0);
    }

    #[tokio::test]
    async fn missing_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TransferTarget::resolve(&dir.path().join("nope")).await;
        assert!(matches!(result, Err(TransferError::Io(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rejects_special_files() {
        let result = TransferTarget::resolve(Path::new("/dev/null")).await;
        assert!(matches!(result, Err(TransferError::NotFileOrDirectory(_))));
    }
}
