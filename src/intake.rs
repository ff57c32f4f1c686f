//! Uploaded statement files and the sources handed to the parsers.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{EkstreError, Result};
use crate::importer::{BankFormat, SourceKind, StatementSource};

pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("statement")
            .to_string();
        Ok(Self { file_name, bytes })
    }

    /// Hex SHA-256 of the file contents.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
    }
}

/// A copy of an upload on disk, removed when dropped.
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    pub fn stage(upload: &Upload, dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let suffix = upload
            .extension()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(&upload.bytes)?;
        file.flush()?;
        tracing::debug!(path = %file.path().display(), bytes = upload.bytes.len(), "staged upload");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Run `f` with the source `format` reads from.
///
/// Path formats get a staged copy inside `upload_dir`, which is deleted
/// once `f` returns, whether or not it succeeded.
pub fn with_source<T>(
    upload: &Upload,
    format: BankFormat,
    upload_dir: &Path,
    f: impl FnOnce(StatementSource<'_>) -> Result<T>,
) -> Result<T> {
    match format.source_kind() {
        SourceKind::Path => {
            let staged = StagedUpload::stage(upload, upload_dir)?;
            let result = f(StatementSource::Path(staged.path()));
            let path: PathBuf = staged.path().to_path_buf();
            if let Err(e) = staged.file.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove staged upload");
            }
            result
        }
        SourceKind::Stream => f(StatementSource::Stream(Box::new(Cursor::new(
            upload.bytes.as_slice(),
        )))),
    }
}

pub fn check_extension(upload: &Upload, format: BankFormat) -> Result<()> {
    match upload.extension() {
        Some(ext) if ext.eq_ignore_ascii_case(format.file_type()) => Ok(()),
        _ => Err(EkstreError::Other(format!(
            "{} statements must be .{} files, got {}",
            format.name(),
            format.file_type(),
            upload.file_name
        ))),
    }
}
