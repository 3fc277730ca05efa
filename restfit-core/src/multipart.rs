//! The binary part of a multipart request.
//!
//! A multipart endpoint carries exactly one [`MultipartBody`]: a field name,
//! a file name, a MIME type, and bytes that come either from memory or from a
//! file read lazily when the request is encoded.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;

/// Default form field name for file parts.
pub const FIELD_FILE: &str = "file";

/// Default MIME type for file parts.
pub const MIME_TYPE_STREAM: &str = "application/octet-stream";

/// Part size above which a warning is logged (5 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Where the bytes of a part come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartSource {
    /// Bytes already in memory.
    Bytes(Bytes),
    /// A file, read when the bytes are requested.
    File(PathBuf),
}

/// A single multipart payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartBody {
    field: String,
    file_name: String,
    mime_type: String,
    source: PartSource,
}

impl MultipartBody {
    /// A file part with default field name and MIME type.
    ///
    /// The file name is taken from the last path component.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            field: FIELD_FILE.to_string(),
            file_name,
            mime_type: MIME_TYPE_STREAM.to_string(),
            source: PartSource::File(path),
        }
    }

    /// A file part with explicit names.
    pub fn from_file_with(
        path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        field: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            source: PartSource::File(path.into()),
        }
    }

    /// An in-memory part.
    pub fn from_bytes(
        data: impl Into<Bytes>,
        file_name: impl Into<String>,
        field: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            source: PartSource::Bytes(data.into()),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn source(&self) -> &PartSource {
        &self.source
    }

    /// Path of a file-backed part.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            PartSource::File(path) => Some(path),
            PartSource::Bytes(_) => None,
        }
    }

    /// Load the part's bytes.
    ///
    /// Files larger than `warn_above` are still read in full; a warning is
    /// logged suggesting a chunked upload.
    pub fn read_bytes(&self, warn_above: u64) -> io::Result<Bytes> {
        match &self.source {
            PartSource::Bytes(data) => Ok(data.clone()),
            PartSource::File(path) => {
                let len = std::fs::metadata(path)?.len();
                if len > warn_above {
                    tracing::warn!(
                        path = %path.display(),
                        size = len,
                        limit = warn_above,
                        "multipart file exceeds size threshold; consider uploading in chunks"
                    );
                }
                std::fs::read(path).map(Bytes::from)
            }
        }
    }
}
