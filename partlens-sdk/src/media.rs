// ABOUTME: Source file and encoded image types shared by the ingestion pipeline
// ABOUTME: Handles data URI construction, parsing and payload size estimation

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{PartlensError, Result};

#[derive(Debug, Clone)]
enum FileData {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

/// A user-selected image, read by the pipeline but never modified.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub byte_size: u64,
    data: FileData,
}

impl SourceFile {
    /// Describe a file on disk. The mime type is guessed from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            PartlensError::Validation(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            mime_type: guess_mime_type(path).to_string(),
            byte_size: metadata.len(),
            data: FileData::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            byte_size: bytes.len() as u64,
            data: FileData::Memory(bytes),
        }
    }

    /// Read the file contents without blocking the runtime.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.data {
            FileData::Path(path) => tokio::fs::read(path).await,
            FileData::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// Read the file contents on the current thread.
    pub fn read_blocking(&self) -> std::io::Result<Vec<u8>> {
        match &self.data {
            FileData::Path(path) => std::fs::read(path),
            FileData::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// An image in its API-ready form. `data_uri` is `None` only while staged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub index: usize,
    pub name: String,
    pub mime_type: String,
    pub data_uri: Option<String>,
}

impl EncodedImage {
    /// Placeholder for a file whose encoding has not completed yet.
    pub fn pending(index: usize, file: &SourceFile) -> Self {
        Self {
            index,
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            data_uri: None,
        }
    }

    /// Encode raw file bytes. Both ingestion strategies go through here so
    /// their output is identical for the same input.
    pub fn from_bytes(index: usize, file: &SourceFile, bytes: &[u8]) -> Self {
        let mut image = Self::pending(index, file);
        image.attach(bytes);
        image
    }

    /// Complete a staged image with the file's raw bytes.
    pub fn attach(&mut self, bytes: &[u8]) {
        self.data_uri = Some(to_data_uri(&self.mime_type, bytes));
    }

    /// Estimated size of the decoded payload in bytes.
    pub fn byte_size(&self) -> usize {
        self.data_uri
            .as_deref()
            .map(estimate_base64_size)
            .unwrap_or(0)
    }
}

pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Split a base64 data URI into its mime type and payload.
pub fn parse_data_uri(data_uri: &str) -> Option<(&str, &str)> {
    let rest = data_uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    Some((mime_type, payload))
}

pub fn decode_data_uri(data_uri: &str) -> Option<Vec<u8>> {
    let (_, payload) = parse_data_uri(data_uri)?;
    STANDARD.decode(payload).ok()
}

/// Bytes represented by the base64 payload of a data URI (4 chars encode 3 bytes).
pub fn estimate_base64_size(data_uri: &str) -> usize {
    let payload = data_uri.split_once(',').map(|(_, p)| p).unwrap_or("");
    (payload.len() * 3).div_ceil(4)
}

pub fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
