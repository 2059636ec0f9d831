//! The uploaded source image, fully read into memory.

use std::path::{Path, PathBuf};

use crate::error::EditError;

/// An image the user supplied for editing.
///
/// Replaced wholesale on re-upload; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    mime_type: String,
    preview: PathBuf,
}

impl UploadedImage {
    /// Build an upload from bytes already in memory.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, preview: impl Into<PathBuf>) -> Self {
        Self { bytes, mime_type: mime_type.into(), preview: preview.into() }
    }

    /// Read a file into memory and detect its MIME type.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Read`] if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self, EditError> {
        let bytes = std::fs::read(path)
            .map_err(|source| EditError::Read { path: path.to_path_buf(), source })?;
        let mime_type = detect_mime_type(&bytes, path);
        tracing::debug!(path = %path.display(), %mime_type, bytes = bytes.len(), "read upload");
        Ok(Self::new(bytes, mime_type, path))
    }

    /// Raw image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type sent alongside the bytes.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Opaque handle the display can use to show the original.
    #[must_use]
    pub fn preview(&self) -> &Path {
        &self.preview
    }
}

/// Sniff the MIME type from content, falling back to the file extension.
fn detect_mime_type(bytes: &[u8], path: &Path) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
    .to_string()
}
