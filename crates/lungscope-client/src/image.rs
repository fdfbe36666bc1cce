use std::path::Path;

use crate::error::InferenceError;

/// A user-selected image file, held in memory for the length of one prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    bytes: Vec<u8>,
    filename: String,
    mime_type: String,
}

impl ImageBlob {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, InferenceError> {
        let bytes = bytes.into();
        let filename = filename.into();
        if bytes.is_empty() {
            return Err(InferenceError::Input(format!("Image `{filename}` is empty.")));
        }
        Ok(Self {
            bytes,
            filename,
            mime_type: mime_type.into(),
        })
    }

    /// Reads an image from disk, guessing the MIME type from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            InferenceError::Input(format!("Could not read image {}: {e}", path.display()))
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime_type = mime_from_extension(path);
        Self::new(bytes, filename, mime_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Multipart part carrying this image under its original name and type.
    pub(crate) fn to_part(&self) -> Result<reqwest::blocking::multipart::Part, InferenceError> {
        reqwest::blocking::multipart::Part::bytes(self.bytes.clone())
            .file_name(self.filename.clone())
            .mime_str(&self.mime_type)
            .map_err(|e| {
                InferenceError::Input(format!("Invalid MIME type `{}`: {e}", self.mime_type))
            })
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
