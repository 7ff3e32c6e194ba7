//! Selected image handling: reading the file, the data-URL preview and the
//! info line shown under it.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

use crate::error::Result;
use crate::validation::{format_file_size, validate_file};

/// A file the user picked or dropped, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Reads a file from disk. The MIME type comes from the extension, the
    /// same way a browser fills in `File.type`.
    ///
    /// Type and size are known from metadata alone, so a file that will be
    /// rejected is never loaded: its candidate carries the size but no bytes.
    pub async fn read(path: &Path) -> Result<Self> {
        let size = tokio::fs::metadata(path).await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_from_extension(path).unwrap_or_default().to_string();

        let bytes = match validate_file(&mime, size) {
            Ok(()) => tokio::fs::read(path).await?,
            Err(e) => {
                tracing::debug!("Not loading {}: {:?}", name, e);
                Vec::new()
            }
        };

        Ok(Self {
            name,
            mime,
            size,
            bytes,
        })
    }
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime)
}

/// The accepted image. Lives only in memory.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub file: FileCandidate,
    pub data_url: String,
    /// `None` when the bytes do not decode as an image.
    pub dimensions: Option<(u32, u32)>,
}

impl SelectedImage {
    pub fn from_candidate(file: FileCandidate) -> Self {
        let data_url = data_url(&file.mime, &file.bytes);
        let dimensions = image::io::Reader::new(Cursor::new(&file.bytes))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());

        if dimensions.is_none() {
            tracing::debug!("Could not read dimensions of {}", file.name);
        }

        Self {
            file,
            data_url,
            dimensions,
        }
    }

    /// `640x480 • 1.5 KB`
    pub fn info(&self) -> String {
        let size = format_file_size(self.file.size);
        match self.dimensions {
            Some((w, h)) => format!("{}x{} • {}", w, h, size),
            None => size,
        }
    }
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(bytes)
    )
}
