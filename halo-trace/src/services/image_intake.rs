//! Image intake
//!
//! Accepts a user-supplied image, sniffs its content type and builds the
//! data URL preview. The only hard rule is that the file is readable and
//! non-empty. Type and size limits are advisory: they are reported and
//! logged, and the extraction endpoint has the final word.

use base64::{engine::general_purpose, Engine as _};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Upload size shown to users as the supported maximum
pub const ADVISED_MAX_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Content types shown to users as supported (PNG, JPG, JPEG)
pub const SUPPORTED_CONTENT_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Image intake errors
#[derive(Debug, Error)]
pub enum IntakeError {
    /// File has no content
    #[error("Image file is empty: {0}")]
    Empty(String),

    /// File could not be read from disk
    #[error("Cannot read image {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-blocking upload hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeAdvisory {
    /// Content does not look like an image at all
    NotAnImage { content_type: String },
    /// Image type outside the advertised PNG/JPEG set
    UnsupportedType { content_type: String },
    /// Larger than the advertised maximum
    TooLarge { size: usize, limit: usize },
}

impl fmt::Display for IntakeAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeAdvisory::NotAnImage { content_type } => {
                write!(f, "file does not look like an image ({})", content_type)
            }
            IntakeAdvisory::UnsupportedType { content_type } => {
                write!(f, "{} is not one of the supported types (PNG, JPG, JPEG)", content_type)
            }
            IntakeAdvisory::TooLarge { size, limit } => write!(
                f,
                "image is {:.1} MB, larger than the supported {} MB",
                *size as f64 / (1024.0 * 1024.0),
                limit / (1024 * 1024)
            ),
        }
    }
}

/// An accepted image, cheap to clone
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    file_name: String,
    bytes: Arc<[u8]>,
    content_type: String,
}

impl ImageFile {
    /// Accept in-memory image content
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<Self, IntakeError> {
        let file_name = file_name.into();
        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(IntakeError::Empty(file_name));
        }
        let content_type = detect_content_type(&file_name, &bytes);
        Ok(Self {
            file_name,
            bytes: Arc::from(bytes),
            content_type,
        })
    }

    /// Read and accept an image from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, IntakeError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| IntakeError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self::new(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for an accepted image
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Sniffed MIME type, falling back to the file extension
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Upload hints for this file (never enforced)
    pub fn advisories(&self) -> Vec<IntakeAdvisory> {
        let mut advisories = Vec::new();

        if !self.content_type.starts_with("image/") {
            advisories.push(IntakeAdvisory::NotAnImage {
                content_type: self.content_type.clone(),
            });
        } else if !SUPPORTED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            advisories.push(IntakeAdvisory::UnsupportedType {
                content_type: self.content_type.clone(),
            });
        }

        if self.bytes.len() > ADVISED_MAX_SIZE_BYTES {
            advisories.push(IntakeAdvisory::TooLarge {
                size: self.bytes.len(),
                limit: ADVISED_MAX_SIZE_BYTES,
            });
        }

        advisories
    }

    /// `data:<mime>;base64,<payload>` preview of the image
    pub fn preview_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn detect_content_type(file_name: &str, bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    let extension = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    let by_extension = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => FALLBACK_CONTENT_TYPE,
    };
    by_extension.to_string()
}
