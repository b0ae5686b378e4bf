use base64::{engine::general_purpose, Engine as _};
use image::ImageReader;
use std::io::Cursor;
use thiserror::Error;

/// Largest upload the backend accepts
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("{file_name} is not an image (detected {mime})")]
    NotAnImage { file_name: String, mime: String },

    #[error("{0} is empty")]
    Empty(String),

    #[error("{file_name} is {size} bytes, the limit is {MAX_UPLOAD_BYTES}")]
    TooLarge { file_name: String, size: usize },

    #[error("failed to decode {file_name}")]
    Decode {
        file_name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode still")]
    Encode(#[source] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Device(String),
}

/// An image held for the current analysis
///
/// Carries the raw bytes that get uploaded, a `data:` URI used wherever the
/// original has to be shown, and the natural pixel size that defines the
/// overlay coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    bytes: Vec<u8>,
    mime: String,
    file_name: String,
    preview: String,
    width: u32,
    height: u32,
}

impl CapturedImage {
    /// Accept a file coming from the picker or a drop
    ///
    /// The MIME type is guessed from the file name and must be `image/*`.
    pub fn from_upload(bytes: Vec<u8>, file_name: &str) -> Result<Self, CaptureError> {
        let mime = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        if !mime.starts_with("image/") {
            tracing::warn!("Rejected {} ({})", file_name, mime);
            return Err(CaptureError::NotAnImage {
                file_name: file_name.to_string(),
                mime,
            });
        }

        Self::from_parts(bytes, mime, file_name.to_string())
    }

    /// Build from bytes whose MIME type is already known (camera stills)
    pub fn from_parts(bytes: Vec<u8>, mime: String, file_name: String) -> Result<Self, CaptureError> {
        if bytes.is_empty() {
            return Err(CaptureError::Empty(file_name));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(CaptureError::TooLarge {
                file_name,
                size: bytes.len(),
            });
        }

        let (width, height) = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|source| CaptureError::Decode {
                file_name: file_name.clone(),
                source,
            })?;

        let preview = format!(
            "data:{};base64,{}",
            mime,
            general_purpose::STANDARD.encode(&bytes)
        );

        tracing::debug!("Accepted {} ({}, {}x{}, {} bytes)", file_name, mime, width, height, bytes.len());

        Ok(Self {
            bytes,
            mime,
            file_name,
            preview,
            width,
            height,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `data:` URI of the original image
    pub fn preview_uri(&self) -> &str {
        &self.preview
    }

    /// Natural (width, height) in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
