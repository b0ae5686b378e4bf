use super::{CaptureError, CaptureSource, CapturedImage, MAX_UPLOAD_BYTES};
use std::fs;
use std::path::{Path, PathBuf};

/// Image picked from disk
pub struct FileUpload {
    path: PathBuf,
}

impl FileUpload {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CaptureSource for FileUpload {
    fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());

        // Check the type before reading so a stray video is not pulled into memory
        let mime = mime_guess::from_path(&self.path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            tracing::warn!("Rejected {} ({})", self.path.display(), mime);
            return Err(CaptureError::NotAnImage {
                file_name,
                mime: mime.essence_str().to_string(),
            });
        }

        let size = fs::metadata(&self.path)?.len() as usize;
        if size > MAX_UPLOAD_BYTES {
            return Err(CaptureError::TooLarge { file_name, size });
        }

        tracing::info!("Loading {}", self.path.display());
        let bytes = fs::read(&self.path)?;
        CapturedImage::from_upload(bytes, &file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::captured::tests::png_bytes;

    #[test]
    fn loads_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tomate.png");
        fs::write(&path, png_bytes(20, 10)).unwrap();

        let image = FileUpload::new(&path).capture().unwrap();
        assert_eq!(image.file_name(), "tomate.png");
        assert_eq!(image.dimensions(), (20, 10));
    }

    #[test]
    fn rejects_non_image_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();

        let err = FileUpload::new(&path).capture().unwrap_err();
        assert!(matches!(err, CaptureError::NotAnImage { ref mime, .. } if mime == "video/mp4"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileUpload::new(dir.path().join("missing.jpg")).capture().unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
    }
}
