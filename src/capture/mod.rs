pub mod camera;
mod captured;
mod upload;
#[cfg(feature = "camera")]
mod v4l_capture;

pub use camera::{CameraDevice, CameraSession, Facing};
pub use captured::{CaptureError, CapturedImage, MAX_UPLOAD_BYTES};
pub use upload::FileUpload;
#[cfg(feature = "camera")]
pub use v4l_capture::WebcamDevice;

#[cfg(test)]
pub(crate) use captured::tests::sample_image;

/// Trait for image sources
pub trait CaptureSource {
    /// Produce one image ready for analysis
    fn capture(&mut self) -> Result<CapturedImage, CaptureError>;
}
