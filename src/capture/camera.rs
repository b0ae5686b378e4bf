use super::{CaptureError, CaptureSource, CapturedImage};
use anyhow::Result;
use clap::ValueEnum;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::time::{SystemTime, UNIX_EPOCH};

/// Shown inline when the device cannot be opened; `start` may be retried
pub const CAMERA_UNAVAILABLE: &str = "Could not access the camera. Check permissions.";

pub const JPEG_QUALITY: u8 = 90;

/// Which physical camera to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Facing {
    /// Rear camera, pointed at the tomato
    #[default]
    Back,
    /// Selfie camera
    Front,
}

impl Facing {
    pub fn toggled(self) -> Self {
        match self {
            Facing::Back => Facing::Front,
            Facing::Front => Facing::Back,
        }
    }
}

/// Trait for camera hardware
///
/// The device is an exclusively held resource: `open` acquires a stream,
/// `stop` must release it and be safe to call when nothing is open.
pub trait CameraDevice {
    fn open(&mut self, facing: Facing) -> Result<()>;

    /// Grab the next frame from the open stream
    fn frame(&mut self) -> Result<RgbImage>;

    fn stop(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraState {
    Idle,
    Live,
    /// Still taken, stream released, waiting for confirm or retake
    Captured(CapturedImage),
    /// Device could not be opened; holds the message to show
    Failed(String),
}

/// Live camera with a take / retake / confirm flow
pub struct CameraSession<D: CameraDevice> {
    device: D,
    facing: Facing,
    state: CameraState,
    warmup_frames: usize,
}

impl<D: CameraDevice> CameraSession<D> {
    pub fn new(device: D, facing: Facing) -> Self {
        Self {
            device,
            facing,
            state: CameraState::Idle,
            warmup_frames: 0,
        }
    }

    /// Discard this many frames before each still while exposure settles
    pub fn with_warmup(mut self, frames: usize) -> Self {
        self.warmup_frames = frames;
        self
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == CameraState::Live
    }

    /// Inline error message, if the last start failed
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            CameraState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Open the stream for the current facing, releasing any previous one
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.release();

        match self.device.open(self.facing) {
            Ok(()) => {
                tracing::info!("Camera streaming ({:?})", self.facing);
                self.state = CameraState::Live;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Failed to open camera: {:#}", err);
                self.state = CameraState::Failed(CAMERA_UNAVAILABLE.to_string());
                Err(CaptureError::Device(CAMERA_UNAVAILABLE.to_string()))
            }
        }
    }

    /// Flip between back and front camera and restart the stream
    pub fn switch(&mut self) -> Result<(), CaptureError> {
        self.facing = self.facing.toggled();
        tracing::debug!("Switching camera to {:?}", self.facing);
        self.start()
    }

    /// Snapshot the current frame as a JPEG still and release the stream
    pub fn take_photo(&mut self) -> Result<(), CaptureError> {
        if !self.is_streaming() {
            return Err(CaptureError::Device("camera is not streaming".to_string()));
        }

        let frame = match self.grab_frame() {
            Ok(frame) => frame,
            Err(err) => {
                self.release();
                self.state = CameraState::Idle;
                return Err(CaptureError::Device(format!("failed to capture frame: {:#}", err)));
            }
        };
        self.release();

        let photo = match encode_still(&frame, still_file_name()) {
            Ok(photo) => photo,
            Err(err) => {
                self.state = CameraState::Idle;
                return Err(err);
            }
        };

        tracing::info!("Captured {} ({}x{})", photo.file_name(), frame.width(), frame.height());
        self.state = CameraState::Captured(photo);
        Ok(())
    }

    /// The still waiting for confirmation
    pub fn photo(&self) -> Option<&CapturedImage> {
        match &self.state {
            CameraState::Captured(photo) => Some(photo),
            _ => None,
        }
    }

    /// Throw the still away and go live again
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        self.state = CameraState::Idle;
        self.start()
    }

    /// Hand out the still; `None` if no photo has been taken
    pub fn confirm(&mut self) -> Option<CapturedImage> {
        match std::mem::replace(&mut self.state, CameraState::Idle) {
            CameraState::Captured(photo) => Some(photo),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn close(&mut self) {
        self.release();
        self.state = CameraState::Idle;
        tracing::debug!("Camera closed");
    }

    fn grab_frame(&mut self) -> Result<RgbImage> {
        for _ in 0..self.warmup_frames {
            self.device.frame()?;
        }
        self.device.frame()
    }

    fn release(&mut self) {
        if self.state == CameraState::Live {
            self.device.stop();
            self.state = CameraState::Idle;
        }
    }
}

impl<D: CameraDevice> Drop for CameraSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<D: CameraDevice> CaptureSource for CameraSession<D> {
    fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
        if !self.is_streaming() {
            self.start()?;
        }
        self.take_photo()?;
        self.confirm()
            .ok_or_else(|| CaptureError::Device("no photo was taken".to_string()))
    }
}

fn encode_still(frame: &RgbImage, file_name: String) -> Result<CapturedImage, CaptureError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(frame)
        .map_err(CaptureError::Encode)?;

    CapturedImage::from_parts(jpeg, "image/jpeg".to_string(), file_name)
}

fn still_file_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("captura_{}.jpg", millis)
}
