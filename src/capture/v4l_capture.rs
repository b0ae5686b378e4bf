use super::camera::{CameraDevice, Facing};
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

/// Webcam opened through nokhwa, one device index per facing
pub struct WebcamDevice {
    back_index: u32,
    front_index: u32,
    camera: Option<Camera>,
}

impl WebcamDevice {
    pub fn new(back_index: u32, front_index: u32) -> Self {
        Self {
            back_index,
            front_index,
            camera: None,
        }
    }

    fn index_for(&self, facing: Facing) -> u32 {
        match facing {
            Facing::Back => self.back_index,
            Facing::Front => self.front_index,
        }
    }
}

impl CameraDevice for WebcamDevice {
    fn open(&mut self, facing: Facing) -> Result<()> {
        self.stop();

        let device_index = self.index_for(facing);
        tracing::info!("Opening webcam {} ({:?})", device_index, facing);

        let index = CameraIndex::Index(device_index);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(index, requested)
            .context("Failed to open camera")?;

        camera.open_stream()
            .context("Failed to open camera stream")?;

        let resolution = camera.resolution();
        tracing::info!("Webcam streaming at {}x{}", resolution.width(), resolution.height());

        self.camera = Some(camera);
        Ok(())
    }

    fn frame(&mut self) -> Result<RgbImage> {
        let camera = self
            .camera
            .as_mut()
            .context("Camera stream is not open")?;

        let frame = camera
            .frame()
            .context("Failed to capture frame")?;

        let decoded = frame.decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
            .context("Decoded frame has an unexpected buffer size")
    }

    fn stop(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(err) = camera.stop_stream() {
                tracing::warn!("Failed to stop camera stream: {}", err);
            }
            tracing::debug!("Webcam stream released");
        }
    }
}
