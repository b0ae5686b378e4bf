//! Capture tomato images, send them to the TomatoScan inference backend and
//! draw what it finds over the original picture.
//!
//! - [`capture`]: file uploads and camera stills
//! - [`analysis`]: backend result types, HTTP client and the analysis session
//! - [`overlay`]: polygon/banner scene in natural image pixels, rendered as SVG
//! - [`relay`]: pass-through HTTP service in front of the backend

pub mod analysis;
pub mod capture;
pub mod overlay;
pub mod relay;
