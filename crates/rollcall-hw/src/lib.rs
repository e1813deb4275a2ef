//! rollcall-hw: webcam capture.
//!
//! Opens a V4L2 device, negotiates a pixel format and hands out packed RGB
//! frames. The device is released when the `Camera` is dropped.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, FrameStream, PixelFormat};
pub use frame::{Frame, FrameError};
