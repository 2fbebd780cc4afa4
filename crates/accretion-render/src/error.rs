//! Error types for the device lifecycle and frame submission

use thiserror::Error;

/// Failures while bringing up the device and kernel pipeline
///
/// All of these are fatal to startup: the host should report the message and
/// not attempt to render.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The host exposes no graphics API the renderer can use
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    /// A graphics API is available but enumeration found no usable adapter
    #[error("No suitable graphics adapter found")]
    NoAdapter,

    /// An adapter was found but refused the device request
    #[error("Device request failed: {0}")]
    DeviceRequest(String),

    /// The kernel program failed to compile; one entry per error diagnostic
    #[error("Kernel failed to compile:\n{}", .0.join("\n"))]
    ShaderCompile(Vec<String>),

    /// `initialize` was called on a manager that is not uninitialized
    #[error("Device manager cannot initialize while {0}")]
    InvalidState(&'static str),
}

/// Per-frame conditions reported by a device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The frame was dropped (surface timeout, outdated surface, not ready)
    #[error("Frame skipped: {0}")]
    Skipped(String),

    /// The device is gone; rendering cannot continue
    #[error("Device lost: {0}")]
    DeviceLost(String),
}

/// Failures of one-shot offscreen rendering
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Initialization was aborted by a destroy request
    #[error("Rendering was cancelled before the device became ready")]
    Cancelled,

    /// The output size is unusable
    #[error("Invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    /// Copying the rendered frame back to host memory failed
    #[error("Readback failed: {0}")]
    Readback(String),
}
