//! Device abstraction used by the lifecycle manager
//!
//! [`DeviceProvider`] acquires a device asynchronously; [`KernelDevice`] is the
//! acquired context (device, queue, pipeline, parameter buffer and its binding
//! as one object). Releasing a device is dropping it.
//!
//! The wgpu implementation lives in [`crate::gpu`]; tests drive the manager
//! with instrumented stubs.

use crate::error::{FrameError, InitError};
use crate::shader::Diagnostic;
use accretion_core::ParameterBlock;
use std::future::Future;

/// Size of the render surface as the host sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    pub logical_width: f64,
    pub logical_height: f64,
    /// Device pixels per logical pixel
    pub scale_factor: f64,
}

impl SurfaceMetrics {
    pub fn new(logical_width: f64, logical_height: f64, scale_factor: f64) -> Self {
        Self {
            logical_width,
            logical_height,
            scale_factor,
        }
    }

    /// Metrics for a target that is already measured in device pixels
    pub fn physical(width: u32, height: u32) -> Self {
        Self::new(f64::from(width), f64::from(height), 1.0)
    }

    /// Physical pixel dimensions, never smaller than 1x1
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = if self.scale_factor.is_finite() && self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        let to_pixels = |logical: f64| {
            let pixels = (logical * scale).round();
            if pixels.is_finite() {
                pixels.clamp(1.0, f64::from(u32::MAX)) as u32
            } else {
                1
            }
        };
        (to_pixels(self.logical_width), to_pixels(self.logical_height))
    }
}

/// Source of devices
pub trait DeviceProvider {
    type Device: KernelDevice;

    /// Find an adapter and request a device from it
    fn acquire(&mut self) -> impl Future<Output = Result<Self::Device, InitError>>;
}

/// An acquired device able to run the raymarching kernel
pub trait KernelDevice {
    /// Compile the kernel and return every diagnostic the compiler produced
    fn compile_kernel(&mut self, source: &str) -> impl Future<Output = Vec<Diagnostic>>;

    /// Allocate the parameter buffer of `block_size` bytes, its binding and
    /// the pipeline built from the compiled kernel
    fn create_resources(&mut self, block_size: u64) -> Result<(), InitError>;

    /// Resize the output to `width` x `height` device pixels
    fn resize(&mut self, width: u32, height: u32);

    /// Upload `block`, dispatch the kernel over every output pixel and present
    fn submit_frame(&mut self, block: &ParameterBlock) -> Result<(), FrameError>;

    /// Whether the device reported itself lost
    fn is_lost(&self) -> bool;
}
