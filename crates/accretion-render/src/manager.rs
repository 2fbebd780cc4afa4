//! Device/pipeline lifecycle
//!
//! The manager owns the single device context and walks it through
//! `Uninitialized -> Initializing -> Ready -> Destroyed`. A destroy request
//! can arrive from another thread through a [`DestroyHandle`] while
//! [`DeviceManager::initialize`] is suspended; the manager re-checks it after
//! every await and once more before reporting ready. A device that arrives
//! after the request is dropped on the spot without any resource being
//! created on it.

use crate::device::{DeviceProvider, KernelDevice, SurfaceMetrics};
use crate::error::{FrameError, InitError};
use crate::shader::{KERNEL_SOURCE, check_diagnostics};
use accretion_core::{PARAMETER_BLOCK_SIZE, ParameterBlock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Where a [`DeviceManager`] is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

/// Result of a successful [`DeviceManager::initialize`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The device is ready to render
    Ready,
    /// A destroy request was observed; nothing was kept
    Aborted,
}

/// Shareable, thread-safe request to tear the manager down
#[derive(Debug, Clone, Default)]
pub struct DestroyHandle(Arc<AtomicBool>);

impl DestroyHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owner of the device context
pub struct DeviceManager<P: DeviceProvider> {
    provider: P,
    device: Option<P::Device>,
    lifecycle: Lifecycle,
    destroy: DestroyHandle,
    metrics: SurfaceMetrics,
    physical_size: (u32, u32),
}

impl<P: DeviceProvider> DeviceManager<P> {
    pub fn new(provider: P, metrics: SurfaceMetrics) -> Self {
        Self {
            provider,
            device: None,
            lifecycle: Lifecycle::Uninitialized,
            destroy: DestroyHandle::default(),
            physical_size: metrics.physical_size(),
            metrics,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Handle for requesting teardown from outside the owning thread
    pub fn destroy_handle(&self) -> DestroyHandle {
        self.destroy.clone()
    }

    pub fn is_destroy_requested(&self) -> bool {
        self.destroy.is_requested()
    }

    /// Output size in device pixels
    pub fn physical_size(&self) -> (u32, u32) {
        self.physical_size
    }

    pub fn device(&self) -> Option<&P::Device> {
        self.device.as_ref()
    }

    /// Acquire a device, compile the kernel and create the render resources
    ///
    /// Compilation errors fail with [`InitError::ShaderCompile`] before any
    /// resource is created. On success the surface is sized once from the
    /// current metrics.
    pub async fn initialize(&mut self) -> Result<InitOutcome, InitError> {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Destroyed => return Ok(InitOutcome::Aborted),
            Lifecycle::Initializing => return Err(InitError::InvalidState("initializing")),
            Lifecycle::Ready => return Err(InitError::InvalidState("ready")),
        }
        if self.abort_if_destroyed() {
            return Ok(InitOutcome::Aborted);
        }

        self.lifecycle = Lifecycle::Initializing;
        tracing::debug!("Acquiring device");

        let acquired = self.provider.acquire().await;
        if self.abort_if_destroyed() {
            // Release whatever arrived instead of handing it to the render path
            drop(acquired);
            return Ok(InitOutcome::Aborted);
        }
        let mut device = match acquired {
            Ok(device) => device,
            Err(err) => {
                tracing::error!(%err, "Device acquisition failed");
                self.lifecycle = Lifecycle::Uninitialized;
                return Err(err);
            }
        };
        tracing::info!("Device acquired");

        let diagnostics = device.compile_kernel(KERNEL_SOURCE).await;
        if self.abort_if_destroyed() {
            drop(device);
            return Ok(InitOutcome::Aborted);
        }
        for warning in diagnostics.iter().filter(|d| !d.is_error()) {
            tracing::debug!(%warning, "Kernel compiler message");
        }
        if let Err(err) = check_diagnostics(&diagnostics) {
            tracing::error!(%err, "Kernel failed to compile");
            self.lifecycle = Lifecycle::Uninitialized;
            return Err(err);
        }
        tracing::debug!("Kernel compiled");

        if let Err(err) = device.create_resources(PARAMETER_BLOCK_SIZE) {
            self.lifecycle = Lifecycle::Uninitialized;
            return Err(err);
        }
        if self.abort_if_destroyed() {
            drop(device);
            return Ok(InitOutcome::Aborted);
        }

        self.device = Some(device);
        self.lifecycle = Lifecycle::Ready;
        tracing::info!(block_size = PARAMETER_BLOCK_SIZE, "Render resources created");

        self.resize(self.metrics);
        Ok(InitOutcome::Ready)
    }

    /// Recompute the physical output size from `metrics` and apply it
    ///
    /// Metrics arriving before the device is ready are remembered and applied
    /// when initialization completes. After destroy this does nothing.
    pub fn resize(&mut self, metrics: SurfaceMetrics) {
        if self.lifecycle == Lifecycle::Destroyed || self.is_destroy_requested() {
            return;
        }
        self.metrics = metrics;
        self.physical_size = metrics.physical_size();

        if let Some(device) = self.device.as_mut() {
            let (width, height) = self.physical_size;
            tracing::debug!(width, height, scale = metrics.scale_factor, "Resizing output");
            device.resize(width, height);
        }
    }

    /// Hand one block to the device
    pub fn submit_frame(&mut self, block: &ParameterBlock) -> Result<(), FrameError> {
        if self.is_destroy_requested() {
            return Err(FrameError::Skipped("destroy requested".into()));
        }
        match (self.lifecycle, self.device.as_mut()) {
            (Lifecycle::Ready, Some(device)) => device.submit_frame(block),
            _ => Err(FrameError::Skipped("device not ready".into())),
        }
    }

    pub fn is_device_lost(&self) -> bool {
        self.device.as_ref().is_some_and(KernelDevice::is_lost)
    }

    /// Release the device and every resource created on it
    ///
    /// Idempotent. Also stops any scheduler driving this manager, since the
    /// scheduler checks the destroy request at the top of every tick.
    pub fn destroy(&mut self) {
        self.destroy.request();
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.device = None;
        self.lifecycle = Lifecycle::Destroyed;
        tracing::info!("Device manager destroyed");
    }

    fn abort_if_destroyed(&mut self) -> bool {
        if self.is_destroy_requested() {
            tracing::info!("Destroy requested during initialization, releasing device");
            self.device = None;
            self.lifecycle = Lifecycle::Destroyed;
            true
        } else {
            false
        }
    }
}

impl<P: DeviceProvider> Drop for DeviceManager<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}
