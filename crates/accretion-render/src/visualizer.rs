//! Lifecycle API for hosting applications
//!
//! [`Visualizer`] pairs a [`DeviceManager`] with the [`FrameScheduler`] that
//! drives it and exposes the four calls a host needs: `initialize`,
//! `set_parameters`, `resize` and `destroy`.

use crate::device::{DeviceProvider, SurfaceMetrics};
use crate::error::InitError;
use crate::manager::{DestroyHandle, DeviceManager, InitOutcome};
use crate::scheduler::{FramePacer, FrameScheduler, ParameterSender, TickOutcome};
use accretion_core::SimulationParameters;

pub struct Visualizer<P: DeviceProvider> {
    manager: DeviceManager<P>,
    scheduler: FrameScheduler,
}

impl<P: DeviceProvider> Visualizer<P> {
    pub fn new(provider: P, metrics: SurfaceMetrics, params: SimulationParameters) -> Self {
        Self {
            manager: DeviceManager::new(provider, metrics),
            scheduler: FrameScheduler::new(params),
        }
    }

    pub async fn initialize(&mut self) -> Result<InitOutcome, InitError> {
        self.manager.initialize().await
    }

    /// Replace the active snapshot; takes effect on the next tick
    pub fn set_parameters(&self, params: SimulationParameters) {
        // The receiver lives in our own scheduler, so this cannot fail
        let _ = self.scheduler.parameter_sender().set_parameters(params);
    }

    /// Sender for producers living outside the owning thread
    pub fn parameter_sender(&self) -> ParameterSender {
        self.scheduler.parameter_sender()
    }

    pub fn resize(&mut self, metrics: SurfaceMetrics) {
        self.manager.resize(metrics);
    }

    /// Stop the scheduler and release the device; idempotent
    pub fn destroy(&mut self) {
        self.scheduler.stop();
        self.manager.destroy();
    }

    pub fn destroy_handle(&self) -> DestroyHandle {
        self.manager.destroy_handle()
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.scheduler.tick(&mut self.manager)
    }

    pub fn run<F: FramePacer + ?Sized>(&mut self, pacer: &mut F) -> TickOutcome {
        self.scheduler.run(&mut self.manager, pacer)
    }

    pub fn manager(&self) -> &DeviceManager<P> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut DeviceManager<P> {
        &mut self.manager
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }
}
