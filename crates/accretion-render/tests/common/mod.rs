//! Instrumented stand-in devices for lifecycle and scheduler tests

#![allow(dead_code)]

use accretion_core::ParameterBlock;
use accretion_render::{
    DeviceProvider, Diagnostic, FrameError, InitError, KernelDevice, SurfaceMetrics,
};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type Hook = Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>;

/// Everything the stub observed, shared with the test
#[derive(Default)]
pub struct Counters {
    pub acquired: AtomicUsize,
    pub compiled: AtomicUsize,
    pub resources_created: AtomicUsize,
    pub released: AtomicUsize,
    pub resizes: Mutex<Vec<(u32, u32)>>,
    pub frames: Mutex<Vec<ParameterBlock>>,
}

impl Counters {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn compiled(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }

    pub fn resources_created(&self) -> usize {
        self.resources_created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.resizes.lock().unwrap().clone()
    }

    pub fn frames(&self) -> Vec<ParameterBlock> {
        self.frames.lock().unwrap().clone()
    }
}

/// Provider whose behaviour is scripted by the test
pub struct StubProvider {
    pub counters: Arc<Counters>,
    pub lost: Arc<AtomicBool>,
    pub diagnostics: Vec<Diagnostic>,
    pub acquire_error: Option<InitError>,
    /// Runs while the device is being acquired
    pub acquire_hook: Hook,
    /// Runs while the kernel is being compiled
    pub compile_hook: Hook,
    /// Runs while the render resources are being created
    pub resources_hook: Hook,
    /// Returned by successive `submit_frame` calls before they succeed
    pub frame_errors: Arc<Mutex<VecDeque<FrameError>>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            counters: Arc::default(),
            lost: Arc::default(),
            diagnostics: Vec::new(),
            acquire_error: None,
            acquire_hook: Arc::default(),
            compile_hook: Arc::default(),
            resources_hook: Arc::default(),
            frame_errors: Arc::default(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn failing(mut self, error: InitError) -> Self {
        self.acquire_error = Some(error);
        self
    }
}

fn run_hook(hook: &Hook) {
    if let Some(f) = hook.lock().unwrap().take() {
        f();
    }
}

impl DeviceProvider for StubProvider {
    type Device = StubDevice;

    fn acquire(&mut self) -> impl Future<Output = Result<StubDevice, InitError>> {
        async move {
            run_hook(&self.acquire_hook);
            if let Some(err) = self.acquire_error.take() {
                return Err(err);
            }
            self.counters.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(StubDevice {
                counters: Arc::clone(&self.counters),
                lost: Arc::clone(&self.lost),
                diagnostics: self.diagnostics.clone(),
                compile_hook: Arc::clone(&self.compile_hook),
                resources_hook: Arc::clone(&self.resources_hook),
                frame_errors: Arc::clone(&self.frame_errors),
            })
        }
    }
}

pub struct StubDevice {
    counters: Arc<Counters>,
    lost: Arc<AtomicBool>,
    diagnostics: Vec<Diagnostic>,
    compile_hook: Hook,
    resources_hook: Hook,
    frame_errors: Arc<Mutex<VecDeque<FrameError>>>,
}

impl KernelDevice for StubDevice {
    fn compile_kernel(&mut self, _source: &str) -> impl Future<Output = Vec<Diagnostic>> {
        async move {
            self.counters.compiled.fetch_add(1, Ordering::SeqCst);
            run_hook(&self.compile_hook);
            self.diagnostics.clone()
        }
    }

    fn create_resources(&mut self, block_size: u64) -> Result<(), InitError> {
        assert_eq!(block_size, 96);
        self.counters.resources_created.fetch_add(1, Ordering::SeqCst);
        run_hook(&self.resources_hook);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.counters.resizes.lock().unwrap().push((width, height));
    }

    fn submit_frame(&mut self, block: &ParameterBlock) -> Result<(), FrameError> {
        if let Some(err) = self.frame_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.counters.frames.lock().unwrap().push(*block);
        Ok(())
    }

    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }
}

impl Drop for StubDevice {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// 640x360 logical at 2x density
pub fn hidpi_metrics() -> SurfaceMetrics {
    SurfaceMetrics::new(640.0, 360.0, 2.0)
}
