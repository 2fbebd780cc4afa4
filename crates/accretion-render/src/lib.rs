//! Accretion Render - GPU lifecycle and frame scheduling
//!
//! This crate runs the black hole raymarching kernel on the GPU with wgpu.
//!
//! ## Features
//!
//! - Device/pipeline manager with an explicit, race-safe lifecycle
//! - Cooperative frame scheduler fed by parameter snapshots
//! - WGSL raymarching kernel sharing its layout with [`accretion_core::ParameterBlock`]
//! - HUD overlay, interactive preview window and headless rendering
//!
//! ## Example
//!
//! ```rust,ignore
//! use accretion_render::{WindowConfig, run_preview};
//! use accretion_core::SimulationParameters;
//!
//! run_preview(WindowConfig::default(), SimulationParameters::default())?;
//! ```

pub mod device;
pub mod gpu;
pub mod headless;
pub mod manager;
pub mod overlay;
pub mod scheduler;
pub mod shader;
pub mod visualizer;
pub mod window;

mod error;

// Re-export wgpu for users who need texture formats, etc.
pub use wgpu;
pub use winit;

pub use device::{DeviceProvider, KernelDevice, SurfaceMetrics};
pub use error::{FrameError, InitError, RenderError};
pub use gpu::{WgpuDevice, WgpuProvider};
pub use headless::{BenchReport, render_image, run_benchmark};
pub use manager::{DestroyHandle, DeviceManager, InitOutcome, Lifecycle};
pub use overlay::{FrameStats, HudOverlay};
pub use scheduler::{
    FixedRatePacer, FramePacer, FrameScheduler, ParameterSender, StopHandle, TIME_QUANTUM,
    TickOutcome,
};
pub use shader::{Diagnostic, KERNEL_SOURCE, Severity};
pub use visualizer::Visualizer;
pub use window::{WindowConfig, controls_help, run_preview};
