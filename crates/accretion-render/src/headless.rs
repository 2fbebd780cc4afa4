//! Offscreen GPU rendering and benchmarking

use crate::device::SurfaceMetrics;
use crate::error::RenderError;
use crate::gpu::WgpuProvider;
use crate::manager::InitOutcome;
use crate::scheduler::{FixedRatePacer, TickOutcome};
use crate::visualizer::Visualizer;
use accretion_core::{SimulationParameters, pack};
use std::time::{Duration, Instant};

/// Render a single frame at `simulated_time` and read it back
pub fn render_image(
    params: &SimulationParameters,
    simulated_time: f32,
    width: u32,
    height: u32,
) -> Result<image::RgbaImage, RenderError> {
    check_size(width, height)?;
    pollster::block_on(async {
        let metrics = SurfaceMetrics::physical(width, height);
        let mut visualizer = Visualizer::new(WgpuProvider::headless(), metrics, *params);
        if visualizer.initialize().await? == InitOutcome::Aborted {
            return Err(RenderError::Cancelled);
        }

        let manager = visualizer.manager_mut();
        #[allow(clippy::cast_precision_loss)]
        let block = pack(params, simulated_time, [width as f32, height as f32]);
        manager.submit_frame(&block)?;

        let device = manager.device().ok_or(RenderError::Cancelled)?;
        device.read_pixels()
    })
}

/// Timing summary of [`run_benchmark`]
#[derive(Debug, Clone, Copy)]
pub struct BenchReport {
    pub frames: u64,
    pub elapsed: Duration,
    pub width: u32,
    pub height: u32,
}

impl BenchReport {
    /// Mean wall time per frame in milliseconds
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_frame_ms(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.elapsed.as_secs_f64() * 1000.0 / self.frames as f64
        }
    }

    pub fn fps(&self) -> f64 {
        let ms = self.mean_frame_ms();
        if ms > 0.0 { 1000.0 / ms } else { 0.0 }
    }
}

/// Run the scheduler offscreen for `frames` frames as fast as the device allows
pub fn run_benchmark(
    params: &SimulationParameters,
    width: u32,
    height: u32,
    frames: u64,
) -> Result<BenchReport, RenderError> {
    check_size(width, height)?;
    pollster::block_on(async {
        let metrics = SurfaceMetrics::physical(width, height);
        let mut visualizer = Visualizer::new(WgpuProvider::headless(), metrics, *params);
        if visualizer.initialize().await? == InitOutcome::Aborted {
            return Err(RenderError::Cancelled);
        }

        let mut pacer = FixedRatePacer::unthrottled().with_frame_limit(frames.max(1));
        let start = Instant::now();
        let outcome = visualizer.run(&mut pacer);
        if let Some(device) = visualizer.manager().device() {
            device.wait_idle();
        }
        let elapsed = start.elapsed();

        if outcome == TickOutcome::DeviceLost {
            return Err(crate::error::FrameError::DeviceLost(
                "device lost during benchmark".into(),
            )
            .into());
        }

        let report = BenchReport {
            frames: visualizer.scheduler().frames(),
            elapsed,
            width,
            height,
        };
        tracing::info!(
            frames = report.frames,
            mean_ms = report.mean_frame_ms(),
            "Benchmark finished"
        );
        Ok(report)
    })
}

fn check_size(width: u32, height: u32) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize { width, height });
    }
    Ok(())
}
