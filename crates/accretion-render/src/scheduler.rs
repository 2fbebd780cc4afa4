//! Frame scheduler
//!
//! A cooperative periodic task: every [`FrameScheduler::tick`] checks the stop
//! flag, takes the newest parameter snapshot, advances simulated time, packs
//! the block and submits exactly one frame. Ticks never overlap; pacing comes
//! from whoever calls `tick` (the window's redraw cycle, or a [`FramePacer`]
//! in [`FrameScheduler::run`]).

use crate::device::DeviceProvider;
use crate::error::FrameError;
use crate::manager::DeviceManager;
use accretion_core::{SimulationParameters, pack};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// Simulated seconds per tick at `time_speed = 1`
pub const TIME_QUANTUM: f32 = 1.0 / 60.0;

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was submitted (or skipped); schedule the next tick
    Continue,
    /// A stop or destroy was requested; do not schedule again
    Stopped,
    /// The device is gone; the scheduler has stopped itself
    DeviceLost,
}

/// Shareable request to stop the scheduler before its next tick
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Publishes parameter snapshots to a running scheduler
///
/// Snapshots take effect on the next tick; when several arrive between two
/// ticks only the newest is used.
#[derive(Debug, Clone)]
pub struct ParameterSender(Sender<SimulationParameters>);

impl ParameterSender {
    /// Returns `false` if the scheduler no longer exists
    pub fn set_parameters(&self, params: SimulationParameters) -> bool {
        self.0.send(params).is_ok()
    }
}

/// Source of frame pacing for [`FrameScheduler::run`]
pub trait FramePacer {
    /// Block until the next frame is due; `false` ends the run
    fn wait_for_next_frame(&mut self) -> bool;
}

/// Paces frames at a fixed interval, optionally for a bounded number of frames
#[derive(Debug, Clone)]
pub struct FixedRatePacer {
    interval: Duration,
    frame_limit: Option<u64>,
    frames: u64,
    next_deadline: Option<Instant>,
}

impl FixedRatePacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            frame_limit: None,
            frames: 0,
            next_deadline: None,
        }
    }

    /// Pace at `hz` frames per second
    pub fn from_rate(hz: f64) -> Self {
        let interval = if hz.is_finite() && hz > 0.0 {
            Duration::from_secs_f64(1.0 / hz)
        } else {
            Duration::ZERO
        };
        Self::new(interval)
    }

    /// No waiting between frames
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// End the run after `frames` frames have been paced
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FramePacer for FixedRatePacer {
    fn wait_for_next_frame(&mut self) -> bool {
        self.frames += 1;
        if self.frame_limit.is_some_and(|limit| self.frames >= limit) {
            return false;
        }
        if self.interval.is_zero() {
            return true;
        }

        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now) + self.interval;
        if deadline > now {
            std::thread::sleep(deadline - now);
            self.next_deadline = Some(deadline);
        } else {
            // Fell behind; restart the cadence instead of bursting
            self.next_deadline = Some(now);
        }
        true
    }
}

/// Drives one device manager, one tick at a time
#[derive(Debug)]
pub struct FrameScheduler {
    params: SimulationParameters,
    updates: Receiver<SimulationParameters>,
    sender: ParameterSender,
    simulated_time: f32,
    frames: u64,
    stop: StopHandle,
}

impl FrameScheduler {
    pub fn new(initial: SimulationParameters) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            params: initial,
            updates: rx,
            sender: ParameterSender(tx),
            simulated_time: 0.0,
            frames: 0,
            stop: StopHandle::default(),
        }
    }

    pub fn parameter_sender(&self) -> ParameterSender {
        self.sender.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Prevent further ticks; a frame already submitted still completes
    pub fn stop(&self) {
        self.stop.request_stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stop_requested()
    }

    /// The snapshot used by the most recent tick
    pub fn parameters(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn simulated_time(&self) -> f32 {
        self.simulated_time
    }

    /// Frames successfully submitted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run a single tick against `manager`
    pub fn tick<P: DeviceProvider>(&mut self, manager: &mut DeviceManager<P>) -> TickOutcome {
        if self.is_stopped() || manager.is_destroy_requested() {
            return TickOutcome::Stopped;
        }
        if manager.is_device_lost() {
            return self.lose_device("device reported lost");
        }

        if let Some(newest) = self.updates.try_iter().last() {
            self.params = newest;
        }
        self.simulated_time += TIME_QUANTUM * self.params.time_speed;

        let (width, height) = manager.physical_size();
        #[allow(clippy::cast_precision_loss)]
        let block = pack(&self.params, self.simulated_time, [width as f32, height as f32]);

        match manager.submit_frame(&block) {
            Ok(()) => {
                self.frames += 1;
                TickOutcome::Continue
            }
            Err(FrameError::Skipped(reason)) => {
                tracing::warn!(%reason, "Frame skipped");
                TickOutcome::Continue
            }
            Err(FrameError::DeviceLost(reason)) => self.lose_device(&reason),
        }
    }

    /// Tick until stopped, waiting on `pacer` between ticks
    ///
    /// Returns the outcome that ended the run.
    pub fn run<P, F>(&mut self, manager: &mut DeviceManager<P>, pacer: &mut F) -> TickOutcome
    where
        P: DeviceProvider,
        F: FramePacer + ?Sized,
    {
        loop {
            let outcome = self.tick(manager);
            if outcome != TickOutcome::Continue {
                tracing::debug!(?outcome, frames = self.frames, "Scheduler finished");
                return outcome;
            }
            if !pacer.wait_for_next_frame() {
                self.stop();
            }
        }
    }

    fn lose_device(&mut self, reason: &str) -> TickOutcome {
        tracing::error!(%reason, "Device lost, stopping scheduler");
        self.stop();
        TickOutcome::DeviceLost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_limit_ends_pacing() {
        let mut pacer = FixedRatePacer::unthrottled().with_frame_limit(3);
        assert!(pacer.wait_for_next_frame());
        assert!(pacer.wait_for_next_frame());
        assert!(!pacer.wait_for_next_frame());
        assert_eq!(pacer.frames(), 3);
    }

    #[test]
    fn test_fixed_rate_waits_between_frames() {
        let mut pacer = FixedRatePacer::new(Duration::from_millis(5));
        let start = Instant::now();
        for _ in 0..4 {
            assert!(pacer.wait_for_next_frame());
        }
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_invalid_rate_is_unthrottled() {
        assert_eq!(FixedRatePacer::from_rate(0.0).interval, Duration::ZERO);
        assert_eq!(FixedRatePacer::from_rate(f64::NAN).interval, Duration::ZERO);
        assert_eq!(FixedRatePacer::from_rate(50.0).interval, Duration::from_millis(20));
    }

    #[test]
    fn test_sender_reports_dropped_scheduler() {
        let scheduler = FrameScheduler::new(SimulationParameters::default());
        let sender = scheduler.parameter_sender();
        assert!(sender.set_parameters(SimulationParameters::default()));
        drop(scheduler);
        assert!(!sender.set_parameters(SimulationParameters::default()));
    }
}
