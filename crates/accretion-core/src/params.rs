//! Simulation parameters driven by the host application
//!
//! [`SimulationParameters`] is a plain value snapshot. Producers (the preview
//! window, the CLI, a control panel) own the clamping rules and publish whole
//! snapshots; the renderer reads one snapshot per tick and never mutates it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Closest allowed camera distance
pub const MIN_CAMERA_DISTANCE: f32 = 3.0;
/// Farthest allowed camera distance
pub const MAX_CAMERA_DISTANCE: f32 = 300.0;
/// Camera distance used by the large-scale backdrop preset
pub const BACKDROP_CAMERA_DISTANCE: f32 = 150.0;
/// Pitch is kept strictly inside `(-PITCH_LIMIT, PITCH_LIMIT)`
pub const PITCH_LIMIT: f32 = PI / 2.1;

/// Alternate color/density mappings for the disk and jet layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Physically inspired emission colors
    #[default]
    Classic,
    /// Disk replaced by a periodic grid, Doppler beaming disabled, jets hidden
    GravityGrid,
    /// Disk and jets colored by matter density
    MatterDensity,
    /// Disk and jets colored by gravitational time dilation
    TimeEnergy,
}

impl ViewMode {
    /// All modes in block index order
    pub const ALL: [Self; 4] = [
        Self::Classic,
        Self::GravityGrid,
        Self::MatterDensity,
        Self::TimeEnergy,
    ];

    /// Index written into the parameter block
    pub fn index(self) -> u32 {
        match self {
            Self::Classic => 0,
            Self::GravityGrid => 1,
            Self::MatterDensity => 2,
            Self::TimeEnergy => 3,
        }
    }

    /// Decode a block slot; unknown indices fall back to [`ViewMode::Classic`]
    pub fn from_slot(value: f32) -> Self {
        match value.round() as i64 {
            1 => Self::GravityGrid,
            2 => Self::MatterDensity,
            3 => Self::TimeEnergy,
            _ => Self::Classic,
        }
    }

    /// The mode after this one, wrapping around
    pub fn next(self) -> Self {
        Self::ALL[(self.index() as usize + 1) % Self::ALL.len()]
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::GravityGrid => "Gravity Grid",
            Self::MatterDensity => "Matter Density",
            Self::TimeEnergy => "Time / Energy",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "classic" => Ok(Self::Classic),
            "gravity_grid" | "grid" => Ok(Self::GravityGrid),
            "matter_density" | "density" => Ok(Self::MatterDensity),
            "time_energy" | "time" => Ok(Self::TimeEnergy),
            other => Err(Error::InvalidParameter(format!(
                "unknown view mode '{other}' (expected classic, gravity-grid, \
                 matter-density or time-energy)"
            ))),
        }
    }
}

/// Observation band selecting the emission palettes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavelengthBand {
    #[default]
    Visible,
    XRay,
    Radio,
    Infrared,
}

impl WavelengthBand {
    /// All bands in block index order
    pub const ALL: [Self; 4] = [Self::Visible, Self::XRay, Self::Radio, Self::Infrared];

    /// Index written into the parameter block
    pub fn index(self) -> u32 {
        match self {
            Self::Visible => 0,
            Self::XRay => 1,
            Self::Radio => 2,
            Self::Infrared => 3,
        }
    }

    /// Decode a block slot; unknown indices fall back to [`WavelengthBand::Visible`]
    pub fn from_slot(value: f32) -> Self {
        match value.round() as i64 {
            1 => Self::XRay,
            2 => Self::Radio,
            3 => Self::Infrared,
            _ => Self::Visible,
        }
    }

    /// The band after this one, wrapping around
    pub fn next(self) -> Self {
        Self::ALL[(self.index() as usize + 1) % Self::ALL.len()]
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Visible => "Visible",
            Self::XRay => "X-Ray",
            Self::Radio => "Radio",
            Self::Infrared => "Infrared",
        }
    }
}

impl fmt::Display for WavelengthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WavelengthBand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', ' ', '_'], "").as_str() {
            "visible" | "optical" => Ok(Self::Visible),
            "xray" => Ok(Self::XRay),
            "radio" => Ok(Self::Radio),
            "infrared" | "ir" => Ok(Self::Infrared),
            other => Err(Error::InvalidParameter(format!(
                "unknown wavelength band '{other}' (expected visible, x-ray, radio or infrared)"
            ))),
        }
    }
}

/// Snapshot of everything the simulation is driven by
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub view_mode: ViewMode,
    pub wavelength_band: WavelengthBand,
    /// Multiplier on simulated-time accumulation (>= 0)
    pub time_speed: f32,
    /// Draw the large-scale galaxy backdrop below the system
    pub show_milky_way: bool,
    /// Draw the polar jets
    pub show_jets: bool,
    /// Orbit radius of the camera around the origin
    pub camera_distance: f32,
    /// Pitch in radians
    pub camera_angle_x: f32,
    /// Yaw in radians, unconstrained
    pub camera_angle_y: f32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Classic,
            wavelength_band: WavelengthBand::Visible,
            time_speed: 1.0,
            show_milky_way: false,
            show_jets: true,
            camera_distance: 15.0,
            camera_angle_x: 0.25,
            camera_angle_y: 0.0,
        }
    }
}

impl SimulationParameters {
    /// Wide shot from far above the disk with the galaxy backdrop enabled
    pub fn backdrop_preset() -> Self {
        Self {
            show_milky_way: true,
            camera_distance: BACKDROP_CAMERA_DISTANCE,
            camera_angle_x: 0.8,
            ..Self::default()
        }
    }

    /// Copy with every producer-side clamp applied
    pub fn clamped(mut self) -> Self {
        self.time_speed = if self.time_speed.is_finite() {
            self.time_speed.max(0.0)
        } else {
            0.0
        };
        self.camera_distance = self
            .camera_distance
            .clamp(MIN_CAMERA_DISTANCE, MAX_CAMERA_DISTANCE);
        self.camera_angle_x = clamp_pitch(self.camera_angle_x);
        self
    }

    /// Orbit the camera around the origin
    ///
    /// - `delta_yaw`: horizontal rotation (positive = rotate right)
    /// - `delta_pitch`: vertical rotation (positive = look from higher up)
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.camera_angle_y += delta_yaw;
        self.camera_angle_x = clamp_pitch(self.camera_angle_x + delta_pitch);
    }

    /// Move the camera towards (positive) or away from (negative) the origin
    ///
    /// The step is proportional to the current distance so zooming feels the
    /// same close to the horizon and at backdrop scale.
    pub fn zoom(&mut self, delta: f32) {
        let distance = self.camera_distance * (1.0 - delta * 0.1);
        self.camera_distance = distance.clamp(MIN_CAMERA_DISTANCE, MAX_CAMERA_DISTANCE);
    }
}

/// Clamp pitch to the open interval `(-PITCH_LIMIT, PITCH_LIMIT)`
fn clamp_pitch(pitch: f32) -> f32 {
    if !pitch.is_finite() {
        return 0.0;
    }
    let limit = PITCH_LIMIT - 1.0e-4;
    pitch.clamp(-limit, limit)
}
