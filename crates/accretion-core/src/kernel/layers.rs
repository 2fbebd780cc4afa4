//! Volumetric emission layers sampled along each ray
//!
//! Every layer returns an emission color and a density; the integrator turns
//! the density into an opacity with a layer specific absorption constant and
//! composites front to back.

use super::noise::{fbm, mix, smoothstep};
use super::palette::{
    BACKDROP_GRID_COLOR, GALAXY_ARM_COLOR, GALAXY_CORE_COLOR, GRID_COLOR, density_ramp,
    dilation_ramp, disk_color, jet_color,
};
use super::RS;
use crate::params::{ViewMode, WavelengthBand};
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

pub const DISK_INNER: f32 = 2.5;
pub const DISK_OUTER: f32 = 12.0;
/// Half thickness of the disk per unit radius
pub const DISK_THICKNESS: f32 = 0.05;
pub const DISK_ROTATION_SPEED: f32 = 2.0;
pub const DISK_INFALL_SPEED: f32 = 0.35;
/// Radial offset after which the inward drift starts over
pub const DISK_DRIFT_PERIOD: f32 = 4.0;
pub const DISK_DENSITY: f32 = 3.0;
pub const DISK_INTENSITY: f32 = 4.0;
pub const DISK_ABSORPTION: f32 = 2.0;

pub const JET_MIN_HEIGHT: f32 = 1.5;
pub const JET_MAX_HEIGHT: f32 = 40.0;
pub const JET_BASE_RADIUS: f32 = 0.25;
pub const JET_SPREAD: f32 = 0.12;
pub const JET_SPEED: f32 = 3.0;
pub const JET_DENSITY: f32 = 2.0;
pub const JET_INTENSITY: f32 = 1.5;
pub const JET_ABSORPTION: f32 = 1.5;

pub const GALAXY_PLANE_Y: f32 = -40.0;
pub const GALAXY_HALF_THICKNESS: f32 = 2.0;
pub const GALAXY_RADIUS: f32 = 160.0;
pub const GALAXY_DENSITY: f32 = 1.2;
pub const GALAXY_GRID_SPACING: f32 = 12.0;
pub const GALAXY_ABSORPTION: f32 = 0.4;

/// One sample of an emissive layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSample {
    pub emission: Vec3,
    pub density: f32,
}

/// One sample of the accretion disk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskSample {
    pub emission: Vec3,
    pub density: f32,
    /// Doppler beaming multiplier applied to the emission
    pub doppler: f32,
}

/// Rotate `p` about the vertical axis
pub fn rotate_y(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(c * p.x + s * p.z, p.y, -s * p.x + c * p.z)
}

/// 1.0 on integer values of `x`, fading to 0.0 at `width` away
pub fn grid_line(x: f32, width: f32) -> f32 {
    let f = x - x.floor();
    1.0 - smoothstep(0.0, width, f.min(1.0 - f))
}

/// Gravitational time dilation factor `sqrt(max(0, 1 - RS / r))`
pub fn time_dilation(r: f32) -> f32 {
    (1.0 - RS / r).max(0.0).sqrt()
}

/// Inward drift of the disk pattern at `time`
///
/// Returns two radial offsets, half a period apart and each wrapping within
/// `[0, DISK_DRIFT_PERIOD)`, and the weight of the second. The weight is zero
/// whenever the second offset wraps and one whenever the first does, so the
/// blended pattern never jumps and its frequency stays bounded.
pub fn disk_drift(time: f32) -> (f32, f32, f32) {
    let cycle = time * DISK_INFALL_SPEED / DISK_DRIFT_PERIOD;
    let phase = cycle - cycle.floor();
    let shifted = phase + 0.5 - (phase + 0.5).floor();
    (
        phase * DISK_DRIFT_PERIOD,
        shifted * DISK_DRIFT_PERIOD,
        (1.0 - 2.0 * phase).abs(),
    )
}

/// Sample the accretion disk at `p`, or `None` outside of it
pub fn disk_sample(
    p: Vec3,
    v: Vec3,
    r: f32,
    time: f32,
    mode: ViewMode,
    band: WavelengthBand,
) -> Option<DiskSample> {
    let half = DISK_THICKNESS * r;
    if p.y.abs() > half || !(DISK_INNER..=DISK_OUTER).contains(&r) {
        return None;
    }

    let vertical = 1.0 - p.y.abs() / half;
    let radial = smoothstep(DISK_INNER, DISK_INNER + 1.0, r)
        * (1.0 - smoothstep(DISK_OUTER - 4.0, DISK_OUTER, r));

    // Inner rings turn faster; the radial warp drifts the pattern inward over time
    let rotated = rotate_y(p, time * DISK_ROTATION_SPEED / r.sqrt());
    let pattern = |drift: f32| {
        let warp = (r + drift) / r;
        fbm(Vec3::new(rotated.x * warp, rotated.y * 6.0, rotated.z * warp) * 1.6)
    };
    let (drift_a, drift_b, blend) = disk_drift(time);
    let mut density =
        mix(pattern(drift_a), pattern(drift_b), blend) * vertical * radial * DISK_DENSITY;

    let tangent = Vec3::new(p.z, 0.0, -p.x).normalize();
    let beaming = 1.0 + v.dot(tangent) * (RS / (2.0 * r)).sqrt() * 2.5;
    let mut doppler = beaming.max(0.1).powi(3);
    let temperature = 1.0 / (r - RS + 0.1);

    let color = match mode {
        ViewMode::Classic => disk_color(band, temperature * 1.6),
        ViewMode::GravityGrid => {
            let angle = p.z.atan2(p.x);
            let rings = grid_line(r, 0.06);
            let spokes = grid_line(angle * 24.0 / TAU, 0.08);
            density = (rings.max(spokes) * 1.8 + 0.05) * vertical;
            doppler = 1.0;
            GRID_COLOR
        }
        ViewMode::MatterDensity => density_ramp(density / DISK_DENSITY * 1.5),
        ViewMode::TimeEnergy => dilation_ramp(time_dilation(r)),
    };

    Some(DiskSample {
        emission: color * density * doppler * temperature * DISK_INTENSITY,
        density,
        doppler,
    })
}

/// Sample the polar jets at `p`, or `None` outside of them
pub fn jet_sample(
    p: Vec3,
    r: f32,
    time: f32,
    mode: ViewMode,
    band: WavelengthBand,
) -> Option<LayerSample> {
    let height = p.y.abs();
    if !(JET_MIN_HEIGHT..=JET_MAX_HEIGHT).contains(&height) {
        return None;
    }
    let radius = JET_BASE_RADIUS + JET_SPREAD * height;
    let cylinder = Vec2::new(p.x, p.z).length();
    if cylinder > radius {
        return None;
    }

    let color = match mode {
        ViewMode::GravityGrid => return None,
        ViewMode::Classic => jet_color(band),
        // Recolored below once density is known
        ViewMode::MatterDensity => Vec3::ONE,
        ViewMode::TimeEnergy => dilation_ramp(time_dilation(r)),
    };

    // Scroll away from the body along each jet
    let outflow = p.y.signum() * time * JET_SPEED;
    let q = Vec3::new(p.x * 2.5, p.y * 0.6 - outflow, p.z * 2.5);
    let falloff = 1.0 - cylinder / radius;
    let axial =
        smoothstep(JET_MIN_HEIGHT, JET_MIN_HEIGHT + 1.5, height) * (-height / 12.0).exp();
    let density = fbm(q) * falloff * falloff * axial * JET_DENSITY;

    let color = if mode == ViewMode::MatterDensity {
        density_ramp(density)
    } else {
        color
    };

    Some(LayerSample {
        emission: color * density * JET_INTENSITY,
        density,
    })
}

/// Sample the stylized galaxy backdrop plane at `p`, or `None` off the plane
pub fn backdrop_sample(p: Vec3, time: f32) -> Option<LayerSample> {
    let dy = (p.y - GALAXY_PLANE_Y).abs();
    let rr = Vec2::new(p.x, p.z).length();
    if dy > GALAXY_HALF_THICKNESS || rr > GALAXY_RADIUS {
        return None;
    }
    let slab = 1.0 - dy / GALAXY_HALF_THICKNESS;

    let angle = p.z.atan2(p.x);
    let swirl = 2.0 * angle - (rr + 1.0).ln() * 3.0 + time * 0.05;
    let arms = (0.5 + 0.5 * swirl.cos()).powi(3);
    let detail = fbm(Vec3::new(p.x * 0.06, time * 0.01, p.z * 0.06));
    let falloff = (-rr / 60.0).exp();
    let core = (-rr / 10.0).exp();
    let density = ((0.15 + arms) * detail * falloff * 2.0 + core) * slab * GALAXY_DENSITY;

    // Grid marks the plane as a schematic projection
    let grid = grid_line(p.x / GALAXY_GRID_SPACING, 0.03)
        .max(grid_line(p.z / GALAXY_GRID_SPACING, 0.03))
        * slab
        * (1.0 - rr / GALAXY_RADIUS);

    let color = GALAXY_ARM_COLOR.lerp(GALAXY_CORE_COLOR, (core * 2.0).clamp(0.0, 1.0));

    Some(LayerSample {
        emission: color * density + BACKDROP_GRID_COLOR * grid * 0.6,
        density: density + grid * 0.2,
    })
}
