//! CPU rendition of the raymarching kernel
//!
//! Mirrors `shaders/raymarch.wgsl` in the render crate step for step and
//! consumes the same [`ParameterBlock`]. Each pixel is independent: a ray is
//! bent towards the origin by a heuristic inverse-fifth-power pull while three
//! emissive layers (disk, jets, backdrop) are composited front to back.
//!
//! The light bending is a visual approximation, not a null-geodesic solver.

pub mod layers;
pub mod noise;
pub mod palette;

use crate::block::ParameterBlock;
use crate::camera::FALLBACK_FORWARD;
use glam::{Vec2, Vec3};
use layers::{
    DISK_ABSORPTION, GALAXY_ABSORPTION, JET_ABSORPTION, backdrop_sample, disk_sample, jet_sample,
};
use noise::value_noise;

/// Event horizon radius; all lengths are expressed in multiples of it
pub const RS: f32 = 1.0;
/// Hard bound on integration steps per ray
pub const MAX_STEPS: u32 = 500;
/// Smallest adaptive step, used right at the horizon
pub const MIN_STEP: f32 = 0.02;
/// Largest adaptive step, used far from the body
pub const MAX_STEP: f32 = 2.5;
/// Adaptive step per unit radius
pub const STEP_SCALE: f32 = 0.08;
/// Strength of the bending pull
pub const LENSING_STRENGTH: f32 = 1.5;
/// Lower bound of the background distance
pub const MIN_ESCAPE_RADIUS: f32 = 60.0;
/// Rays still farther than this when the budget runs out see the starfield
pub const EXHAUSTED_FAR_RADIUS: f32 = 3.0 * RS;
/// Integration stops once transmittance falls below this
pub const OPAQUE_THRESHOLD: f32 = 0.01;

/// How the integration of a ray ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The ray crossed the event horizon
    Captured,
    /// The ray left the scene and sampled the starfield
    Escaped,
    /// [`MAX_STEPS`] ran out
    Exhausted,
    /// Accumulated opacity made further contributions negligible
    Opaque,
}

/// Energy each layer added to a ray (sum of the largest channel of every contribution)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerEnergy {
    pub disk: f32,
    pub jet: f32,
    pub backdrop: f32,
    pub stars: f32,
}

/// Full record of a single ray's integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayTrace {
    /// Final tone-mapped color, every channel in `[0, 1]`
    pub color: Vec3,
    /// Accumulated radiance before tone mapping
    pub radiance: Vec3,
    pub termination: Termination,
    /// Integration steps taken
    pub steps: u32,
    pub energy: LayerEnergy,
    /// Remaining transmittance when integration stopped
    pub transmit: f32,
    /// Whether transmittance never increased and stayed inside `[0, 1]`
    pub transmit_well_behaved: bool,
}

/// Normalized device coordinate of a pixel center, `y` pointing up
///
/// The shorter screen axis spans `[-1, 1]`, matching the fragment shader.
pub fn pixel_ndc(x: u32, y: u32, resolution: [f32; 2]) -> Vec2 {
    let frag = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
    let res = Vec2::from_array(resolution);
    let uv = (2.0 * frag - res) / res.y;
    Vec2::new(uv.x, -uv.y)
}

/// Camera basis `(right, up, forward)` from the block's direction and up vectors
pub fn camera_basis(direction: Vec3, up: Vec3) -> (Vec3, Vec3, Vec3) {
    let ww = direction.try_normalize().unwrap_or(FALLBACK_FORWARD);
    // Looking straight along `up` leaves the right vector undefined
    let uu = ww.cross(up).try_normalize().unwrap_or(Vec3::X);
    let vv = uu.cross(ww).normalize();
    (uu, vv, ww)
}

/// Adaptive integration step: fine near the horizon, coarse far away
pub fn step_size(r: f32) -> f32 {
    (STEP_SCALE * r).clamp(MIN_STEP, MAX_STEP)
}

/// Distance beyond which a ray counts as escaped
pub fn escape_radius(camera_pos: Vec3) -> f32 {
    MIN_ESCAPE_RADIUS.max(camera_pos.length() * 1.2 + 20.0)
}

/// Pseudo-acceleration bending the ray towards the origin
///
/// Magnitude is `LENSING_STRENGTH * |p x v|^2 / r^5`.
pub fn lensing_acceleration(p: Vec3, v: Vec3, r: f32) -> Vec3 {
    let h = p.cross(v);
    -(p / r) * LENSING_STRENGTH * h.length_squared() / r.powi(5)
}

/// Sharply peaked starfield for a ray direction
pub fn starfield(direction: Vec3) -> Vec3 {
    let n = value_noise(direction * 160.0);
    Vec3::new(0.9, 0.95, 1.0) * n.powi(28) * 3.0
}

/// Fitted ACES filmic curve followed by a clamp to `[0, 1]`
pub fn tone_map(color: Vec3) -> Vec3 {
    let channel = |x: f32| {
        let mapped = (x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14);
        if mapped.is_finite() {
            mapped.clamp(0.0, 1.0)
        } else {
            0.0
        }
    };
    Vec3::new(channel(color.x), channel(color.y), channel(color.z))
}

/// Integrate the ray through `ndc` and return its full record
pub fn trace_pixel(block: &ParameterBlock, ndc: Vec2) -> RayTrace {
    let (uu, vv, ww) = camera_basis(block.camera_direction(), block.camera_up());
    let mode = block.view_mode();
    let band = block.wavelength_band();
    let time = block.time;

    let mut p = block.camera_position();
    let mut v = (ndc.x * uu + ndc.y * vv + ww).normalize();
    let escape = escape_radius(p);

    let mut col = Vec3::ZERO;
    let mut transmit = 1.0_f32;
    let mut energy = LayerEnergy::default();
    let mut well_behaved = true;
    let mut termination = Termination::Exhausted;
    let mut steps = 0;

    let mut composite = |col: &mut Vec3, transmit: &mut f32, emission: Vec3, alpha: f32| {
        let contribution = *transmit * emission * alpha;
        *col += contribution;
        let next = *transmit * (1.0 - alpha);
        well_behaved &= next <= *transmit && (0.0..=1.0).contains(&next);
        *transmit = next;
        contribution.max_element()
    };

    while steps < MAX_STEPS {
        let r = p.length();
        if r < RS {
            termination = Termination::Captured;
            break;
        }
        if r > escape {
            let stars = transmit * starfield(v);
            col += stars;
            energy.stars += stars.max_element();
            termination = Termination::Escaped;
            break;
        }
        steps += 1;

        let dt = step_size(r);
        v = (v + lensing_acceleration(p, v, r) * dt).normalize();
        p += v * dt;
        let r = p.length();

        if let Some(disk) = disk_sample(p, v, r, time, mode, band) {
            let alpha = 1.0 - (-disk.density * dt * DISK_ABSORPTION).exp();
            energy.disk += composite(&mut col, &mut transmit, disk.emission, alpha);
        }
        if block.jets_enabled() {
            if let Some(jet) = jet_sample(p, r, time, mode, band) {
                let alpha = 1.0 - (-jet.density * dt * JET_ABSORPTION).exp();
                energy.jet += composite(&mut col, &mut transmit, jet.emission, alpha);
            }
        }
        if block.milky_way_enabled() {
            if let Some(galaxy) = backdrop_sample(p, time) {
                let alpha = 1.0 - (-galaxy.density * dt * GALAXY_ABSORPTION).exp();
                energy.backdrop += composite(&mut col, &mut transmit, galaxy.emission, alpha);
            }
        }

        if transmit < OPAQUE_THRESHOLD {
            termination = Termination::Opaque;
            break;
        }
    }

    if termination == Termination::Exhausted && p.length() > EXHAUSTED_FAR_RADIUS {
        let stars = transmit * starfield(v);
        col += stars;
        energy.stars += stars.max_element();
    }

    RayTrace {
        color: tone_map(col),
        radiance: col,
        termination,
        steps,
        energy,
        transmit,
        transmit_well_behaved: well_behaved,
    }
}

/// Final color of a single pixel
pub fn shade_pixel(block: &ParameterBlock, x: u32, y: u32) -> Vec3 {
    trace_pixel(block, pixel_ndc(x, y, block.resolution)).color
}
