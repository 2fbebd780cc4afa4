//! Fixed color palettes for the emissive layers

use crate::params::WavelengthBand;
use glam::Vec3;

/// Disk color in [`ViewMode::GravityGrid`](crate::ViewMode::GravityGrid), independent of band
pub const GRID_COLOR: Vec3 = Vec3::new(0.15, 0.95, 0.65);
/// Grid overlay drawn across the backdrop plane
pub const BACKDROP_GRID_COLOR: Vec3 = Vec3::new(0.25, 0.55, 1.0);
/// Spiral arm tint of the backdrop galaxy
pub const GALAXY_ARM_COLOR: Vec3 = Vec3::new(0.45, 0.55, 1.0);
/// Bulge tint of the backdrop galaxy
pub const GALAXY_CORE_COLOR: Vec3 = Vec3::new(1.0, 0.85, 0.6);

/// Disk emission color; `heat` in `[0, 1]` runs from the cool outer edge to the inner edge
pub fn disk_color(band: WavelengthBand, heat: f32) -> Vec3 {
    let (cool, hot) = match band {
        WavelengthBand::Visible => (Vec3::new(1.0, 0.35, 0.05), Vec3::new(1.0, 0.9, 0.7)),
        WavelengthBand::XRay => (Vec3::new(0.25, 0.35, 1.0), Vec3::new(0.8, 0.9, 1.0)),
        WavelengthBand::Radio => (Vec3::new(0.6, 0.05, 0.05), Vec3::new(1.0, 0.45, 0.1)),
        WavelengthBand::Infrared => (Vec3::new(0.5, 0.08, 0.0), Vec3::new(1.0, 0.3, 0.05)),
    };
    cool.lerp(hot, heat.clamp(0.0, 1.0))
}

/// Jet emission color
pub fn jet_color(band: WavelengthBand) -> Vec3 {
    match band {
        WavelengthBand::Visible => Vec3::new(0.45, 0.65, 1.0),
        WavelengthBand::XRay => Vec3::new(0.75, 0.85, 1.0) * 1.4,
        WavelengthBand::Radio => Vec3::new(1.0, 0.35, 0.1) * 1.6,
        WavelengthBand::Infrared => Vec3::new(1.0, 0.45, 0.2) * 0.6,
    }
}

/// Heat map for [`ViewMode::MatterDensity`](crate::ViewMode::MatterDensity); `x` in `[0, 1]`
pub fn density_ramp(x: f32) -> Vec3 {
    let x = x.clamp(0.0, 1.0);
    let low = Vec3::new(0.05, 0.1, 0.6);
    let mid = Vec3::new(0.85, 0.1, 0.75);
    let high = Vec3::new(1.0, 0.95, 0.3);
    if x < 0.5 {
        low.lerp(mid, x * 2.0)
    } else {
        mid.lerp(high, x * 2.0 - 1.0)
    }
}

/// Ramp for [`ViewMode::TimeEnergy`](crate::ViewMode::TimeEnergy); `factor` is the
/// time dilation factor, 0 at the horizon and approaching 1 far away
pub fn dilation_ramp(factor: f32) -> Vec3 {
    Vec3::new(1.0, 0.1, 0.05).lerp(Vec3::new(0.2, 0.55, 1.0), factor.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_have_distinct_palettes() {
        let colors: Vec<Vec3> = WavelengthBand::ALL
            .iter()
            .map(|band| disk_color(*band, 0.5))
            .collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert!(a.distance(*b) > 0.05, "palettes too similar: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_ramps_are_clamped() {
        assert_eq!(density_ramp(-1.0), density_ramp(0.0));
        assert_eq!(density_ramp(5.0), density_ramp(1.0));
        assert_eq!(dilation_ramp(2.0), dilation_ramp(1.0));
    }
}
