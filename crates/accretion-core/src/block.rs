//! Fixed-layout per-frame parameter block shared with the kernel
//!
//! The layout below is mirrored field for field by the `Params` struct in the
//! WGSL kernel. Offsets are in 4-byte slots:
//!
//! | Slot    | Field                  |
//! |---------|------------------------|
//! | 0..=1   | resolution             |
//! | 2..=3   | padding                |
//! | 4..=6   | camera position        |
//! | 8..=10  | camera direction       |
//! | 12..=14 | camera up              |
//! | 15      | simulated time         |
//! | 16      | view mode index        |
//! | 17      | wavelength band index  |
//! | 18      | show backdrop (0/1)    |
//! | 19      | show jets (0/1)        |
//! | 20..=23 | reserved               |

use crate::camera::CameraFrame;
use crate::params::{SimulationParameters, ViewMode, WavelengthBand};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Size of [`ParameterBlock`] in bytes
pub const PARAMETER_BLOCK_SIZE: u64 = std::mem::size_of::<ParameterBlock>() as u64;

/// Uniform buffer data sent to the GPU
/// This struct must match the WGSL struct layout exactly
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParameterBlock {
    pub resolution: [f32; 2],
    pub _pad0: [f32; 2],
    pub camera_pos: [f32; 3],
    pub _pad1: f32,
    pub camera_dir: [f32; 3],
    pub _pad2: f32,
    pub camera_up: [f32; 3],
    pub time: f32,
    // Enumerations and flags are packed as floats for GPU compatibility
    pub view_mode: f32,
    pub wavelength: f32,
    pub show_milky_way: f32,
    pub show_jets: f32,
    pub _reserved: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<ParameterBlock>() == 96);

/// Derive the device-ready block for one frame
pub fn pack(
    params: &SimulationParameters,
    simulated_time: f32,
    resolution: [f32; 2],
) -> ParameterBlock {
    let camera = CameraFrame::from_parameters(params);

    ParameterBlock {
        resolution,
        _pad0: [0.0; 2],
        camera_pos: camera.position.to_array(),
        _pad1: 0.0,
        camera_dir: camera.direction.to_array(),
        _pad2: 0.0,
        camera_up: camera.up.to_array(),
        time: simulated_time,
        view_mode: params.view_mode.index() as f32,
        wavelength: params.wavelength_band.index() as f32,
        show_milky_way: flag(params.show_milky_way),
        show_jets: flag(params.show_jets),
        _reserved: [0.0; 4],
    }
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

impl ParameterBlock {
    /// View the block as its 24 raw slots
    pub fn slots(&self) -> &[f32; 24] {
        bytemuck::cast_ref(self)
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::from_array(self.camera_pos)
    }

    pub fn camera_direction(&self) -> Vec3 {
        Vec3::from_array(self.camera_dir)
    }

    pub fn camera_up(&self) -> Vec3 {
        Vec3::from_array(self.camera_up)
    }

    pub fn view_mode(&self) -> ViewMode {
        ViewMode::from_slot(self.view_mode)
    }

    pub fn wavelength_band(&self) -> WavelengthBand {
        WavelengthBand::from_slot(self.wavelength)
    }

    pub fn milky_way_enabled(&self) -> bool {
        self.show_milky_way > 0.5
    }

    pub fn jets_enabled(&self) -> bool {
        self.show_jets > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> SimulationParameters {
        SimulationParameters {
            view_mode: ViewMode::MatterDensity,
            wavelength_band: WavelengthBand::Radio,
            time_speed: 2.0,
            show_milky_way: true,
            show_jets: false,
            camera_distance: 10.0,
            camera_angle_x: 0.0,
            camera_angle_y: 0.0,
        }
    }

    #[test]
    fn test_block_is_96_bytes() {
        assert_eq!(PARAMETER_BLOCK_SIZE, 96);
        assert_eq!(PARAMETER_BLOCK_SIZE % 16, 0);
    }

    #[test]
    fn test_slot_offsets() {
        let block = pack(&scenario(), 12.5, [1920.0, 1080.0]);
        let slots = block.slots();

        assert_eq!(slots[0], 1920.0);
        assert_eq!(slots[1], 1080.0);
        assert_eq!(&slots[4..7], &[10.0, 0.0, 0.0]);
        assert_eq!(&slots[8..11], &[-1.0, 0.0, 0.0]);
        assert_eq!(&slots[12..15], &[0.0, 1.0, 0.0]);
        assert_eq!(slots[15], 12.5);
        assert_eq!(slots[16], 2.0);
        assert_eq!(slots[17], 2.0);
        assert_eq!(slots[18], 1.0);
        assert_eq!(slots[19], 0.0);
        for reserved in [2, 3, 7, 11, 20, 21, 22, 23] {
            assert_eq!(slots[reserved], 0.0, "slot {reserved} must stay zeroed");
        }
    }

    #[test]
    fn test_packing_is_bit_exact() {
        let params = SimulationParameters {
            camera_angle_x: 0.37,
            camera_angle_y: -4.1,
            ..scenario()
        };
        let a = pack(&params, 3.25, [800.0, 600.0]);
        let b = pack(&params, 3.25, [800.0, 600.0]);
        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
    }

    #[test]
    fn test_decoding_helpers() {
        let block = pack(&scenario(), 0.0, [1.0, 1.0]);
        assert_eq!(block.view_mode(), ViewMode::MatterDensity);
        assert_eq!(block.wavelength_band(), WavelengthBand::Radio);
        assert!(block.milky_way_enabled());
        assert!(!block.jets_enabled());
    }

    #[test]
    fn test_zero_distance_never_produces_nan() {
        let params = SimulationParameters {
            camera_distance: 0.0,
            ..scenario()
        };
        let block = pack(&params, 0.0, [64.0, 64.0]);
        assert!(block.slots().iter().all(|v| v.is_finite()));
        assert_eq!(block.camera_dir, [0.0, 0.0, -1.0]);
    }
}
