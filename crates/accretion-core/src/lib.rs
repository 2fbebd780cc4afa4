//! # Accretion Core
//!
//! Host-side data model for the Accretion visualizer.
//!
//! The renderer is driven by a small [`SimulationParameters`] snapshot. Once per
//! frame the snapshot, the accumulated simulated time and the surface
//! resolution are packed into a fixed-layout [`ParameterBlock`] which is the
//! only data the raymarching kernel ever sees.
//!
//! This crate has no GPU dependency. Besides the parameter model it carries a
//! CPU rendition of the raymarching kernel ([`kernel`]) that consumes the same
//! block, used for software rendering and for checking kernel invariants.
//!
//! ## Example
//!
//! ```rust
//! use accretion_core::{SimulationParameters, pack};
//!
//! let params = SimulationParameters::default();
//! let block = pack(&params, 0.0, [1280.0, 720.0]);
//! assert_eq!(bytemuck::bytes_of(&block).len(), 96);
//! ```
//!
//! ## Units and Conventions
//!
//! - **Distances**: multiples of the event horizon radius (`RS = 1.0`)
//! - **Angles**: radians
//! - **Coordinate system**: right-handed, Y-up; the disk lies in the XZ plane

pub mod block;
pub mod camera;
pub mod config;
pub mod kernel;
pub mod params;
pub mod render;

mod error;

pub use block::{PARAMETER_BLOCK_SIZE, ParameterBlock, pack};
pub use camera::CameraFrame;
pub use error::{Error, Result};
pub use params::{SimulationParameters, ViewMode, WavelengthBand};
