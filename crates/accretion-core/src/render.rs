//! Software rendering with the CPU kernel
//!
//! Produces the same picture as the GPU path (up to floating point
//! differences) without needing a graphics device. Rows are shaded in
//! parallel with rayon.

use crate::block::ParameterBlock;
use crate::kernel::{RayTrace, pixel_ndc, shade_pixel, trace_pixel};
use crate::{Error, Result};
use image::RgbImage;
use rayon::prelude::*;
use std::path::Path;

/// Encode a linear channel in `[0, 1]` as an 8-bit sRGB value
///
/// The GPU renders into an sRGB target, so the hardware applies the same curve.
pub fn linear_to_srgb8(linear: f32) -> u8 {
    let c = linear.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0 + 0.5) as u8
}

/// Render every pixel of the block's resolution
pub fn render_image(block: &ParameterBlock) -> Result<RgbImage> {
    let (width, height) = dimensions(block)?;
    let mut pixels = vec![0u8; width as usize * height as usize * 3];

    pixels
        .par_chunks_mut(width as usize * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
                let color = shade_pixel(block, x as u32, y as u32);
                pixel[0] = linear_to_srgb8(color.x);
                pixel[1] = linear_to_srgb8(color.y);
                pixel[2] = linear_to_srgb8(color.z);
            }
        });

    RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::InvalidParameter("pixel buffer does not match resolution".into()))
}

/// Trace every pixel and keep the full records, row-major
pub fn trace_image(block: &ParameterBlock) -> Result<Vec<RayTrace>> {
    let (width, height) = dimensions(block)?;
    Ok((0..width * height)
        .into_par_iter()
        .map(|i| trace_pixel(block, pixel_ndc(i % width, i / width, block.resolution)))
        .collect())
}

/// Render and save as an image file (format from the extension)
pub fn render_to_file(block: &ParameterBlock, path: &Path) -> Result<()> {
    render_image(block)?.save(path)?;
    Ok(())
}

fn dimensions(block: &ParameterBlock) -> Result<(u32, u32)> {
    let [width, height] = block.resolution;
    if !(width >= 1.0 && height >= 1.0 && width.is_finite() && height.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "resolution must be at least 1x1, got {width}x{height}"
        )));
    }
    Ok((width as u32, height as u32))
}
