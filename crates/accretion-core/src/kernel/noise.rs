//! Hash-based value noise shared with the WGSL kernel
//!
//! Only arithmetic that WGSL reproduces exactly is used here (no `sin` based
//! hashing), so the CPU and GPU renditions sample the same fields.

// Note: These magic constants are arbitrary hash coefficients, not math constants
#![allow(clippy::unreadable_literal)]

use glam::Vec3;

/// Number of octaves summed by [`fbm`]
pub const FBM_OCTAVES: u32 = 4;

/// GLSL/WGSL style fractional part (`x - floor(x)`)
pub fn fract(v: Vec3) -> Vec3 {
    v - v.floor()
}

/// Pseudo-random value in `[0, 1)` for a lattice point
pub fn hash13(p: Vec3) -> f32 {
    let mut p3 = fract(p * 0.1031);
    let zyx = Vec3::new(p3.z, p3.y, p3.x);
    p3 += Vec3::splat(p3.dot(zyx + Vec3::splat(31.32)));
    let h = (p3.x + p3.y) * p3.z;
    h - h.floor()
}

/// Smooth 3D value noise in `[0, 1]`
pub fn value_noise(p: Vec3) -> f32 {
    let i = p.floor();
    let f = fract(p);
    let u = f * f * (Vec3::splat(3.0) - 2.0 * f);

    let corner = |x: f32, y: f32, z: f32| hash13(i + Vec3::new(x, y, z));

    let x00 = mix(corner(0.0, 0.0, 0.0), corner(1.0, 0.0, 0.0), u.x);
    let x10 = mix(corner(0.0, 1.0, 0.0), corner(1.0, 1.0, 0.0), u.x);
    let x01 = mix(corner(0.0, 0.0, 1.0), corner(1.0, 0.0, 1.0), u.x);
    let x11 = mix(corner(0.0, 1.0, 1.0), corner(1.0, 1.0, 1.0), u.x);

    mix(mix(x00, x10, u.y), mix(x01, x11, u.y), u.z)
}

/// Fractal Brownian Motion: four octaves of value noise, result in `[0, 0.9375]`
pub fn fbm(p: Vec3) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut q = p;
    for _ in 0..FBM_OCTAVES {
        value += amplitude * value_noise(q);
        q = q * 2.03 + Vec3::new(1.7, 9.2, 5.3);
        amplitude *= 0.5;
    }
    value
}

/// Linear interpolation, WGSL `mix`
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite step, WGSL `smoothstep`
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
