//! Kernel source and compilation diagnostics

use crate::error::InitError;
use std::fmt;

/// WGSL source of the raymarching kernel
pub const KERNEL_SOURCE: &str = include_str!("shaders/raymarch.wgsl");

/// Vertex entry point (fullscreen triangle)
pub const VERTEX_ENTRY: &str = "vs_main";

/// Fragment entry point (one ray per pixel)
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Classification of a compiler message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One message reported while compiling the kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// 1-based source line, when the compiler reports one
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            line: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            line: None,
        }
    }

    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Fail with every error-classified message if compilation did not succeed
///
/// Warnings and informational messages never fail compilation.
pub fn check_diagnostics(diagnostics: &[Diagnostic]) -> Result<(), InitError> {
    let errors: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(ToString::to_string)
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(InitError::ShaderCompile(errors))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use accretion_core::ParameterBlock;
    use accretion_core::kernel::{self, layers, noise, palette};
    use std::collections::HashMap;
    use std::mem::offset_of;

    /// Parse the kernel and run naga's validator over it, as wgpu does on device
    fn validate_kernel(source: &str) -> Result<naga::Module, String> {
        let module =
            naga::front::wgsl::parse_str(source).map_err(|err| err.emit_to_string(source))?;
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|err| format!("{err:?}"))?;
        Ok(module)
    }

    #[test]
    fn test_kernel_compiles_and_validates() {
        let module = validate_kernel(KERNEL_SOURCE).unwrap_or_else(|err| panic!("{err}"));

        let stages: Vec<(&str, naga::ShaderStage)> = module
            .entry_points
            .iter()
            .map(|entry| (entry.name.as_str(), entry.stage))
            .collect();
        assert!(stages.contains(&(VERTEX_ENTRY, naga::ShaderStage::Vertex)));
        assert!(stages.contains(&(FRAGMENT_ENTRY, naga::ShaderStage::Fragment)));
    }

    #[test]
    fn test_broken_kernel_is_rejected() {
        let broken = KERNEL_SOURCE.replacen("max(", "maxx(", 1);
        assert!(validate_kernel(&broken).is_err());
    }

    /// Scalar and `vec3<f32>` module-scope constants of the kernel, by name
    fn wgsl_constants() -> HashMap<String, Vec<f64>> {
        KERNEL_SOURCE
            .lines()
            .filter_map(|line| line.trim().strip_prefix("const "))
            .filter_map(|decl| {
                let (name, rest) = decl.split_once(':')?;
                let (_, value) = rest.split_once('=')?;
                let value = value.trim().trim_end_matches(';');
                let value = value
                    .strip_prefix("vec3<f32>(")
                    .and_then(|v| v.strip_suffix(')'))
                    .unwrap_or(value);
                let parsed = value
                    .split(',')
                    .map(|c| c.trim().trim_end_matches('u').parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .unwrap_or_else(|err| panic!("unparsable constant {name}: {err}"));
                Some((name.trim().to_string(), parsed))
            })
            .collect()
    }

    #[test]
    fn test_kernel_constants_match_cpu_kernel() {
        let constants = wgsl_constants();
        let scalars: &[(&str, f64)] = &[
            ("RS", kernel::RS.into()),
            ("MAX_STEPS", kernel::MAX_STEPS.into()),
            ("MIN_STEP", kernel::MIN_STEP.into()),
            ("MAX_STEP", kernel::MAX_STEP.into()),
            ("STEP_SCALE", kernel::STEP_SCALE.into()),
            ("LENSING_STRENGTH", kernel::LENSING_STRENGTH.into()),
            ("MIN_ESCAPE_RADIUS", kernel::MIN_ESCAPE_RADIUS.into()),
            ("EXHAUSTED_FAR_RADIUS", kernel::EXHAUSTED_FAR_RADIUS.into()),
            ("OPAQUE_THRESHOLD", kernel::OPAQUE_THRESHOLD.into()),
            ("FBM_OCTAVES", noise::FBM_OCTAVES.into()),
            ("DISK_INNER", layers::DISK_INNER.into()),
            ("DISK_OUTER", layers::DISK_OUTER.into()),
            ("DISK_THICKNESS", layers::DISK_THICKNESS.into()),
            ("DISK_ROTATION_SPEED", layers::DISK_ROTATION_SPEED.into()),
            ("DISK_INFALL_SPEED", layers::DISK_INFALL_SPEED.into()),
            ("DISK_DRIFT_PERIOD", layers::DISK_DRIFT_PERIOD.into()),
            ("DISK_DENSITY", layers::DISK_DENSITY.into()),
            ("DISK_INTENSITY", layers::DISK_INTENSITY.into()),
            ("DISK_ABSORPTION", layers::DISK_ABSORPTION.into()),
            ("JET_MIN_HEIGHT", layers::JET_MIN_HEIGHT.into()),
            ("JET_MAX_HEIGHT", layers::JET_MAX_HEIGHT.into()),
            ("JET_BASE_RADIUS", layers::JET_BASE_RADIUS.into()),
            ("JET_SPREAD", layers::JET_SPREAD.into()),
            ("JET_SPEED", layers::JET_SPEED.into()),
            ("JET_DENSITY", layers::JET_DENSITY.into()),
            ("JET_INTENSITY", layers::JET_INTENSITY.into()),
            ("JET_ABSORPTION", layers::JET_ABSORPTION.into()),
            ("GALAXY_PLANE_Y", layers::GALAXY_PLANE_Y.into()),
            ("GALAXY_HALF_THICKNESS", layers::GALAXY_HALF_THICKNESS.into()),
            ("GALAXY_RADIUS", layers::GALAXY_RADIUS.into()),
            ("GALAXY_DENSITY", layers::GALAXY_DENSITY.into()),
            ("GALAXY_GRID_SPACING", layers::GALAXY_GRID_SPACING.into()),
            ("GALAXY_ABSORPTION", layers::GALAXY_ABSORPTION.into()),
        ];
        let colors = [
            ("GRID_COLOR", palette::GRID_COLOR),
            ("BACKDROP_GRID_COLOR", palette::BACKDROP_GRID_COLOR),
            ("GALAXY_ARM_COLOR", palette::GALAXY_ARM_COLOR),
            ("GALAXY_CORE_COLOR", palette::GALAXY_CORE_COLOR),
        ];

        let expected = scalars
            .iter()
            .map(|(name, value)| (*name, vec![*value]))
            .chain(colors.iter().map(|(name, color)| {
                (*name, color.to_array().iter().map(|c| f64::from(*c)).collect())
            }));
        for (name, values) in expected {
            let actual = constants
                .get(name)
                .unwrap_or_else(|| panic!("kernel does not declare {name}"));
            assert_eq!(actual.len(), values.len(), "shape of {name}");
            for (a, e) in actual.iter().zip(&values) {
                // WGSL literals are parsed as f64; the CPU side is f32
                assert!((a - e).abs() <= e.abs() * 1e-6, "{name}: kernel {a}, cpu {e}");
            }
        }
    }

    #[test]
    fn test_kernel_enum_indices_match_cpu_tables() {
        use accretion_core::{ViewMode, WavelengthBand};

        let constants = wgsl_constants();
        let index = |name: &str| constants.get(name).map(|v| v[0]);
        for (name, mode) in [
            ("MODE_CLASSIC", ViewMode::Classic),
            ("MODE_GRAVITY_GRID", ViewMode::GravityGrid),
            ("MODE_MATTER_DENSITY", ViewMode::MatterDensity),
            ("MODE_TIME_ENERGY", ViewMode::TimeEnergy),
        ] {
            assert_eq!(index(name), Some(f64::from(mode.index())), "{name}");
        }
        for (name, band) in [
            ("BAND_VISIBLE", WavelengthBand::Visible),
            ("BAND_XRAY", WavelengthBand::XRay),
            ("BAND_RADIO", WavelengthBand::Radio),
            ("BAND_INFRARED", WavelengthBand::Infrared),
        ] {
            assert_eq!(index(name), Some(f64::from(band.index())), "{name}");
        }
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let diagnostics = [Diagnostic::warning("unused variable"), Diagnostic::warning("shadowed")];
        assert!(check_diagnostics(&diagnostics).is_ok());
        assert!(check_diagnostics(&[]).is_ok());
    }

    #[test]
    fn test_errors_are_aggregated() {
        let diagnostics = [
            Diagnostic::error("unknown identifier `foo`").at_line(12),
            Diagnostic::warning("unused variable"),
            Diagnostic::error("type mismatch"),
        ];
        let err = check_diagnostics(&diagnostics);
        assert_eq!(
            err,
            Err(InitError::ShaderCompile(vec![
                "line 12: unknown identifier `foo`".to_string(),
                "type mismatch".to_string(),
            ]))
        );
    }

    #[test]
    fn test_kernel_declares_entry_points() {
        assert!(KERNEL_SOURCE.contains(&format!("fn {VERTEX_ENTRY}(")));
        assert!(KERNEL_SOURCE.contains(&format!("fn {FRAGMENT_ENTRY}(")));
        assert!(KERNEL_SOURCE.contains("var<uniform> params: Params;"));
    }

    /// Offsets of the WGSL `Params` members under uniform address space rules
    fn wgsl_params_layout() -> (Vec<(String, usize)>, usize) {
        let start = KERNEL_SOURCE.find("struct Params {").expect("Params struct present");
        let body = &KERNEL_SOURCE[start..];
        let end = body.find('}').expect("Params struct closed");

        let mut offset: usize = 0;
        let mut fields = Vec::new();
        for line in body[..end].lines().skip(1) {
            let Some((name, ty)) = line.trim().trim_end_matches(',').split_once(':') else {
                continue;
            };
            let (size, align) = match ty.trim() {
                "f32" => (4, 4),
                "vec2<f32>" => (8, 8),
                "vec3<f32>" => (12, 16),
                "vec4<f32>" => (16, 16),
                other => panic!("unexpected member type {other}"),
            };
            offset = offset.next_multiple_of(align);
            fields.push((name.trim().to_string(), offset));
            offset += size;
        }
        (fields, offset.next_multiple_of(16))
    }

    #[test]
    fn test_kernel_params_match_block_layout() {
        let (fields, size) = wgsl_params_layout();
        assert_eq!(size, std::mem::size_of::<ParameterBlock>());

        let expected = [
            ("resolution", offset_of!(ParameterBlock, resolution)),
            ("_pad0", offset_of!(ParameterBlock, _pad0)),
            ("camera_pos", offset_of!(ParameterBlock, camera_pos)),
            ("_pad1", offset_of!(ParameterBlock, _pad1)),
            ("camera_dir", offset_of!(ParameterBlock, camera_dir)),
            ("_pad2", offset_of!(ParameterBlock, _pad2)),
            ("camera_up", offset_of!(ParameterBlock, camera_up)),
            ("time", offset_of!(ParameterBlock, time)),
            ("view_mode", offset_of!(ParameterBlock, view_mode)),
            ("wavelength", offset_of!(ParameterBlock, wavelength)),
            ("show_milky_way", offset_of!(ParameterBlock, show_milky_way)),
            ("show_jets", offset_of!(ParameterBlock, show_jets)),
            ("_reserved", offset_of!(ParameterBlock, _reserved)),
        ];
        assert_eq!(fields.len(), expected.len());
        for ((name, offset), (expected_name, expected_offset)) in fields.iter().zip(expected) {
            assert_eq!(name, expected_name);
            assert_eq!(*offset, expected_offset, "offset of {name}");
        }
    }
}
