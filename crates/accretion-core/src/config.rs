//! Parameter files
//!
//! Parameter snapshots can be stored as JSON. Missing fields take their
//! documented defaults, so a file containing only `{"view_mode": "time_energy"}`
//! is valid. A file can also be laid over another snapshot, in which case the
//! missing fields keep that snapshot's values.

use crate::params::SimulationParameters;
use crate::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load a parameter snapshot from a JSON file
pub fn load_parameters(path: &Path) -> Result<SimulationParameters> {
    let contents = fs::read_to_string(path)?;
    parse_parameters(&contents)
}

/// Load a JSON file as overrides on top of `base`
pub fn load_parameters_over(
    path: &Path,
    base: &SimulationParameters,
) -> Result<SimulationParameters> {
    let contents = fs::read_to_string(path)?;
    parse_parameters_over(&contents, base)
}

/// Parse a parameter snapshot from JSON text
pub fn parse_parameters(json: &str) -> Result<SimulationParameters> {
    parse_parameters_over(json, &SimulationParameters::default())
}

/// Parse JSON text whose fields replace the matching fields of `base`
pub fn parse_parameters_over(
    json: &str,
    base: &SimulationParameters,
) -> Result<SimulationParameters> {
    let Value::Object(overrides) = serde_json::from_str::<Value>(json)? else {
        return Err(Error::InvalidParameter(
            "parameter file must hold a JSON object".to_string(),
        ));
    };
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(overrides);
    }
    let params: SimulationParameters = serde_json::from_value(merged)?;
    validate(&params)?;
    Ok(params)
}

/// Write a parameter snapshot as pretty-printed JSON, creating parent directories
pub fn save_parameters(path: &Path, params: &SimulationParameters) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_json(params)?)?;
    Ok(())
}

/// Serialize a parameter snapshot to pretty-printed JSON
pub fn to_json(params: &SimulationParameters) -> Result<String> {
    Ok(serde_json::to_string_pretty(params)?)
}

fn validate(params: &SimulationParameters) -> Result<()> {
    let scalars = [
        ("time_speed", params.time_speed),
        ("camera_distance", params.camera_distance),
        ("camera_angle_x", params.camera_angle_x),
        ("camera_angle_y", params.camera_angle_y),
    ];
    if let Some((name, _)) = scalars.iter().find(|(_, value)| !value.is_finite()) {
        return Err(Error::InvalidParameter(format!("{name} must be finite")));
    }
    if params.time_speed < 0.0 {
        return Err(Error::InvalidParameter(
            "time_speed must not be negative".to_string(),
        ));
    }
    Ok(())
}
