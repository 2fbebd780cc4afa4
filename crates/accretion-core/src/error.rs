//! Error types for Accretion

use thiserror::Error;

/// Result type alias using Accretion's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core Accretion operations
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter value could not be parsed or is out of its domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parameter file could not be (de)serialized
    #[error("Parameter file error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
