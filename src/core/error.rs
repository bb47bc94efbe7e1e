// Copyright @yucwang 2026

use thiserror::Error;

/// Setup-time failures. Sampling kernels never produce one of these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration '{name}': {reason}")]
    InvalidConfig { name: &'static str, reason: String },

    #[error("height field mismatch: {0}")]
    HeightFieldMismatch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("exr error: {0}")]
    Exr(#[from] exr::error::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl Error {
    pub fn invalid_config(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig { name, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
