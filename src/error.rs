//! Error types for region construction, tree building and configuration.

use thiserror::Error;

/// Errors that can occur while building a quadtree.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid region geometry: width {width}, height {height}")]
    InvalidGeometry { width: f64, height: f64 },

    #[error("region {region} still holds {points} points at depth {depth}")]
    DepthExceeded {
        region: String,
        depth: u32,
        points: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
