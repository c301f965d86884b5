//! Build configuration.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::point::{Point, PointSet};
use crate::quadtree::TreeBuilder;
use crate::region::Region;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub tree: TreeConfig,
}

impl Config {
    /// Load configuration from `path`, or use defaults if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::parse(&contents)?
        } else {
            info!("No {} found, using default config", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        let CanvasConfig { width, height } = self.canvas;
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "canvas must be positive, got {width}x{height}"
            )));
        }
        if self.sampling.count == 0 {
            return Err(Error::InvalidConfig("sample count must be at least 1".into()));
        }
        if self.tree.max_depth == 0 {
            return Err(Error::InvalidConfig("max depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Root region spanning the whole canvas, upper-left corner at `(0, height)`.
    pub fn root_region(&self) -> Result<Region> {
        Region::new(
            0.0,
            self.canvas.height,
            self.canvas.width,
            self.canvas.height,
            self.tree.root_name.as_str(),
        )
    }

    pub fn builder(&self) -> TreeBuilder {
        TreeBuilder::new().max_depth(self.tree.max_depth)
    }

    /// Samples the canvas, reproducibly when a seed is configured.
    pub fn sample_points(&self) -> PointSet {
        let (w, h, n) = (self.canvas.width, self.canvas.height, self.sampling.count);
        match self.sampling.seed {
            Some(seed) => Point::sample(&mut StdRng::seed_from_u64(seed), 0.0, w, 0.0, h, n),
            None => Point::sample(&mut rand::rng(), 0.0, w, 0.0, h, n),
        }
    }
}

/// Extent of the sampled area and the root region.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_size")]
    pub width: f64,
    #[serde(default = "default_canvas_size")]
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_size(),
            height: default_canvas_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// Number of draws; coincident draws collapse.
    #[serde(default = "default_sample_count")]
    pub count: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            count: default_sample_count(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_root_name")]
    pub root_name: String,
    /// Subdivision cutoff for near-coincident points.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_name: default_root_name(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_canvas_size() -> f64 {
    512.0
}
fn default_sample_count() -> usize {
    32
}
fn default_root_name() -> String {
    "Main".to_string()
}
fn default_max_depth() -> u32 {
    TreeBuilder::DEFAULT_MAX_DEPTH
}
