//! Scene configuration.
//!
//! Every tunable of the simulation lives in [`SceneConfig`]. The defaults
//! reproduce the stock scene (two shapes, white 2px points on black, a 60 unit
//! repulsion radius), so most callers only override the shape list:
//!
//! ```ignore
//! let config = SceneConfig::default()
//!     .with_shapes(["assets/logo.png", "assets/name.png"])
//!     .with_destination("https://example.com/work");
//! ```
//!
//! Configs can also be read from JSON. Missing fields fall back to defaults:
//!
//! ```json
//! { "shapes": ["a.png", "b.png"], "forces": { "damping": 0.9 } }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::integrator::ForceParams;
use crate::morph::StalePolicy;
use crate::pointer::CameraConfig;
use crate::sampler::SamplerConfig;
use crate::transition::ExplosionConfig;

/// Presentation style handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Uniform particle colour (RGB, 0.0-1.0).
    pub color: [f32; 3],
    /// Point size in pixels.
    pub point_size: f32,
    /// Clear colour behind the particles.
    pub background: [f32; 3],
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            point_size: 2.0,
            background: [0.0, 0.0, 0.0],
        }
    }
}

/// Complete configuration for a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Ordered shape sources; clicking cycles through them and wraps.
    pub shapes: Vec<PathBuf>,
    pub sampler: SamplerConfig,
    pub forces: ForceParams,
    pub explosion: ExplosionConfig,
    pub camera: CameraConfig,
    pub style: RenderStyle,
    /// What to do with a sample that resolves after a newer request was issued.
    pub stale_policy: StalePolicy,
    /// How long a pending sample may stay outstanding before it is abandoned.
    pub sample_timeout_ms: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            shapes: vec![PathBuf::from("l-shape.png"), PathBuf::from("l-2.png")],
            sampler: SamplerConfig::default(),
            forces: ForceParams::default(),
            explosion: ExplosionConfig::default(),
            camera: CameraConfig::default(),
            style: RenderStyle::default(),
            stale_policy: StalePolicy::default(),
            sample_timeout_ms: 10_000,
        }
    }
}

impl SceneConfig {
    /// Read a JSON config file. Fields not present keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::debug!("loaded scene config from {}", path.display());
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shapes.is_empty() {
            return Err(ConfigError::NoShapes);
        }
        Ok(())
    }

    /// Replace the shape list.
    pub fn with_shapes<I, P>(mut self, shapes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.shapes = shapes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the force model parameters.
    pub fn with_forces(mut self, forces: ForceParams) -> Self {
        self.forces = forces;
        self
    }

    /// Set the sampling parameters.
    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = sampler;
        self
    }

    /// Set where the exit transition navigates to.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.explosion.destination = destination.into();
        self
    }

    /// Set the stale-result policy for overlapping shape loads.
    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = policy;
        self
    }

    /// Set the render style.
    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Sample timeout as a [`Duration`].
    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(self.sample_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_stock_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.shapes.len(), 2);
        assert_eq!(config.forces.repel_radius, 60.0);
        assert_eq!(config.style.point_size, 2.0);
        assert_eq!(config.sample_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{ "shapes": ["a.png"], "forces": {{ "damping": 0.9 }} }}"#).unwrap();

        let config = SceneConfig::from_json_file(&path).unwrap();
        assert_eq!(config.shapes, vec![PathBuf::from("a.png")]);
        assert_eq!(config.forces.damping, 0.9);
        assert_eq!(config.forces.attraction, 0.003);
        assert_eq!(config.sampler.threshold, 200);
    }

    #[test]
    fn test_empty_shape_list_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, r#"{ "shapes": [] }"#).unwrap();

        assert!(matches!(
            SceneConfig::from_json_file(&path),
            Err(ConfigError::NoShapes)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SceneConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
