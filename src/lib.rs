//! # pmorph - Point Morph
//!
//! A field of point particles sampled from bright pixels of an image, pulled
//! toward a target shape, pushed away by the pointer, and able to morph
//! between shapes or explode and drift off screen.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pmorph::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let config = SceneConfig::default().with_shapes(["logo.png", "name.png"]);
//!     App::new(config)?
//!         .on_exit(|url| println!("leaving for {url}"))
//!         .run()
//! }
//! ```
//!
//! ## Headless use
//!
//! The simulation does not need a window. Drive a [`SimulationContext`]
//! directly and feed it time and pointer input yourself:
//!
//! ```ignore
//! let mut ctx = SimulationContext::new(cloud, &config);
//! let camera = Camera::new(config.camera, 1280, 720);
//! ctx.pointer_moved(Vec2::new(0.2, -0.1));
//! let events = ctx.frame(Duration::from_millis(16), &camera);
//! ```
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`sampler`] | image → point cloud |
//! | [`loader`] | off-thread sampling with timeouts |
//! | [`buffer`] | positions, velocities, per-slot targets |
//! | [`morph`] | grow / shrink reconciliation, stale-result policy |
//! | [`integrator`] | repulsion, attraction, damping, frozen drift |
//! | [`transition`] | freeze/explode state machine, exit fade |
//! | [`scheduler`] | deterministic timed events |
//! | [`context`] | owns all of the above |

pub mod app;
pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod gpu;
pub mod input;
pub mod integrator;
pub mod loader;
pub mod morph;
pub mod pointer;
pub mod sampler;
pub mod scheduler;
pub mod time;
pub mod transition;

pub use app::App;
pub use buffer::{ParticleBuffer, Target, TargetSet};
pub use config::{RenderStyle, SceneConfig};
pub use context::{ShapeRequest, SimulationContext};
pub use error::{AppError, ConfigError, GpuError, SampleError};
pub use glam::{Vec2, Vec3};
pub use integrator::{ForceIntegrator, ForceParams};
pub use loader::{SampleResult, ShapeLoader};
pub use morph::{Generation, MorphCoordinator, MorphOutcome, StalePolicy};
pub use pointer::{Camera, CameraConfig, PointerState};
pub use sampler::{ImageSampler, PointCloud, SamplerConfig};
pub use scheduler::{Scheduler, TaskId};
pub use transition::{
    ExplosionConfig, FadeOverlay, TransitionController, TransitionEvent, TransitionState,
};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use pmorph::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::App;
    pub use crate::config::{RenderStyle, SceneConfig};
    pub use crate::context::SimulationContext;
    pub use crate::error::AppError;
    pub use crate::integrator::ForceParams;
    pub use crate::morph::StalePolicy;
    pub use crate::pointer::Camera;
    pub use crate::sampler::{ImageSampler, SamplerConfig};
    pub use crate::transition::{TransitionEvent, TransitionState};
    pub use crate::{Vec2, Vec3};
}
