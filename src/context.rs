//! The simulation context.
//!
//! [`SimulationContext`] owns every piece of mutable animation state: the
//! particle buffer, the target set, the morph coordinator, the transition
//! state machine, the pointer and the event scheduler. Input handlers and the
//! frame loop both go through it, on the same thread, so the buffer and
//! target set can never be observed in a size-inconsistent state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::buffer::{ParticleBuffer, TargetSet};
use crate::config::SceneConfig;
use crate::error::SampleError;
use crate::integrator::ForceIntegrator;
use crate::loader::SampleResult;
use crate::morph::{Generation, MorphCoordinator, MorphOutcome};
use crate::pointer::{Camera, PointerState};
use crate::sampler::{ImageSampler, PointCloud};
use crate::scheduler::Scheduler;
use crate::transition::{FadeOverlay, TransitionController, TransitionEvent, TransitionState};

/// A shape load the caller should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRequest {
    pub generation: Generation,
    pub path: PathBuf,
}

/// All simulation state for one scene.
#[derive(Debug)]
pub struct SimulationContext {
    buffer: ParticleBuffer,
    targets: TargetSet,
    morph: MorphCoordinator,
    integrator: ForceIntegrator,
    transition: TransitionController,
    pointer: PointerState,
    scheduler: Scheduler<TransitionEvent>,
    fade: FadeOverlay,
    shapes: Vec<PathBuf>,
    shape_index: usize,
}

impl SimulationContext {
    /// Build a context around an already sampled initial cloud.
    ///
    /// The cloud becomes the particle positions, the targets and the original
    /// shape used to seed later growth.
    pub fn new(initial: PointCloud, config: &SceneConfig) -> Self {
        log::info!("initial shape has {} particles", initial.len());
        Self {
            buffer: ParticleBuffer::from_positions(initial.clone()),
            targets: TargetSet::from_cloud(&initial),
            morph: MorphCoordinator::new(initial, config.stale_policy),
            integrator: ForceIntegrator::new(config.forces),
            transition: TransitionController::new(config.explosion.clone()),
            pointer: PointerState::new(),
            scheduler: Scheduler::new(),
            fade: FadeOverlay::default(),
            shapes: config.shapes.clone(),
            shape_index: 0,
        }
    }

    /// Sample the first configured shape and build a context from it.
    ///
    /// Blocks on the decode; used once at startup before the frame loop runs.
    pub fn load(config: &SceneConfig) -> Result<Self, SampleError> {
        let first = config.shapes.first().map(PathBuf::as_path).unwrap_or(Path::new(""));
        let cloud = ImageSampler::new(config.sampler).sample_file(first)?;
        Ok(Self::new(cloud, config))
    }

    pub fn buffer(&self) -> &ParticleBuffer {
        &self.buffer
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn state(&self) -> TransitionState {
        self.transition.state()
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn scheduler(&self) -> &Scheduler<TransitionEvent> {
        &self.scheduler
    }

    pub fn morph(&self) -> &MorphCoordinator {
        &self.morph
    }

    /// Index into the shape list of the most recently requested shape.
    pub fn shape_index(&self) -> usize {
        self.shape_index
    }

    /// Record the pointer position in normalized device coordinates.
    pub fn pointer_moved(&mut self, ndc: Vec2) {
        self.pointer.set_ndc(ndc);
    }

    /// Move to the next shape in the list, wrapping at the end.
    ///
    /// Returns the load the caller should start, or `None` while frozen.
    pub fn advance_shape(&mut self) -> Option<ShapeRequest> {
        if !self.transition.on_shape_advance() || self.shapes.is_empty() {
            return None;
        }
        self.shape_index = (self.shape_index + 1) % self.shapes.len();
        let generation = self.morph.begin_request();
        Some(ShapeRequest {
            generation,
            path: self.shapes[self.shape_index].clone(),
        })
    }

    /// Apply a finished load. Failures are logged and leave the target unchanged.
    pub fn apply_sample(&mut self, sample: SampleResult) -> Option<MorphOutcome> {
        match sample.result {
            Ok(cloud) => Some(self.apply_cloud(sample.generation, &cloud)),
            Err(e) => {
                log::warn!("shape {:?} not applied: {}", sample.generation, e);
                None
            }
        }
    }

    /// Apply a sampled cloud produced for request `generation`.
    pub fn apply_cloud(&mut self, generation: Generation, cloud: &[Vec3]) -> MorphOutcome {
        self.morph.apply(generation, cloud, &mut self.buffer, &mut self.targets)
    }

    /// Explode with random velocities. Ignored while frozen.
    pub fn explode<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R) -> bool {
        self.transition
            .trigger_explode(&mut self.buffer, &mut self.scheduler, now, rng)
    }

    /// Explode with caller-chosen velocities. Ignored while frozen.
    pub fn explode_with<F>(&mut self, now: Duration, impulse: F) -> bool
    where
        F: FnMut(usize) -> Vec3,
    {
        self.transition
            .trigger_explode_with(&mut self.buffer, &mut self.scheduler, now, impulse)
    }

    /// Leave the frozen state. Scheduled fade and exit still fire.
    pub fn cancel(&mut self) -> bool {
        self.transition.cancel()
    }

    /// Run one integration pass with the pointer projected through `camera`.
    pub fn step(&mut self, camera: &Camera) {
        let pointer = self.pointer.update(camera);
        self.integrator
            .step(self.transition.state(), pointer, &mut self.buffer, &self.targets);
    }

    /// Advance one display frame at simulation time `now`.
    ///
    /// Fires due transition events, then integrates. Returns the events that
    /// fired so the presentation layer can act on them. A fade starts at its
    /// due time even when the frame that picks it up comes later.
    pub fn frame(&mut self, now: Duration, camera: &Camera) -> Vec<TransitionEvent> {
        let events: Vec<_> = self
            .scheduler
            .drain_due(now)
            .into_iter()
            .map(|(due, event)| {
                if let TransitionEvent::FadeIn { duration } = &event {
                    self.fade.start(due, *duration);
                }
                event
            })
            .collect();
        self.step(camera);
        events
    }

    /// Opacity of the exit overlay at `now`.
    pub fn fade_opacity(&self, now: Duration) -> f32 {
        self.fade.opacity(now)
    }

    /// Read and clear the buffer's dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        self.buffer.take_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(n: usize) -> SimulationContext {
        let cloud = (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        SimulationContext::new(cloud, &SceneConfig::default())
    }

    #[test]
    fn test_advance_cycles_and_wraps() {
        let mut ctx = context(2);
        let first = ctx.advance_shape().unwrap();
        assert_eq!(first.path, PathBuf::from("l-2.png"));
        let second = ctx.advance_shape().unwrap();
        assert_eq!(second.path, PathBuf::from("l-shape.png"));
        assert!(second.generation > first.generation);
    }

    #[test]
    fn test_advance_ignored_while_frozen() {
        let mut ctx = context(2);
        ctx.explode_with(Duration::ZERO, |_| Vec3::ZERO);
        assert_eq!(ctx.advance_shape(), None);
        assert_eq!(ctx.shape_index(), 0);
    }

    #[test]
    fn test_failed_sample_keeps_targets() {
        let mut ctx = context(3);
        let request = ctx.advance_shape().unwrap();
        let before = ctx.targets().clone();

        let outcome = ctx.apply_sample(SampleResult {
            generation: request.generation,
            path: request.path.clone(),
            result: Err(SampleError::Timeout {
                path: request.path,
                timeout: Duration::from_secs(1),
            }),
        });
        assert_eq!(outcome, None);
        assert_eq!(ctx.targets(), &before);
    }

    #[test]
    fn test_frame_starts_fade_when_due() {
        let camera = Camera::new(Default::default(), 800, 600);
        let mut ctx = context(1);
        ctx.explode_with(Duration::ZERO, |_| Vec3::X);

        assert!(ctx.frame(Duration::from_millis(400), &camera).is_empty());
        assert_eq!(ctx.fade_opacity(Duration::from_millis(400)), 0.0);

        let events = ctx.frame(Duration::from_millis(500), &camera);
        assert!(matches!(events.as_slice(), [TransitionEvent::FadeIn { .. }]));
        assert_eq!(ctx.fade_opacity(Duration::from_millis(1500)), 1.0);

        let events = ctx.frame(Duration::from_millis(1500), &camera);
        assert!(matches!(events.as_slice(), [TransitionEvent::Exit { .. }]));
    }

    #[test]
    fn test_late_frame_does_not_delay_fade() {
        let camera = Camera::new(Default::default(), 800, 600);
        let mut ctx = context(1);
        ctx.explode_with(Duration::ZERO, |_| Vec3::X);

        assert!(ctx.frame(Duration::from_millis(490), &camera).is_empty());
        // The next frame arrives long after the fade was due at 500 ms.
        let events = ctx.frame(Duration::from_millis(990), &camera);
        assert!(matches!(events.as_slice(), [TransitionEvent::FadeIn { .. }]));

        assert_eq!(ctx.fade_opacity(Duration::from_millis(500)), 0.0);
        assert!(ctx.fade_opacity(Duration::from_millis(990)) > 0.5);
        assert_eq!(ctx.fade_opacity(Duration::from_millis(1500)), 1.0);
    }
}
