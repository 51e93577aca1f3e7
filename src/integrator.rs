//! Per-frame force integration.
//!
//! In [`TransitionState::Normal`] every particle is a damped spring pulled
//! toward its target, pushed away from the pointer when it comes within
//! `repel_radius`. Repulsion acts in the view plane only (x and y).
//!
//! In [`TransitionState::Frozen`] all forces and damping are skipped and
//! particles drift at whatever velocity they had, without bound.
//!
//! Positions advance by one velocity per frame in both states; there is no
//! delta-time scaling, matching one integration pass per display refresh.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::buffer::{ParticleBuffer, TargetSet};
use crate::transition::TransitionState;

/// Force model constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    /// Pointer distance below which repulsion applies.
    pub repel_radius: f32,
    /// Repulsion per unit of penetration into the radius.
    pub repel_strength: f32,
    /// Spring constant toward the target.
    pub attraction: f32,
    /// Velocity multiplier applied every normal step.
    pub damping: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            repel_radius: 60.0,
            repel_strength: 0.5,
            attraction: 0.003,
            damping: 0.95,
        }
    }
}

/// Advances the particle buffer one frame at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForceIntegrator {
    params: ForceParams,
}

impl ForceIntegrator {
    pub fn new(params: ForceParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ForceParams {
        &self.params
    }

    /// Run one integration pass over every particle and mark the buffer dirty.
    pub fn step(
        &self,
        state: TransitionState,
        pointer: Vec3,
        buffer: &mut ParticleBuffer,
        targets: &TargetSet,
    ) {
        let ForceParams {
            repel_radius,
            repel_strength,
            attraction,
            damping,
        } = self.params;

        for (i, position, velocity) in buffer.particles_mut() {
            match state {
                TransitionState::Normal => {
                    let to_pointer = *position - pointer;
                    let dist = to_pointer.length();
                    if dist < repel_radius {
                        let dir = to_pointer.normalize_or_zero();
                        let force = (repel_radius - dist) * repel_strength;
                        velocity.x += dir.x * force;
                        velocity.y += dir.y * force;
                    }

                    *velocity += (targets.get(i) - *position) * attraction;
                    *velocity *= damping;
                }
                TransitionState::Frozen => {}
            }

            *position += *velocity;
        }

        buffer.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAR: Vec3 = Vec3::new(1000.0, 1000.0, 0.0);

    fn single(position: Vec3, target: Vec3) -> (ParticleBuffer, TargetSet) {
        (
            ParticleBuffer::from_positions(vec![position]),
            TargetSet::from_cloud(&[target]),
        )
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn test_attraction_then_damping() {
        let (mut buffer, targets) = single(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0));
        ForceIntegrator::default().step(TransitionState::Normal, FAR, &mut buffer, &targets);

        assert!(approx(buffer.velocity(0), Vec3::new(0.285, 0.0, 0.0)));
        assert!(approx(buffer.position(0), Vec3::new(0.285, 0.0, 0.0)));
    }

    #[test]
    fn test_pointer_repulsion_inside_radius() {
        // Target at the particle so only repulsion contributes.
        let start = Vec3::new(10.0, 0.0, 0.0);
        let (mut buffer, targets) = single(start, start);
        ForceIntegrator::default().step(
            TransitionState::Normal,
            Vec3::ZERO,
            &mut buffer,
            &targets,
        );

        // (60 - 10) * 0.5 = 25 along +x, then damped.
        assert!(approx(buffer.velocity(0), Vec3::new(25.0 * 0.95, 0.0, 0.0)));
        assert!(approx(buffer.position(0), Vec3::new(10.0 + 23.75, 0.0, 0.0)));
    }

    #[test]
    fn test_repulsion_ignores_z() {
        let start = Vec3::new(0.0, 0.0, 30.0);
        let (mut buffer, targets) = single(start, start);
        ForceIntegrator::default().step(
            TransitionState::Normal,
            Vec3::ZERO,
            &mut buffer,
            &targets,
        );

        // Pointer straight behind the particle pushes only along z, which is ignored.
        assert!(approx(buffer.velocity(0), Vec3::ZERO));
    }

    #[test]
    fn test_particle_on_pointer_does_not_produce_nan() {
        let (mut buffer, targets) = single(Vec3::ZERO, Vec3::ZERO);
        ForceIntegrator::default().step(
            TransitionState::Normal,
            Vec3::ZERO,
            &mut buffer,
            &targets,
        );
        assert!(buffer.position(0).is_finite());
    }

    #[test]
    fn test_missing_target_pulls_to_origin() {
        let mut buffer = ParticleBuffer::from_positions(vec![Vec3::X * 100.0, Vec3::Y * 100.0]);
        let mut targets = TargetSet::from_cloud(&[Vec3::X * 100.0, Vec3::Y * 100.0]);
        targets.retarget(&[Vec3::X * 100.0], 2);

        ForceIntegrator::default().step(TransitionState::Normal, FAR, &mut buffer, &targets);
        assert_eq!(buffer.velocity(0), Vec3::ZERO);
        assert!(buffer.velocity(1).y < 0.0);
    }

    #[test]
    fn test_normal_state_settles_on_target() {
        let target = Vec3::new(40.0, -25.0, 10.0);
        let (mut buffer, targets) = single(Vec3::ZERO, target);
        let integrator = ForceIntegrator::default();

        // The spring is underdamped, so the error rings down rather than
        // shrinking every frame. Its peak over successive windows must fall.
        let mut last_peak = f32::INFINITY;
        for _ in 0..4 {
            let mut peak = 0.0f32;
            for _ in 0..150 {
                integrator.step(TransitionState::Normal, FAR, &mut buffer, &targets);
                peak = peak.max((buffer.position(0) - target).length());
            }
            assert!(peak < last_peak);
            last_peak = peak;
        }
        assert!((buffer.position(0) - target).length() < 0.01);
    }

    #[test]
    fn test_error_shrinks_until_first_crossing() {
        let target = Vec3::new(100.0, 0.0, 0.0);
        let (mut buffer, targets) = single(Vec3::ZERO, target);
        let integrator = ForceIntegrator::default();

        let mut last = (buffer.position(0) - target).length();
        for _ in 0..40 {
            integrator.step(TransitionState::Normal, FAR, &mut buffer, &targets);
            let err = (buffer.position(0) - target).length();
            assert!(err < last);
            last = err;
        }
    }

    #[test]
    fn test_frozen_state_drifts_without_forces() {
        let velocity = Vec3::new(10.0, -5.0, 3.0);
        let (mut buffer, targets) = single(Vec3::ZERO, Vec3::new(500.0, 0.0, 0.0));
        buffer.set_velocity(0, velocity);

        let integrator = ForceIntegrator::default();
        for step in 1..=3 {
            // Pointer sits on top of the particle; it must not matter.
            let pointer = buffer.position(0);
            integrator.step(TransitionState::Frozen, pointer, &mut buffer, &targets);
            assert_eq!(buffer.velocity(0), velocity);
            assert_eq!(buffer.position(0), velocity * step as f32);
        }
        assert_eq!(buffer.position(0), Vec3::new(30.0, -15.0, 9.0));
    }

    #[test]
    fn test_step_marks_buffer_dirty() {
        let (mut buffer, targets) = single(Vec3::ZERO, Vec3::ZERO);
        buffer.take_dirty();
        ForceIntegrator::default().step(TransitionState::Frozen, FAR, &mut buffer, &targets);
        assert!(buffer.is_dirty());
    }
}
