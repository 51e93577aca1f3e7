//! Shape morph reconciliation.
//!
//! When a new point cloud arrives its size rarely matches the particle
//! buffer. [`MorphCoordinator`] resolves the mismatch:
//!
//! | Requested vs capacity | Effect |
//! |-----------------------|--------|
//! | larger  | buffer regrows from the zero-padded original cloud, all particles at rest |
//! | smaller | surplus slots target the origin, nothing is deallocated |
//! | equal   | targets replaced one to one |
//!
//! Shape loads are asynchronous, so two rapid requests may resolve out of
//! order. Each request is stamped with a [`Generation`]; under
//! [`StalePolicy::DropStale`] a result is applied only if no newer request has
//! been issued since.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::buffer::{ParticleBuffer, TargetSet};

/// Monotonic id of a shape request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

/// How to treat a result whose request has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Discard results from superseded requests.
    #[default]
    DropStale,
    /// Apply whichever result resolves last, regardless of request order.
    LastResolvedWins,
}

/// What a reconciliation did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphOutcome {
    /// Capacity increased; every particle was reset.
    Grew { from: usize, to: usize },
    /// Fewer points than slots; `capacity - explicit` slots now target the origin.
    Shrunk { explicit: usize, capacity: usize },
    /// Same size, targets swapped in place.
    Replaced { count: usize },
    /// The result belonged to a superseded request and was dropped.
    Stale { generation: Generation, latest: Generation },
}

/// Applies newly sampled clouds to the particle buffer.
#[derive(Debug, Clone)]
pub struct MorphCoordinator {
    /// First-loaded cloud, zero padded to the current capacity.
    original: Vec<Vec3>,
    latest: Generation,
    policy: StalePolicy,
}

impl MorphCoordinator {
    pub fn new(original: Vec<Vec3>, policy: StalePolicy) -> Self {
        Self {
            original,
            latest: Generation::default(),
            policy,
        }
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    pub fn original(&self) -> &[Vec3] {
        &self.original
    }

    /// Generation of the most recently issued request.
    pub fn latest(&self) -> Generation {
        self.latest
    }

    /// Stamp a new request. Any request issued earlier becomes stale.
    pub fn begin_request(&mut self) -> Generation {
        self.latest = Generation(self.latest.0 + 1);
        self.latest
    }

    /// Whether a result for `generation` would be applied right now.
    pub fn accepts(&self, generation: Generation) -> bool {
        match self.policy {
            StalePolicy::DropStale => generation == self.latest,
            StalePolicy::LastResolvedWins => true,
        }
    }

    /// Apply the result of request `generation`, honouring the stale policy.
    pub fn apply(
        &mut self,
        generation: Generation,
        cloud: &[Vec3],
        buffer: &mut ParticleBuffer,
        targets: &mut TargetSet,
    ) -> MorphOutcome {
        if !self.accepts(generation) {
            log::debug!(
                "dropping stale shape result {:?} (latest {:?})",
                generation,
                self.latest
            );
            return MorphOutcome::Stale {
                generation,
                latest: self.latest,
            };
        }
        self.reconcile(cloud, buffer, targets)
    }

    /// Make `cloud` the new target shape.
    pub fn reconcile(
        &mut self,
        cloud: &[Vec3],
        buffer: &mut ParticleBuffer,
        targets: &mut TargetSet,
    ) -> MorphOutcome {
        let capacity = buffer.capacity();
        let requested = cloud.len();

        let outcome = if requested > capacity {
            let mut padded = self.original.clone();
            padded.resize(requested, Vec3::ZERO);
            self.original.clone_from(&padded);
            buffer.regrow(padded);
            MorphOutcome::Grew {
                from: capacity,
                to: requested,
            }
        } else if requested < capacity {
            MorphOutcome::Shrunk {
                explicit: requested,
                capacity,
            }
        } else {
            MorphOutcome::Replaced { count: requested }
        };

        targets.retarget(cloud, buffer.capacity());
        log::debug!("morph reconciled: {:?}", outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Target;

    fn line(n: usize, y: f32) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32, y, 0.0)).collect()
    }

    fn setup(n: usize) -> (MorphCoordinator, ParticleBuffer, TargetSet) {
        let original = line(n, 1.0);
        (
            MorphCoordinator::new(original.clone(), StalePolicy::DropStale),
            ParticleBuffer::from_positions(original.clone()),
            TargetSet::from_cloud(&original),
        )
    }

    #[test]
    fn test_grow_pads_original_and_rests_particles() {
        let (mut morph, mut buffer, mut targets) = setup(3);
        buffer.set_velocity(1, Vec3::splat(4.0));
        buffer.set_position(1, Vec3::splat(99.0));

        let requested = line(5, -2.0);
        let outcome = morph.reconcile(&requested, &mut buffer, &mut targets);

        assert_eq!(outcome, MorphOutcome::Grew { from: 3, to: 5 });
        assert_eq!(buffer.capacity(), 5);
        assert!(buffer.velocities().iter().all(|v| *v == Vec3::ZERO));
        assert_eq!(buffer.position(1), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(buffer.position(3), Vec3::ZERO);
        assert_eq!(buffer.position(4), Vec3::ZERO);
        assert_eq!(targets.explicit_count(), 5);
        assert_eq!(targets.get(4), Vec3::new(4.0, -2.0, 0.0));
        assert_eq!(morph.original().len(), 5);
    }

    #[test]
    fn test_shrink_targets_origin_for_surplus() {
        let (mut morph, mut buffer, mut targets) = setup(4);
        let outcome = morph.reconcile(&line(2, 3.0), &mut buffer, &mut targets);

        assert_eq!(outcome, MorphOutcome::Shrunk { explicit: 2, capacity: 4 });
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(targets.target(1), Target::Explicit(Vec3::new(1.0, 3.0, 0.0)));
        for i in 2..4 {
            assert_eq!(targets.get(i), Vec3::ZERO);
        }
    }

    #[test]
    fn test_equal_size_replaces_in_place() {
        let (mut morph, mut buffer, mut targets) = setup(2);
        buffer.set_velocity(0, Vec3::X);
        let outcome = morph.reconcile(&line(2, 7.0), &mut buffer, &mut targets);

        assert_eq!(outcome, MorphOutcome::Replaced { count: 2 });
        assert_eq!(buffer.velocity(0), Vec3::X);
        assert_eq!(targets.get(1), Vec3::new(1.0, 7.0, 0.0));
    }

    #[test]
    fn test_stale_result_dropped() {
        let (mut morph, mut buffer, mut targets) = setup(2);
        let first = morph.begin_request();
        let second = morph.begin_request();

        let outcome = morph.apply(first, &line(6, 0.0), &mut buffer, &mut targets);
        assert_eq!(
            outcome,
            MorphOutcome::Stale {
                generation: first,
                latest: second
            }
        );
        assert_eq!(buffer.capacity(), 2);

        let outcome = morph.apply(second, &line(2, 5.0), &mut buffer, &mut targets);
        assert_eq!(outcome, MorphOutcome::Replaced { count: 2 });
    }

    #[test]
    fn test_last_resolved_wins_applies_old_generation() {
        let original = line(2, 0.0);
        let mut morph = MorphCoordinator::new(original.clone(), StalePolicy::LastResolvedWins);
        let mut buffer = ParticleBuffer::from_positions(original.clone());
        let mut targets = TargetSet::from_cloud(&original);

        let first = morph.begin_request();
        morph.begin_request();
        let outcome = morph.apply(first, &line(3, 0.0), &mut buffer, &mut targets);
        assert_eq!(outcome, MorphOutcome::Grew { from: 2, to: 3 });
    }
}
