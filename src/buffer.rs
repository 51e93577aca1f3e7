//! Live particle state.
//!
//! [`ParticleBuffer`] owns positions and velocities; [`TargetSet`] holds
//! where each slot wants to go. The buffer's capacity never shrinks: when a
//! smaller shape is requested, surplus slots are pointed at the origin through
//! [`Target::ImplicitOrigin`] rather than removed.

use glam::Vec3;

/// Where a single particle slot is steering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// A point from the current shape.
    Explicit(Vec3),
    /// No point assigned; the slot drifts back to the origin.
    ImplicitOrigin,
}

impl Target {
    #[inline]
    pub fn resolve(self) -> Vec3 {
        match self {
            Target::Explicit(p) => p,
            Target::ImplicitOrigin => Vec3::ZERO,
        }
    }
}

/// Per-slot targets. Reads past the stored length resolve to the origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSet {
    entries: Vec<Target>,
    explicit: usize,
}

impl TargetSet {
    /// Every point of `cloud` becomes an explicit target.
    pub fn from_cloud(cloud: &[Vec3]) -> Self {
        Self {
            entries: cloud.iter().copied().map(Target::Explicit).collect(),
            explicit: cloud.len(),
        }
    }

    /// Replace all targets: the first `cloud.len()` slots get the cloud, the
    /// rest up to `capacity` fall back to the origin.
    pub fn retarget(&mut self, cloud: &[Vec3], capacity: usize) {
        debug_assert!(cloud.len() <= capacity);
        self.entries.clear();
        self.entries.extend(cloud.iter().copied().map(Target::Explicit));
        self.entries
            .resize(capacity.max(cloud.len()), Target::ImplicitOrigin);
        self.explicit = cloud.len();
    }

    /// Target for slot `index`.
    #[inline]
    pub fn target(&self, index: usize) -> Target {
        self.entries
            .get(index)
            .copied()
            .unwrap_or(Target::ImplicitOrigin)
    }

    /// Resolved target position for slot `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Vec3 {
        self.target(index).resolve()
    }

    /// Number of slots with an explicit target.
    pub fn explicit_count(&self) -> usize {
        self.explicit
    }

    /// Number of stored entries (explicit plus implicit).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Target> + '_ {
        self.entries.iter().copied()
    }
}

/// Positions and velocities of every allocated particle slot.
#[derive(Debug, Clone, Default)]
pub struct ParticleBuffer {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    dirty: bool,
}

impl ParticleBuffer {
    /// Allocate one particle per position, at rest.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        let velocities = vec![Vec3::ZERO; positions.len()];
        Self {
            positions,
            velocities,
            dirty: true,
        }
    }

    /// Number of allocated slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn position(&self, index: usize) -> Vec3 {
        self.positions[index]
    }

    pub fn velocity(&self, index: usize) -> Vec3 {
        self.velocities[index]
    }

    pub fn set_velocity(&mut self, index: usize, velocity: Vec3) {
        self.velocities[index] = velocity;
    }

    pub fn set_position(&mut self, index: usize, position: Vec3) {
        self.positions[index] = position;
        self.dirty = true;
    }

    /// Mutable `(index, position, velocity)` view over every slot.
    pub fn particles_mut(&mut self) -> impl Iterator<Item = (usize, &mut Vec3, &mut Vec3)> {
        self.positions
            .iter_mut()
            .zip(self.velocities.iter_mut())
            .enumerate()
            .map(|(i, (p, v))| (i, p, v))
    }

    /// Replace every position with `positions` and bring every particle to
    /// rest. `positions` must not be shorter than the current capacity.
    pub fn regrow(&mut self, positions: Vec<Vec3>) {
        assert!(
            positions.len() >= self.positions.len(),
            "particle capacity cannot shrink ({} -> {})",
            self.positions.len(),
            positions.len()
        );
        self.velocities.clear();
        self.velocities.resize(positions.len(), Vec3::ZERO);
        self.positions = positions;
        self.dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}
