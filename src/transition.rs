//! Freeze/explode state machine.
//!
//! ```text
//!            trigger_explode()
//!   Normal ─────────────────────▶ Frozen
//!      ▲                            │
//!      └──────────── cancel() ──────┘
//! ```
//!
//! Exploding hands every particle a random velocity and schedules two timed
//! events: a fade-in of the exit overlay and the exit itself. Cancelling
//! returns to normal physics but leaves those events scheduled, so a cancel
//! only buys time until the exit fires.

use std::time::Duration;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buffer::ParticleBuffer;
use crate::scheduler::Scheduler;

/// Physics mode of the whole field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    /// Spring toward targets, damping and pointer repulsion.
    #[default]
    Normal,
    /// Ballistic drift at the last assigned velocity.
    Frozen,
}

/// Side effects the controller schedules for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent {
    /// Start fading the overlay from transparent to opaque over `duration`.
    FadeIn { duration: Duration },
    /// Leave the scene for `destination`.
    Exit { destination: String },
}

/// Explosion and exit timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionConfig {
    /// Width of the uniform range each velocity axis is drawn from,
    /// centred on zero.
    pub speed: f32,
    pub fade_delay_ms: u64,
    pub fade_duration_ms: u64,
    pub exit_delay_ms: u64,
    pub destination: String,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            speed: 30.0,
            fade_delay_ms: 500,
            fade_duration_ms: 1000,
            exit_delay_ms: 1500,
            destination: "https://www.liennguyendesign.com/work".to_string(),
        }
    }
}

impl ExplosionConfig {
    pub fn fade_delay(&self) -> Duration {
        Duration::from_millis(self.fade_delay_ms)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }
}

/// Drives [`TransitionState`] and schedules the exit sequence.
#[derive(Debug, Clone)]
pub struct TransitionController {
    state: TransitionState,
    config: ExplosionConfig,
}

impl TransitionController {
    pub fn new(config: ExplosionConfig) -> Self {
        Self {
            state: TransitionState::Normal,
            config,
        }
    }

    #[inline]
    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.state == TransitionState::Frozen
    }

    pub fn config(&self) -> &ExplosionConfig {
        &self.config
    }

    /// Explode with velocities drawn from `rng`, uniform in
    /// `[-speed / 2, speed / 2)` per axis.
    ///
    /// Returns `false` and does nothing if already frozen.
    pub fn trigger_explode<R: Rng + ?Sized>(
        &mut self,
        buffer: &mut ParticleBuffer,
        scheduler: &mut Scheduler<TransitionEvent>,
        now: Duration,
        rng: &mut R,
    ) -> bool {
        let speed = self.config.speed;
        self.trigger_explode_with(buffer, scheduler, now, |_| {
            Vec3::new(
                (rng.gen::<f32>() - 0.5) * speed,
                (rng.gen::<f32>() - 0.5) * speed,
                (rng.gen::<f32>() - 0.5) * speed,
            )
        })
    }

    /// Explode with the velocity of particle `i` given by `impulse(i)`.
    pub fn trigger_explode_with<F>(
        &mut self,
        buffer: &mut ParticleBuffer,
        scheduler: &mut Scheduler<TransitionEvent>,
        now: Duration,
        mut impulse: F,
    ) -> bool
    where
        F: FnMut(usize) -> Vec3,
    {
        match self.state {
            TransitionState::Frozen => {
                log::debug!("explode ignored: already frozen");
                false
            }
            TransitionState::Normal => {
                for i in 0..buffer.capacity() {
                    buffer.set_velocity(i, impulse(i));
                }
                self.state = TransitionState::Frozen;

                scheduler.schedule_after(
                    now,
                    self.config.fade_delay(),
                    TransitionEvent::FadeIn {
                        duration: self.config.fade_duration(),
                    },
                );
                scheduler.schedule_after(
                    now,
                    self.config.exit_delay(),
                    TransitionEvent::Exit {
                        destination: self.config.destination.clone(),
                    },
                );
                log::info!(
                    "exploded {} particles; exit to {} in {:?}",
                    buffer.capacity(),
                    self.config.destination,
                    self.config.exit_delay()
                );
                true
            }
        }
    }

    /// Return to normal physics. Velocities and scheduled events are kept.
    ///
    /// Returns whether the state changed.
    pub fn cancel(&mut self) -> bool {
        let was_frozen = self.is_frozen();
        self.state = TransitionState::Normal;
        if was_frozen {
            log::debug!("freeze cancelled");
        }
        was_frozen
    }

    /// Whether cycling to the next shape is currently allowed.
    pub fn on_shape_advance(&self) -> bool {
        match self.state {
            TransitionState::Normal => true,
            TransitionState::Frozen => {
                log::debug!("shape advance ignored while frozen");
                false
            }
        }
    }
}

/// Opacity ramp of the exit overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FadeOverlay {
    started: Option<Duration>,
    duration: Duration,
}

impl FadeOverlay {
    pub fn start(&mut self, now: Duration, duration: Duration) {
        if self.started.is_none() {
            self.started = Some(now);
            self.duration = duration;
        }
    }

    /// Overlay opacity at `now`, eased from 0 to 1 along [`ease`].
    pub fn opacity(&self, now: Duration) -> f32 {
        let Some(started) = self.started else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = (now.saturating_sub(started).as_secs_f32() / self.duration.as_secs_f32())
            .clamp(0.0, 1.0);
        ease(t)
    }
}

/// The CSS `ease` timing function, `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
///
/// `x` is the fraction of elapsed time in `[0, 1]`; returns the eased progress.
pub fn ease(x: f32) -> f32 {
    const X1: f32 = 0.25;
    const Y1: f32 = 0.1;
    const X2: f32 = 0.25;
    const Y2: f32 = 1.0;

    fn bezier(t: f32, p1: f32, p2: f32) -> f32 {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    }

    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    // x(t) is monotonic for these control points, so bisection always converges.
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..24 {
        let mid = 0.5 * (lo + hi);
        if bezier(mid, X1, X2) < x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    bezier(0.5 * (lo + hi), Y1, Y2)
}
