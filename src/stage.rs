//! The page-facing side of the celebration.
//!
//! [`Celebration`](crate::celebration::Celebration) never touches the DOM directly; it
//! goes through a `Stage`. The browser implementation lives in [`crate::dom`], tests use
//! a recording fake.

use crate::config::{AudioConfig, CelebrationConfig};
use crate::particle::ParticleSpawnRequest;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

pub trait Stage {
    /// Handle to a live particle, given back to [`Stage::remove`] exactly once.
    type Particle;

    /// `prefers-reduced-motion: reduce`
    fn prefers_reduced_motion(&self) -> bool;

    fn viewport(&self) -> Viewport;

    /// Overlay layers, body class, hidden trigger. Must be safe to call repeatedly.
    fn prepare(&mut self, config: &CelebrationConfig);

    /// Start background music. Failures are swallowed by the implementation.
    fn start_audio(&mut self, config: &AudioConfig);

    /// Create and animate one heart. `None` when the element could not be created.
    fn spawn(&mut self, request: &ParticleSpawnRequest, config: &CelebrationConfig) -> Option<Self::Particle>;

    fn remove(&mut self, particle: Self::Particle);
}
