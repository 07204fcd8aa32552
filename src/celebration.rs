//! The one-shot celebration controller.
//!
//! Owns everything that used to be loose page state: the "already celebrated" flag,
//! the RNG, the armed timeline and the set of live hearts. The page drives it by
//! calling [`Celebration::tick`] once per animation frame.

use rand::rngs::StdRng;
use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::config::CelebrationConfig;
use crate::dispatch::{Dispatcher, Lifetimes};
use crate::particle::{ParticleSpawnRequest, Point, SpawnOverrides};
use crate::stage::Stage;
use crate::timeline::Timeline;

/// Flips to `true` on the first trigger and stays there for the page lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CelebrationState {
    celebrated: bool,
}

impl CelebrationState {
    pub fn has_celebrated(&self) -> bool {
        self.celebrated
    }

    /// Returns `true` only for the call that performed the transition.
    pub fn mark(&mut self) -> bool {
        !std::mem::replace(&mut self.celebrated, true)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Layers and music are up and `scheduled` hearts are queued.
    Started { scheduled: usize },
    /// Layers and music are up; no hearts because the user asked for reduced motion.
    ReducedMotion,
    AlreadyCelebrated,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: usize,
    pub removed: usize,
    /// Due hearts dropped because their lifetime had already passed (frames paused).
    pub skipped: usize,
}

pub struct Celebration<S: Stage, C: Clock> {
    config: CelebrationConfig,
    stage: S,
    clock: C,
    rng: StdRng,
    state: CelebrationState,
    dispatch: Option<Dispatcher>,
    lifetimes: Lifetimes<S::Particle>,
}

impl<S: Stage, C: Clock> Celebration<S, C> {
    pub fn new(config: CelebrationConfig, stage: S, clock: C, rng: StdRng) -> Self {
        Self {
            config,
            stage,
            clock,
            rng,
            state: CelebrationState::default(),
            dispatch: None,
            lifetimes: Lifetimes::new(),
        }
    }

    pub fn trigger(&mut self) -> TriggerOutcome {
        if !self.state.mark() {
            debug!("celebration already triggered, ignoring");
            return TriggerOutcome::AlreadyCelebrated;
        }

        self.stage.prepare(&self.config);
        self.stage.start_audio(&self.config.audio);

        if self.stage.prefers_reduced_motion() {
            info!("reduced motion requested, skipping hearts");
            return TriggerOutcome::ReducedMotion;
        }

        let viewport = self.stage.viewport();
        let timeline = Timeline::build(&self.config, viewport, &mut self.rng);
        let scheduled = timeline.len();
        let now = self.clock.now_ms();
        info!(scheduled, width = viewport.width, height = viewport.height, "celebration started");
        self.dispatch = Some(Dispatcher::new(timeline, now));
        TriggerOutcome::Started { scheduled }
    }

    /// One heart at `origin` (plus jitter) using the single-spawn profile.
    /// Returns `false` if the stage could not create it.
    pub fn spawn_one(&mut self, origin: Point, overrides: &SpawnOverrides) -> bool {
        let request = ParticleSpawnRequest::resolve(
            origin,
            &self.config.single,
            overrides,
            self.config.assets.hearts.len(),
            &mut self.rng,
        );
        let now = self.clock.now_ms();
        match self.stage.spawn(&request, &self.config) {
            Some(particle) => {
                self.lifetimes
                    .track(particle, now, request.lifetime_ms(self.config.removal_grace_ms));
                true
            }
            None => false,
        }
    }

    /// Release due hearts, then remove expired ones.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let mut report = TickReport::default();

        if let Some(dispatch) = self.dispatch.as_mut() {
            let grace = self.config.removal_grace_ms;
            let (due, skipped) = dispatch.due(now, grace);
            report.skipped = skipped;
            for entry in due {
                // Lifetime counts from the actual spawn, never from the planned offset.
                if let Some(particle) = self.stage.spawn(&entry.request, &self.config) {
                    self.lifetimes.track(particle, now, entry.request.lifetime_ms(grace));
                    report.spawned += 1;
                }
            }
            if dispatch.is_exhausted() {
                info!("celebration timeline finished");
                self.dispatch = None;
            }
        }

        for particle in self.lifetimes.drain_expired(now) {
            self.stage.remove(particle);
            report.removed += 1;
        }

        if report.skipped > 0 {
            debug!(skipped = report.skipped, "frames were paused, dropped expired hearts");
        }
        if report.spawned > 0 || report.removed > 0 {
            trace!(spawned = report.spawned, removed = report.removed, live = self.lifetimes.len(), "tick");
        }
        report
    }

    /// Nothing queued and nothing alive; the frame loop may stop.
    pub fn is_idle(&self) -> bool {
        self.dispatch.is_none() && self.lifetimes.is_empty()
    }

    pub fn has_celebrated(&self) -> bool {
        self.state.has_celebrated()
    }

    pub fn pending_spawns(&self) -> usize {
        self.dispatch.as_ref().map_or(0, Dispatcher::remaining)
    }

    pub fn live_particles(&self) -> usize {
        self.lifetimes.len()
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_flips_once() {
        let mut s = CelebrationState::default();
        assert!(!s.has_celebrated());
        assert!(s.mark());
        assert!(!s.mark());
        assert!(s.has_celebrated());
    }
}
