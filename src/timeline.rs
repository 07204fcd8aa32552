//! Closed-form burst timeline.
//!
//! The whole celebration is generated up front: every heart gets an absolute offset
//! (milliseconds after the trigger) and a resolved [`ParticleSpawnRequest`]. Nothing is
//! adjusted once built; the dispatcher only walks the list.
//!
//! Shape with the default config:
//! - sequence `s` starts at `s * (2*2000 + 420 + 8000)`, i.e. 0 and 12420
//! - pops inside a sequence start at 0, 2000, 4000 and emit 420 hearts 1ms apart
//! - the trailing stream starts at 24840 and emits 220 hearts 6ms apart

use rand::Rng;

use crate::config::{CelebrationConfig, MAX_PARTICLES, TimelineConfig};
use crate::particle::{ParticleSpawnRequest, Point, SpawnOverrides, SpawnProfile};
use crate::stage::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Pop { sequence: u32, pop: u32 },
    Stream,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledSpawn {
    /// Milliseconds after the trigger.
    pub offset_ms: f64,
    pub phase: Phase,
    pub request: ParticleSpawnRequest,
}

impl TimelineConfig {
    /// Time between the first heart of a pop and the moment it is done emitting.
    pub fn pop_emit_duration_ms(&self) -> f64 {
        self.burst_count as f64 * self.pop_spawn_step_ms
    }

    /// Start of the last pop of a sequence, relative to the sequence.
    pub fn last_pop_start_ms(&self) -> f64 {
        self.pops_per_sequence.saturating_sub(1) as f64 * self.pop_gap_ms
    }

    /// Sequence start to next sequence start (last pop end plus the quiet gap).
    pub fn sequence_period_ms(&self) -> f64 {
        self.last_pop_start_ms() + self.pop_emit_duration_ms() + self.sequence_gap_ms
    }

    pub fn sequence_start_ms(&self, sequence: u32) -> f64 {
        sequence as f64 * self.sequence_period_ms()
    }

    pub fn pop_start_ms(&self, sequence: u32, pop: u32) -> f64 {
        self.sequence_start_ms(sequence) + pop as f64 * self.pop_gap_ms
    }

    pub fn stream_start_ms(&self) -> f64 {
        self.sequence_start_ms(self.sequences)
    }

    /// Saturates instead of wrapping for absurd counts.
    pub fn total_particles(&self) -> u64 {
        u64::from(self.sequences)
            .saturating_mul(u64::from(self.pops_per_sequence))
            .saturating_mul(u64::from(self.burst_count))
            .saturating_add(u64::from(self.stream_count))
    }

    pub fn origin(&self, viewport: Viewport) -> Point {
        Point::new(viewport.width * self.origin_x_frac, viewport.height * self.origin_y_frac)
    }
}

/// Ordered list of every heart of one celebration.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    entries: Vec<ScheduledSpawn>,
}

impl Timeline {
    pub fn build<R: Rng + ?Sized>(config: &CelebrationConfig, viewport: Viewport, rng: &mut R) -> Self {
        let t = &config.timeline;
        let origin = t.origin(viewport);
        let images = config.assets.hearts.len();
        let capacity = t.total_particles().min(MAX_PARTICLES) as usize;
        let mut entries = Vec::with_capacity(capacity);

        let mut push = |offset_ms: f64, phase: Phase, profile: &SpawnProfile, rng: &mut R| {
            let request = ParticleSpawnRequest::resolve(origin, profile, &SpawnOverrides::default(), images, rng);
            entries.push(ScheduledSpawn { offset_ms, phase, request });
        };

        for sequence in 0..t.sequences {
            for pop in 0..t.pops_per_sequence {
                let pop_start = t.pop_start_ms(sequence, pop);
                for i in 0..t.burst_count {
                    let offset = pop_start + i as f64 * t.pop_spawn_step_ms;
                    push(offset, Phase::Pop { sequence, pop }, &config.pop, rng);
                }
            }
        }

        let stream_start = t.stream_start_ms();
        for i in 0..t.stream_count {
            push(stream_start + i as f64 * t.stream_spawn_step_ms, Phase::Stream, &config.stream, rng);
        }

        // Pops may overlap when a burst outlasts the pop gap; keep dispatch order monotonic.
        entries.sort_by(|a, b| a.offset_ms.total_cmp(&b.offset_ms));
        Self { entries }
    }

    pub fn entries(&self) -> &[ScheduledSpawn] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
