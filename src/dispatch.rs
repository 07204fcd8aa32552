//! Timer-driven realization of a [`Timeline`] plus the particle lifetime ledger.
//!
//! One frame callback polls both: `Dispatcher::due` hands out every entry whose offset
//! has elapsed, `Lifetimes::drain_expired` hands back every particle whose removal time
//! has passed. Thousands of hearts cost two cursors instead of thousands of timers.
//!
//! Browsers stop animation frames in hidden tabs. Entries whose whole lifetime already
//! lies behind the clock when their frame finally comes are dropped, not replayed.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::timeline::{ScheduledSpawn, Timeline};

#[derive(Debug)]
pub struct Dispatcher {
    timeline: Timeline,
    cursor: usize,
    started_at_ms: f64,
}

impl Dispatcher {
    pub fn new(timeline: Timeline, started_at_ms: f64) -> Self {
        Self { timeline, cursor: 0, started_at_ms }
    }

    /// Entries that became due since the previous call, in timeline order, and the
    /// number of due entries skipped because they would already have been removed.
    pub fn due(
        &mut self,
        now_ms: f64,
        grace_ms: f64,
    ) -> (impl Iterator<Item = &ScheduledSpawn> + '_, usize) {
        let elapsed = now_ms - self.started_at_ms;
        let start = self.cursor;
        let entries = self.timeline.entries();
        let count = entries[start..].iter().take_while(|e| e.offset_ms <= elapsed).count();
        self.cursor += count;

        let batch = &entries[start..start + count];
        let gone = move |e: &ScheduledSpawn| e.offset_ms + e.request.lifetime_ms(grace_ms) <= elapsed;
        let missed = batch.iter().filter(|e| gone(e)).count();
        (batch.iter().filter(move |e| !gone(e)), missed)
    }

    pub fn remaining(&self) -> usize {
        self.timeline.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.timeline.len()
    }
}

struct Expiry<H> {
    at_ms: f64,
    seq: u64,
    handle: H,
}

impl<H> PartialEq for Expiry<H> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<H> Eq for Expiry<H> {}

impl<H> PartialOrd for Expiry<H> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<H> Ord for Expiry<H> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at_ms.total_cmp(&other.at_ms).then(self.seq.cmp(&other.seq))
    }
}

/// Live particles keyed by removal time. Each handle comes out exactly once.
pub struct Lifetimes<H> {
    heap: BinaryHeap<Reverse<Expiry<H>>>,
    next_seq: u64,
}

impl<H> Default for Lifetimes<H> {
    fn default() -> Self {
        Self { heap: BinaryHeap::new(), next_seq: 0 }
    }
}

impl<H> Lifetimes<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a particle spawned at `spawned_at_ms`; returns its removal time.
    pub fn track(&mut self, handle: H, spawned_at_ms: f64, lifetime_ms: f64) -> f64 {
        let at_ms = spawned_at_ms + lifetime_ms;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Expiry { at_ms, seq, handle }));
        at_ms
    }

    /// Pop every particle whose removal time is `<= now_ms`, oldest first.
    pub fn drain_expired(&mut self, now_ms: f64) -> impl Iterator<Item = H> + '_ {
        std::iter::from_fn(move || {
            if self.heap.peek()?.0.at_ms <= now_ms {
                self.heap.pop().map(|Reverse(e)| e.handle)
            } else {
                None
            }
        })
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CelebrationConfig;
    use crate::stage::Viewport;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_config() -> CelebrationConfig {
        let mut cfg = CelebrationConfig::default();
        cfg.timeline.sequences = 1;
        cfg.timeline.pops_per_sequence = 2;
        cfg.timeline.burst_count = 10;
        cfg.timeline.stream_count = 5;
        cfg
    }

    fn released(d: &mut Dispatcher, now_ms: f64) -> (usize, usize) {
        let (batch, missed) = d.due(now_ms, 150.0);
        (batch.count(), missed)
    }

    #[test]
    fn due_releases_in_batches_by_elapsed_time() {
        let cfg = small_config();
        let mut rng = StdRng::seed_from_u64(9);
        let tl = Timeline::build(&cfg, Viewport { width: 100.0, height: 100.0 }, &mut rng);
        let total = tl.len();
        let mut d = Dispatcher::new(tl, 1000.0);

        assert_eq!(released(&mut d, 999.0), (0, 0));
        // offsets 0..=4 of the first pop
        assert_eq!(released(&mut d, 1004.0), (5, 0));
        assert_eq!(released(&mut d, 1004.0), (0, 0));
        assert_eq!(d.remaining(), total - 5);
        // Stream ends at 2000 + 8000 + 24; every heart is done by then.
        let (_, rest) = released(&mut d, 1_000_000.0);
        assert_eq!(rest + 5, total);
        assert!(d.is_exhausted());
        assert_eq!(d.remaining(), 0);
    }

    #[test]
    fn late_entries_still_alive_are_released() {
        let cfg = small_config();
        let mut rng = StdRng::seed_from_u64(11);
        let tl = Timeline::build(&cfg, Viewport { width: 100.0, height: 100.0 }, &mut rng);
        let mut d = Dispatcher::new(tl, 0.0);
        // First pop (offsets 0..=9) is late by 500ms but each heart lives >= 1350ms.
        assert_eq!(released(&mut d, 509.0), (10, 0));
    }

    #[test]
    fn lifetimes_release_each_handle_once_in_order() {
        let mut l = Lifetimes::new();
        l.track("b", 0.0, 200.0);
        l.track("a", 0.0, 100.0);
        l.track("c", 50.0, 150.0);

        assert_eq!(l.drain_expired(99.0).count(), 0);
        assert_eq!(l.drain_expired(200.0).collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(l.is_empty());
        assert_eq!(l.drain_expired(1e9).count(), 0);
    }

    #[test]
    fn equal_expiry_keeps_insertion_order() {
        let mut l = Lifetimes::new();
        for i in 0..4 {
            l.track(i, 10.0, 10.0);
        }
        assert_eq!(l.drain_expired(20.0).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }
}
