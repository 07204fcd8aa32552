// Timeline shape and randomization bounds, checked on the public API.

use heart_burst::stage::Viewport;
use heart_burst::{CelebrationConfig, ParticleSpawnRequest, Phase, Point, SpawnOverrides, SpawnProfile, Timeline};
use rand::SeedableRng;
use rand::rngs::StdRng;

const VIEWPORT: Viewport = Viewport { width: 1920.0, height: 1080.0 };

fn build(seed: u64) -> Timeline {
    let mut rng = StdRng::seed_from_u64(seed);
    Timeline::build(&CelebrationConfig::default(), VIEWPORT, &mut rng)
}

fn offsets(tl: &Timeline, phase: Phase) -> Vec<f64> {
    tl.entries()
        .iter()
        .filter(|e| e.phase == phase)
        .map(|e| e.offset_ms)
        .collect()
}

#[test]
fn total_is_sequences_times_pops_times_burst_plus_stream() {
    assert_eq!(build(1).len(), 2 * 3 * 420 + 220);
}

#[test]
fn pop_starts_follow_the_closed_form() {
    let tl = build(2);
    let expected = [
        (0, 0, 0.0),
        (0, 1, 2000.0),
        (0, 2, 4000.0),
        (1, 0, 12420.0),
        (1, 1, 14420.0),
        (1, 2, 16420.0),
    ];
    for (sequence, pop, start) in expected {
        let o = offsets(&tl, Phase::Pop { sequence, pop });
        assert_eq!(o.len(), 420);
        assert_eq!(o[0], start);
        assert_eq!(o[419], start + 419.0);
    }
}

#[test]
fn quiet_gap_after_each_sequence_is_exactly_eight_seconds() {
    let tl = build(3);
    let t = &CelebrationConfig::default().timeline;

    let seq0_last_pop_end = offsets(&tl, Phase::Pop { sequence: 0, pop: 2 })[0] + t.pop_emit_duration_ms();
    let seq1_first = offsets(&tl, Phase::Pop { sequence: 1, pop: 0 })[0];
    assert_eq!(seq0_last_pop_end, 4420.0);
    assert_eq!(seq1_first - seq0_last_pop_end, 8000.0);

    let seq1_last_pop_end = offsets(&tl, Phase::Pop { sequence: 1, pop: 2 })[0] + t.pop_emit_duration_ms();
    let stream = offsets(&tl, Phase::Stream);
    assert_eq!(seq1_last_pop_end, 16840.0);
    assert_eq!(stream[0] - seq1_last_pop_end, 8000.0);
}

#[test]
fn trailing_stream_runs_six_ms_apart() {
    let stream = offsets(&build(4), Phase::Stream);
    assert_eq!(stream.len(), 220);
    assert_eq!(stream[0], 24840.0);
    assert!(stream.windows(2).all(|w| w[1] - w[0] == 6.0));
    assert_eq!(*stream.last().unwrap(), 26154.0);
    assert_eq!(stream[0] + 220.0 * 6.0, 26160.0);
}

#[test]
fn scheduled_hearts_use_their_phase_profile() {
    let cfg = CelebrationConfig::default();
    let origin = cfg.timeline.origin(VIEWPORT);
    for e in build(5).entries() {
        let profile = match e.phase {
            Phase::Pop { .. } => &cfg.pop,
            Phase::Stream => &cfg.stream,
        };
        let r = &e.request;
        assert!(profile.jitter.contains(r.x - origin.x));
        assert!(profile.jitter.contains(r.y - origin.y));
        assert!(profile.dx.contains(r.dx));
        assert!(profile.size.contains(r.size));
        assert!(r.image < cfg.assets.hearts.len());
    }
}

#[test]
fn ten_thousand_draws_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(10_000);
    for profile in [SpawnProfile::SINGLE, SpawnProfile::POP, SpawnProfile::STREAM] {
        for _ in 0..10_000 {
            let r = ParticleSpawnRequest::resolve(Point::default(), &profile, &SpawnOverrides::default(), 4, &mut rng);
            assert!(profile.jitter.contains(r.x), "x {} out of {:?}", r.x, profile.jitter);
            assert!(profile.jitter.contains(r.y), "y {} out of {:?}", r.y, profile.jitter);
            assert!(profile.dx.contains(r.dx), "dx {}", r.dx);
            assert!(profile.dy_up.contains(r.dy_up), "dy_up {}", r.dy_up);
            assert!(profile.dy_down.contains(r.dy_down), "dy_down {}", r.dy_down);
            assert!(profile.rot.contains(r.rot), "rot {}", r.rot);
            assert!(profile.size.contains(r.size), "size {}", r.size);
            assert!(profile.duration_ms.contains(r.duration_ms), "duration {}", r.duration_ms);
            assert!(r.image < 4);
        }
    }
}
