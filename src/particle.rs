//! Heart particles: randomization ranges, spawn requests and their animation shape.
//!
//! A [`ParticleSpawnRequest`] is fully resolved when it is created (every field drawn
//! from a [`SpawnProfile`] unless overridden) and never changes afterwards. The DOM
//! side only reads it to build the element and its keyframes.

use rand::Rng;

use crate::config::ConfigError;

/// Extra time a particle stays in the DOM after its animation ends.
pub const REMOVAL_GRACE_MS: f64 = 150.0;

/// Easing curve shared by every particle animation.
pub const EASING: &str = "cubic-bezier(.18,.9,.25,1)";
/// Keep the final keyframe applied once the animation finishes.
pub const FILL: &str = "forwards";

/// Position of the peak keyframe within the animation (0..1).
const PEAK_OFFSET: f64 = 0.45;
/// The landing keyframe never rises more than this above the origin.
const MAX_LANDING_RISE: f64 = 80.0;

/// Closed interval `[min, max]` sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `[-half, half]`
    pub const fn symmetric(half: f64) -> Self {
        Self { min: -half, max: half }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    pub(crate) fn validate(&self, field: String) -> Result<(), ConfigError> {
        for value in [self.min, self.max] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        if self.min > self.max {
            return Err(ConfigError::InvertedRange { field, min: self.min, max: self.max });
        }
        // Uniform sampling needs a finite width.
        if !(self.max - self.min).is_finite() {
            return Err(ConfigError::RangeTooWide { field, min: self.min, max: self.max });
        }
        Ok(())
    }
}

/// Randomization ranges for one family of particles (single spawn, pop, trailing stream).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnProfile {
    /// Offset applied independently to x and y of the origin.
    pub jitter: ParamRange,
    pub dx: ParamRange,
    pub dy_up: ParamRange,
    pub dy_down: ParamRange,
    pub rot: ParamRange,
    pub size: ParamRange,
    pub duration_ms: ParamRange,
}

impl SpawnProfile {
    /// Used by a lone [`spawn_one`](crate::celebration::Celebration::spawn_one) call.
    pub const SINGLE: SpawnProfile = SpawnProfile {
        jitter: ParamRange::symmetric(90.0),
        dx: ParamRange::symmetric(820.0),
        dy_up: ParamRange::new(140.0, 720.0),
        dy_down: ParamRange::new(120.0, 560.0),
        rot: ParamRange::symmetric(480.0),
        size: ParamRange::new(32.0, 96.0),
        duration_ms: ParamRange::new(1200.0, 2600.0),
    };

    /// Center bursts: wider spread, bigger hearts.
    pub const POP: SpawnProfile = SpawnProfile {
        jitter: ParamRange::symmetric(90.0),
        dx: ParamRange::symmetric(900.0),
        dy_up: ParamRange::new(120.0, 760.0),
        dy_down: ParamRange::new(140.0, 580.0),
        rot: ParamRange::symmetric(520.0),
        size: ParamRange::new(34.0, 104.0),
        duration_ms: ParamRange::new(1200.0, 2600.0),
    };

    /// Trailing stream after the last sequence.
    pub const STREAM: SpawnProfile = SpawnProfile {
        jitter: ParamRange::symmetric(100.0),
        dx: ParamRange::symmetric(840.0),
        dy_up: ParamRange::new(120.0, 660.0),
        dy_down: ParamRange::new(160.0, 520.0),
        rot: ParamRange::symmetric(500.0),
        size: ParamRange::new(30.0, 96.0),
        duration_ms: ParamRange::new(1200.0, 2600.0),
    };

    pub(crate) fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let fields = [
            ("jitter", &self.jitter),
            ("dx", &self.dx),
            ("dy_up", &self.dy_up),
            ("dy_down", &self.dy_down),
            ("rot", &self.rot),
            ("size", &self.size),
            ("duration_ms", &self.duration_ms),
        ];
        for (field, range) in fields {
            range.validate(format!("{name}.{field}"))?;
        }
        if self.duration_ms.min < 0.0 {
            return Err(ConfigError::Negative {
                field: format!("{name}.duration_ms"),
                value: self.duration_ms.min,
            });
        }
        Ok(())
    }
}

impl Default for SpawnProfile {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// Per-call parameter overrides. `None` means "draw from the profile".
/// Values are taken as-is; nonsense input just produces odd-looking hearts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpawnOverrides {
    pub dx: Option<f64>,
    pub dy_up: Option<f64>,
    pub dy_down: Option<f64>,
    pub rot: Option<f64>,
    pub size: Option<f64>,
    pub duration_ms: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One fully-resolved heart. `x`/`y` already include the origin jitter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSpawnRequest {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy_up: f64,
    pub dy_down: f64,
    pub rot: f64,
    pub size: f64,
    pub duration_ms: f64,
    /// Index into the configured heart image list.
    pub image: usize,
}

impl ParticleSpawnRequest {
    pub fn resolve<R: Rng + ?Sized>(
        origin: Point,
        profile: &SpawnProfile,
        overrides: &SpawnOverrides,
        image_count: usize,
        rng: &mut R,
    ) -> Self {
        let x = origin.x + profile.jitter.sample(rng);
        let y = origin.y + profile.jitter.sample(rng);
        let mut pick = |value: Option<f64>, range: &ParamRange| match value {
            Some(v) => v,
            None => range.sample(rng),
        };
        let size = pick(overrides.size, &profile.size);
        let dx = pick(overrides.dx, &profile.dx);
        let dy_up = pick(overrides.dy_up, &profile.dy_up);
        let dy_down = pick(overrides.dy_down, &profile.dy_down);
        let rot = pick(overrides.rot, &profile.rot);
        let duration_ms = pick(overrides.duration_ms, &profile.duration_ms);
        let image = if image_count == 0 { 0 } else { rng.gen_range(0..image_count) };
        Self { x, y, dx, dy_up, dy_down, rot, size, duration_ms, image }
    }

    /// Time from spawn until the element is removed.
    pub fn lifetime_ms(&self, grace_ms: f64) -> f64 {
        self.duration_ms + grace_ms
    }

    /// Vertical translation of the last keyframe (negative is up).
    pub fn landing_dy(&self) -> f64 {
        (self.dy_down - self.dy_up).max(-MAX_LANDING_RISE)
    }

    /// Rise to a peak at 45%, then drift down and fade out.
    pub fn keyframes(&self) -> [Keyframe; 3] {
        [
            Keyframe {
                transform: "translate(0px, 0px) rotate(0deg) scale(0.9)".to_string(),
                opacity: 0.0,
                offset: None,
            },
            Keyframe {
                transform: format!(
                    "translate({}px, {}px) rotate({}deg) scale(1.1)",
                    self.dx * PEAK_OFFSET,
                    -self.dy_up,
                    self.rot * 0.6
                ),
                opacity: 1.0,
                offset: Some(PEAK_OFFSET),
            },
            Keyframe {
                transform: format!(
                    "translate({}px, {}px) rotate({}deg) scale(0.95)",
                    self.dx,
                    self.landing_dy(),
                    self.rot
                ),
                opacity: 0.0,
                offset: None,
            },
        ]
    }
}

/// A single Web Animations keyframe.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub transform: String,
    pub opacity: f64,
    pub offset: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn request(dy_up: f64, dy_down: f64) -> ParticleSpawnRequest {
        ParticleSpawnRequest {
            x: 0.0,
            y: 0.0,
            dx: 200.0,
            dy_up,
            dy_down,
            rot: 100.0,
            size: 40.0,
            duration_ms: 1500.0,
            image: 0,
        }
    }

    #[test]
    fn degenerate_range_returns_min() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(ParamRange::new(5.0, 5.0).sample(&mut rng), 5.0);
    }

    #[test]
    fn overrides_win_over_profile() {
        let mut rng = StdRng::seed_from_u64(7);
        let overrides = SpawnOverrides { size: Some(12.0), duration_ms: Some(300.0), ..Default::default() };
        let req = ParticleSpawnRequest::resolve(
            Point::new(100.0, 100.0),
            &SpawnProfile::SINGLE,
            &overrides,
            4,
            &mut rng,
        );
        assert_eq!(req.size, 12.0);
        assert_eq!(req.duration_ms, 300.0);
        assert!(SpawnProfile::SINGLE.dx.contains(req.dx));
        assert!((req.x - 100.0).abs() <= 90.0);
        assert!(req.image < 4);
    }

    #[test]
    fn landing_never_rises_above_limit() {
        assert_eq!(request(700.0, 120.0).landing_dy(), -80.0);
        assert_eq!(request(200.0, 500.0).landing_dy(), 300.0);
    }

    #[test]
    fn keyframes_shape() {
        let frames = request(300.0, 200.0).keyframes();
        assert_eq!(frames[0].opacity, 0.0);
        assert_eq!(frames[1].offset, Some(0.45));
        assert_eq!(frames[1].transform, "translate(90px, -300px) rotate(60deg) scale(1.1)");
        assert_eq!(frames[2].transform, "translate(200px, -80px) rotate(100deg) scale(0.95)");
        assert_eq!(frames[2].opacity, 0.0);
    }

    #[test]
    fn lifetime_includes_grace() {
        assert_eq!(request(1.0, 1.0).lifetime_ms(REMOVAL_GRACE_MS), 1650.0);
    }
}
