//! Every tunable of the celebration in one place.
//!
//! `CelebrationConfig::default()` is the page as shipped. With the `serde_json` feature a
//! partial JSON document can be merged over the defaults (missing keys keep their
//! default value).

use thiserror::Error;

use crate::particle::{REMOVAL_GRACE_MS, SpawnProfile};

/// Upper bound on the hearts a single timeline may schedule.
pub const MAX_PARTICLES: u64 = 100_000;

/// Problems found while loading or validating a [`CelebrationConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("range `{field}` is inverted: min {min} > max {max}")]
    InvertedRange { field: String, min: f64, max: f64 },

    #[error("`{field}` must be finite, got {value}")]
    NonFinite { field: String, value: f64 },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: String, value: f64 },

    #[error("`{field}` must be greater than zero, got {value}")]
    NonPositive { field: String, value: f64 },

    #[error("range `{field}` is too wide to sample: {min}..={max}")]
    RangeTooWide { field: String, min: f64, max: f64 },

    #[error("timeline would schedule {total} hearts, the limit is {max}")]
    TooManyParticles { total: u64, max: u64 },

    #[error("volume ceiling {0} is outside 0..=1")]
    VolumeOutOfRange(f64),

    #[error("no heart images configured")]
    NoHeartImages,

    #[error("invalid config JSON: {0}")]
    Json(String),
}

/// Macro-structure of the burst timeline. All times in milliseconds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimelineConfig {
    pub sequences: u32,
    pub pops_per_sequence: u32,
    /// Distance between consecutive pop starts.
    pub pop_gap_ms: f64,
    /// Hearts per pop.
    pub burst_count: u32,
    pub pop_spawn_step_ms: f64,
    /// Quiet time after the last pop of a sequence has finished emitting.
    pub sequence_gap_ms: f64,
    /// Hearts in the trailing stream.
    pub stream_count: u32,
    pub stream_spawn_step_ms: f64,
    /// Burst origin as a fraction of the viewport.
    pub origin_x_frac: f64,
    pub origin_y_frac: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            sequences: 2,
            pops_per_sequence: 3,
            pop_gap_ms: 2000.0,
            burst_count: 420,
            pop_spawn_step_ms: 1.0,
            sequence_gap_ms: 8000.0,
            stream_count: 220,
            stream_spawn_step_ms: 6.0,
            origin_x_frac: 0.5,
            origin_y_frac: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AudioConfig {
    pub src: String,
    pub looped: bool,
    pub volume_ceiling: f64,
    pub volume_step: f64,
    pub fade_interval_ms: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            src: "assets/music.mp3".to_string(),
            looped: true,
            volume_ceiling: 0.45,
            volume_step: 0.02,
            fade_interval_ms: 80,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssetConfig {
    pub hearts: Vec<String>,
    /// Static decorations shown in the cute layer (classes c1, c2, ...).
    pub cute: Vec<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            hearts: (1..=4).map(|i| format!("assets/heart{i}.png")).collect(),
            cute: (1..=4).map(|i| format!("assets/cute{i}.png")).collect(),
        }
    }
}

/// Class names and selectors the effect reads from / writes into the page.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayerConfig {
    pub trigger_selector: String,
    pub body_class: String,
    pub overlay_class: String,
    pub cute_class: String,
    pub message_class: String,
    pub message_text: String,
    pub pour_class: String,
    pub particle_class: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            trigger_selector: "#secretBtn".to_string(),
            body_class: "isCelebrating".to_string(),
            overlay_class: "celebrateOverlay".to_string(),
            cute_class: "cuteLayer".to_string(),
            message_class: "valentineText".to_string(),
            message_text: "Will you be my Valentine?".to_string(),
            pour_class: "pourLayer".to_string(),
            particle_class: "particle heartP".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CelebrationConfig {
    pub timeline: TimelineConfig,
    pub single: SpawnProfile,
    pub pop: SpawnProfile,
    pub stream: SpawnProfile,
    pub removal_grace_ms: f64,
    pub audio: AudioConfig,
    pub assets: AssetConfig,
    pub layers: LayerConfig,
    /// Run `renderMathInElement` on page ready when the page provides it.
    pub math_autorender: bool,
}

impl Default for CelebrationConfig {
    fn default() -> Self {
        Self {
            timeline: TimelineConfig::default(),
            single: SpawnProfile::SINGLE,
            pop: SpawnProfile::POP,
            stream: SpawnProfile::STREAM,
            removal_grace_ms: REMOVAL_GRACE_MS,
            audio: AudioConfig::default(),
            assets: AssetConfig::default(),
            layers: LayerConfig::default(),
            math_autorender: true,
        }
    }
}

impl CelebrationConfig {
    /// Parse a (possibly partial) JSON document and validate the result.
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timeline;
        let non_negative = [
            ("timeline.pop_gap_ms", t.pop_gap_ms),
            ("timeline.pop_spawn_step_ms", t.pop_spawn_step_ms),
            ("timeline.sequence_gap_ms", t.sequence_gap_ms),
            ("timeline.stream_spawn_step_ms", t.stream_spawn_step_ms),
            ("timeline.origin_x_frac", t.origin_x_frac),
            ("timeline.origin_y_frac", t.origin_y_frac),
            ("removal_grace_ms", self.removal_grace_ms),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field: field.to_string(), value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field: field.to_string(), value });
            }
        }

        let total = t.total_particles();
        if total > MAX_PARTICLES {
            return Err(ConfigError::TooManyParticles { total, max: MAX_PARTICLES });
        }

        self.single.validate("single")?;
        self.pop.validate("pop")?;
        self.stream.validate("stream")?;

        let audio = &self.audio;
        if !(0.0..=1.0).contains(&audio.volume_ceiling) {
            return Err(ConfigError::VolumeOutOfRange(audio.volume_ceiling));
        }
        if !audio.volume_step.is_finite() || audio.volume_step <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "audio.volume_step".to_string(),
                value: audio.volume_step,
            });
        }
        if audio.fade_interval_ms == 0 {
            return Err(ConfigError::NonPositive { field: "audio.fade_interval_ms".to_string(), value: 0.0 });
        }

        if self.assets.hearts.is_empty() {
            return Err(ConfigError::NoHeartImages);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParamRange;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(CelebrationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_range_is_reported_with_its_path() {
        let mut cfg = CelebrationConfig::default();
        cfg.pop.size = ParamRange::new(100.0, 10.0);
        match cfg.validate() {
            Err(ConfigError::InvertedRange { field, .. }) => assert_eq!(field, "pop.size"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_audio_and_assets() {
        let mut cfg = CelebrationConfig::default();
        cfg.audio.volume_ceiling = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::VolumeOutOfRange(1.5)));

        let mut cfg = CelebrationConfig::default();
        cfg.audio.volume_step = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositive { .. })));

        let mut cfg = CelebrationConfig::default();
        cfg.assets.hearts.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::NoHeartImages));
    }

    #[test]
    fn rejects_negative_gap() {
        let mut cfg = CelebrationConfig::default();
        cfg.timeline.sequence_gap_ms = -1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Negative { .. })));
    }

    #[test]
    fn rejects_range_whose_width_overflows() {
        let mut cfg = CelebrationConfig::default();
        cfg.pop.dx = ParamRange::new(-1e308, 1e308);
        match cfg.validate() {
            Err(ConfigError::RangeTooWide { field, .. }) => assert_eq!(field, "pop.dx"),
            other => panic!("unexpected {other:?}"),
        }
        // Wide but finite is fine.
        cfg.pop.dx = ParamRange::new(-1e307, 1e307);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_oversized_timelines() {
        let mut cfg = CelebrationConfig::default();
        cfg.timeline.burst_count = u32::MAX;
        cfg.timeline.sequences = u32::MAX;
        cfg.timeline.pops_per_sequence = u32::MAX;
        assert!(matches!(cfg.validate(), Err(ConfigError::TooManyParticles { total: u64::MAX, .. })));

        let mut cfg = CelebrationConfig::default();
        cfg.timeline.stream_count = MAX_PARTICLES as u32;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::TooManyParticles { total: MAX_PARTICLES + 2520, max: MAX_PARTICLES })
        );

        let mut cfg = CelebrationConfig::default();
        cfg.timeline.sequences = 0;
        cfg.timeline.stream_count = MAX_PARTICLES as u32;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn partial_json_merges_over_defaults() {
        let cfg = CelebrationConfig::from_json(r#"{ "timeline": { "sequences": 1 }, "math_autorender": false }"#)
            .unwrap();
        assert_eq!(cfg.timeline.sequences, 1);
        assert_eq!(cfg.timeline.burst_count, 420);
        assert!(!cfg.math_autorender);
        assert_eq!(cfg.audio, AudioConfig::default());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(CelebrationConfig::from_json("{ nope"), Err(ConfigError::Json(_))));
    }
}
