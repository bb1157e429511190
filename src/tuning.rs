//! Data-driven ritual tuning
//!
//! Every target, tolerance and delay the mini-engines use lives here so
//! tests and the demo can run with compressed timings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::RitualError;

/// Pace presets (scale every delay by a divisor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Pace {
    #[default]
    Standard,
    Brisk,
    Instant,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Standard => "Standard",
            Pace::Brisk => "Brisk",
            Pace::Instant => "Instant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "std" => Some(Pace::Standard),
            "brisk" => Some(Pace::Brisk),
            "instant" => Some(Pace::Instant),
            _ => None,
        }
    }

    /// Divisor applied to every duration
    pub fn divisor(&self) -> u64 {
        match self {
            Pace::Standard => 1,
            Pace::Brisk => 5,
            Pace::Instant => 50,
        }
    }
}

/// Vibe reveal timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibeTuning {
    /// How long the quote stays visible
    pub quote_ms: u64,
    /// Gap between hiding the quote and advancing
    pub advance_ms: u64,
}

impl Default for VibeTuning {
    fn default() -> Self {
        Self {
            quote_ms: VIBE_QUOTE_MS,
            advance_ms: VIBE_ADVANCE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoopTuning {
    pub step: u32,
    pub capacity: u32,
    /// Scooping motion duration; the amount is committed when it ends
    pub action_ms: u64,
    pub advance_ms: u64,
    pub philosophy_delay_ms: u64,
    pub philosophy_interval_ms: u64,
}

impl Default for ScoopTuning {
    fn default() -> Self {
        Self {
            step: SCOOP_STEP,
            capacity: SCOOP_CAPACITY,
            action_ms: SCOOP_ACTION_MS,
            advance_ms: SCOOP_ADVANCE_MS,
            philosophy_delay_ms: PHILOSOPHY_DELAY_MS,
            philosophy_interval_ms: PHILOSOPHY_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PourTuning {
    pub tick_ms: u64,
    pub increment: u32,
    pub max: u32,
    pub target: u32,
    pub tolerance: u32,
    /// Advance delay after committing inside `target ± tolerance`
    pub band_advance_ms: u64,
    /// Advance delay after saturating the cup outside the band
    pub saturation_advance_ms: u64,
    pub tip_delay_ms: u64,
}

impl Default for PourTuning {
    fn default() -> Self {
        Self {
            tick_ms: POUR_TICK_MS,
            increment: POUR_INCREMENT,
            max: POUR_MAX,
            target: POUR_TARGET,
            tolerance: POUR_TOLERANCE,
            band_advance_ms: POUR_BAND_ADVANCE_MS,
            saturation_advance_ms: POUR_SATURATION_ADVANCE_MS,
            tip_delay_ms: POUR_TIP_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiskTuning {
    pub target: u32,
    pub tolerance: u32,
    /// Pixels per millisecond
    pub velocity_threshold: f32,
    pub refractory_ms: u64,
    pub advance_ms: u64,
}

impl Default for WhiskTuning {
    fn default() -> Self {
        Self {
            target: WHISK_TARGET,
            tolerance: WHISK_TOLERANCE,
            velocity_threshold: WHISK_VELOCITY_THRESHOLD,
            refractory_ms: WHISK_REFRACTORY_MS,
            advance_ms: WHISK_ADVANCE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeTuning {
    pub certificate_delay_ms: u64,
}

impl Default for ServeTuning {
    fn default() -> Self {
        Self {
            certificate_delay_ms: CERTIFICATE_DELAY_MS,
        }
    }
}

/// Complete tuning for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub vibe: VibeTuning,
    pub scoop: ScoopTuning,
    pub pour: PourTuning,
    pub whisk: WhiskTuning,
    pub serve: ServeTuning,
}

impl Tuning {
    /// Reference tuning with every duration divided by the pace divisor
    pub fn from_pace(pace: Pace) -> Self {
        Self::default().compressed(pace.divisor())
    }

    /// Divide every duration by `divisor` (never below 1 ms).
    ///
    /// Targets, tolerances and the whisk velocity threshold are left alone,
    /// so gestures still have to be drawn at the same speed.
    pub fn compressed(mut self, divisor: u64) -> Self {
        let divisor = divisor.max(1);
        let squeeze = |ms: &mut u64| *ms = (*ms / divisor).max(1);

        squeeze(&mut self.vibe.quote_ms);
        squeeze(&mut self.vibe.advance_ms);

        squeeze(&mut self.scoop.action_ms);
        squeeze(&mut self.scoop.advance_ms);
        squeeze(&mut self.scoop.philosophy_delay_ms);
        squeeze(&mut self.scoop.philosophy_interval_ms);

        squeeze(&mut self.pour.tick_ms);
        squeeze(&mut self.pour.band_advance_ms);
        squeeze(&mut self.pour.saturation_advance_ms);
        squeeze(&mut self.pour.tip_delay_ms);

        squeeze(&mut self.whisk.advance_ms);
        squeeze(&mut self.serve.certificate_delay_ms);
        self
    }

    /// Parse tuning from JSON; missing fields fall back to the defaults
    pub fn from_json(json: &str) -> Result<Self, RitualError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RitualError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, RitualError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tunings the engines cannot make progress with
    pub fn validate(&self) -> Result<(), RitualError> {
        let fail = |msg: &str| Err(RitualError::Tuning(msg.to_string()));

        if self.scoop.step == 0 || self.scoop.capacity == 0 {
            return fail("scoop step and capacity must be positive");
        }
        if self.scoop.capacity > 100 {
            return fail("scoop capacity cannot exceed 100");
        }
        if self.pour.tick_ms == 0 || self.pour.increment == 0 {
            return fail("pour tick interval and increment must be positive");
        }
        if self.pour.target > self.pour.max {
            return fail("pour target exceeds the cup maximum");
        }
        if self.pour.max > 100 {
            return fail("pour maximum cannot exceed 100");
        }
        if self.pour.tolerance >= self.pour.target {
            return fail("pour tolerance must be smaller than the target");
        }
        if self.pour.target + self.pour.tolerance > self.pour.max {
            return fail("pour band reaches past the cup maximum");
        }
        if self.whisk.target == 0 {
            return fail("whisk target must be positive");
        }
        if !(self.whisk.velocity_threshold > 0.0) {
            return fail("whisk velocity threshold must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference() {
        let tuning = Tuning::default();
        assert_eq!(tuning.vibe.quote_ms, 3000);
        assert_eq!(tuning.vibe.advance_ms, 500);
        assert_eq!(tuning.pour.target, 80);
        assert_eq!(tuning.pour.tolerance, 10);
        assert_eq!(tuning.pour.tick_ms, 50);
        assert_eq!(tuning.whisk.target, 15);
        assert_eq!(tuning.whisk.refractory_ms, 100);
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_compressed_scales_durations_only() {
        let tuning = Tuning::default().compressed(10);
        assert_eq!(tuning.vibe.quote_ms, 300);
        assert_eq!(tuning.pour.tick_ms, 5);
        assert_eq!(tuning.pour.target, 80);
        assert_eq!(tuning.whisk.refractory_ms, 100);

        // Never collapses to zero
        let tuning = Tuning::default().compressed(1_000_000);
        assert_eq!(tuning.pour.tick_ms, 1);
    }

    #[test]
    fn test_from_json_partial() {
        let tuning = Tuning::from_json(r#"{ "pour": { "target": 60 } }"#).unwrap();
        assert_eq!(tuning.pour.target, 60);
        assert_eq!(tuning.pour.max, 100);
        assert_eq!(tuning.whisk, WhiskTuning::default());
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let err = Tuning::from_json(r#"{ "pour": { "tick_ms": 0 } }"#).unwrap_err();
        assert!(matches!(err, RitualError::Tuning(_)));

        let err = Tuning::from_json("not json").unwrap_err();
        assert!(matches!(err, RitualError::Parse(_)));
    }

    #[test]
    fn test_amounts_capped_at_full_cup() {
        let cases = [
            r#"{ "pour": { "max": 150 } }"#,
            r#"{ "scoop": { "capacity": 120 } }"#,
            r#"{ "pour": { "max": 85 } }"#,
        ];
        for json in cases {
            let err = Tuning::from_json(json).unwrap_err();
            assert!(matches!(err, RitualError::Tuning(_)), "{json}");
        }

        // Band edge exactly at the maximum is fine
        assert!(Tuning::from_json(r#"{ "pour": { "max": 90 } }"#).is_ok());
        assert!(Tuning::from_json(r#"{ "scoop": { "capacity": 100 } }"#).is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let tuning = Tuning::from_pace(Pace::Brisk);
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_pace_from_str() {
        assert_eq!(Pace::from_str("BRISK"), Some(Pace::Brisk));
        assert_eq!(Pace::from_str("std"), Some(Pace::Standard));
        assert_eq!(Pace::from_str("glacial"), None);
        assert_eq!(Pace::Instant.as_str(), "Instant");
    }
}
