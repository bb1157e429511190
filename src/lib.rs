//! Matcha Ritual - a step-based matcha preparation simulation
//!
//! Core modules:
//! - `sim`: Deterministic step state machine and per-step mini-engines
//! - `tuning`: Data-driven timings, targets and tolerances
//! - `error`: Contract violations reported by step actions
//!
//! Rendering, audio and theming live outside this crate; they read
//! [`sim::GameState`] and feed user intents into a [`sim::Session`].

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::RitualError;
pub use tuning::Tuning;

/// Reference defaults (all durations in milliseconds)
pub mod consts {
    /// Quote stays visible after picking a vibe
    pub const VIBE_QUOTE_MS: u64 = 3000;
    /// Gap between hiding the quote and moving on to the scoop
    pub const VIBE_ADVANCE_MS: u64 = 500;

    /// Matcha added per scoop action
    pub const SCOOP_STEP: u32 = 10;
    /// Full measure
    pub const SCOOP_CAPACITY: u32 = 100;
    /// Duration of the scooping motion before the amount is committed
    pub const SCOOP_ACTION_MS: u64 = 500;
    /// Delay before moving on to the pour once the measure is full
    pub const SCOOP_ADVANCE_MS: u64 = 1000;
    /// Philosophy line appears this long after entering the scoop step
    pub const PHILOSOPHY_DELAY_MS: u64 = 2000;
    /// Philosophy line rotation period
    pub const PHILOSOPHY_INTERVAL_MS: u64 = 5000;

    /// Pour tick period while the hold is active
    pub const POUR_TICK_MS: u64 = 50;
    /// Water added per tick
    pub const POUR_INCREMENT: u32 = 1;
    /// Cup saturation
    pub const POUR_MAX: u32 = 100;
    /// Ideal pour
    pub const POUR_TARGET: u32 = 80;
    /// Inclusive tolerance around the target
    pub const POUR_TOLERANCE: u32 = 10;
    /// Advance delay after a pour committed inside the band
    pub const POUR_BAND_ADVANCE_MS: u64 = 1500;
    /// Advance delay after saturating the cup outside the band
    pub const POUR_SATURATION_ADVANCE_MS: u64 = 1000;
    /// Pouring tip appears this long after entering the pour step
    pub const POUR_TIP_DELAY_MS: u64 = 3000;

    /// Whisks needed for a perfect froth
    pub const WHISK_TARGET: u32 = 15;
    /// Tolerance used for the "almost there" message and perfect-whisk scoring
    pub const WHISK_TOLERANCE: u32 = 3;
    /// Vertical speed (pixels/ms) above which a stroke counts as a whisk
    pub const WHISK_VELOCITY_THRESHOLD: f32 = 0.5;
    /// Window after a whisk during which further strokes are ignored
    pub const WHISK_REFRACTORY_MS: u64 = 100;
    /// Delay before moving on to the serve once the target is reached
    pub const WHISK_ADVANCE_MS: u64 = 1000;

    /// Certificate affordance appears this long after serving
    pub const CERTIFICATE_DELAY_MS: u64 = 1500;
}

/// Inclusive tolerance band check: `|value - target| <= tolerance`
#[inline]
pub fn within_tolerance(value: u32, target: u32, tolerance: u32) -> bool {
    value.abs_diff(target) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_tolerance_is_inclusive() {
        assert!(within_tolerance(70, 80, 10));
        assert!(within_tolerance(90, 80, 10));
        assert!(within_tolerance(80, 80, 0));
        assert!(!within_tolerance(69, 80, 10));
        assert!(!within_tolerance(100, 80, 10));
    }
}
