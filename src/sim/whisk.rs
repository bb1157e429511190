//! Whisk gesture detection
//!
//! Converts a stream of pointer samples into discrete whisk events:
//! vertical speed above the threshold counts as one whisk, then the detector
//! stays deaf for a refractory window so a single fast stroke isn't counted
//! twice. The detector is pure; time comes from the sample timestamps.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{MATCHA_BASE, Rgba};
use super::session::{Ctx, Task};
use super::state::{GameStateUpdate, Step};
use crate::tuning::WhiskTuning;
use crate::within_tolerance;

/// One pointer sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhiskSample {
    /// Timestamp (ms)
    pub at_ms: u64,
    /// Pointer position (pixels, y grows downward)
    pub pos: Vec2,
    /// Pointer button held
    pub holding: bool,
    /// Pointer over the mixing surface
    pub over_surface: bool,
}

impl WhiskSample {
    /// Sample taken while holding over the bowl
    pub fn active(at_ms: u64, pos: Vec2) -> Self {
        Self {
            at_ms,
            pos,
            holding: true,
            over_surface: true,
        }
    }
}

/// A registered whisk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiskEvent {
    /// Count including this whisk
    pub count: u32,
    pub at_ms: u64,
    /// Vertical speed that triggered it (pixels/ms)
    pub velocity: f32,
    /// True only for the whisk that first reaches the target
    pub reached_target: bool,
}

#[derive(Debug, Clone)]
pub struct WhiskDetector {
    tuning: WhiskTuning,
    /// Last gated sample (y, time)
    last: Option<(f32, u64)>,
    /// Events are suppressed before this time
    rearm_at: u64,
    count: u32,
    target_reached: bool,
}

impl WhiskDetector {
    pub fn new(tuning: WhiskTuning) -> Self {
        Self {
            tuning,
            last: None,
            rearm_at: 0,
            count: 0,
            target_reached: false,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn target_reached(&self) -> bool {
        self.target_reached
    }

    /// Feed one sample; returns the whisk it registers, if any.
    ///
    /// Samples outside a hold over the surface are dropped entirely. The first
    /// gated sample only primes the detector.
    pub fn feed(&mut self, sample: WhiskSample) -> Option<WhiskEvent> {
        if !(sample.holding && sample.over_surface) {
            return None;
        }

        let (last_y, last_t) = self.last.replace((sample.pos.y, sample.at_ms))?;
        let dt = sample.at_ms.checked_sub(last_t).filter(|dt| *dt > 0)?;
        let velocity = (sample.pos.y - last_y).abs() / dt as f32;

        if velocity <= self.tuning.velocity_threshold {
            return None;
        }
        if sample.at_ms < self.rearm_at {
            log::debug!("Whisk suppressed at {}ms (refractory)", sample.at_ms);
            return None;
        }

        self.count += 1;
        self.rearm_at = sample.at_ms + self.tuning.refractory_ms;

        let reached_target = !self.target_reached && self.count >= self.tuning.target;
        if reached_target {
            self.target_reached = true;
        }

        Some(WhiskEvent {
            count: self.count,
            at_ms: sample.at_ms,
            velocity,
            reached_target,
        })
    }

    /// Foam level, 0-100 (half of the cap at the target)
    pub fn foam_level(&self) -> f32 {
        foam_level(self.count, self.tuning.target)
    }

    pub fn matcha_color(&self) -> Rgba {
        matcha_color(self.count, self.tuning.target)
    }

    pub fn message(&self) -> String {
        whisk_message(self.count, &self.tuning)
    }
}

/// Run a whole sample stream through a fresh detector
pub fn detect(
    samples: impl IntoIterator<Item = WhiskSample>,
    tuning: &WhiskTuning,
) -> Vec<WhiskEvent> {
    let mut detector = WhiskDetector::new(tuning.clone());
    samples
        .into_iter()
        .filter_map(|sample| detector.feed(sample))
        .collect()
}

pub fn foam_level(count: u32, target: u32) -> f32 {
    (count as f32 / target.max(1) as f32 * 50.0).min(100.0)
}

/// Liquid colour deepens as the whisk count approaches the target
pub fn matcha_color(count: u32, target: u32) -> Rgba {
    let [r, g, b] = MATCHA_BASE;
    Rgba::new(r, g, b, 0.8 + (count as f32 / target.max(1) as f32) * 0.15)
}

pub fn whisk_message(count: u32, tuning: &WhiskTuning) -> String {
    if count == 0 {
        "Drag the whisk up and down to mix the matcha".to_string()
    } else if count < tuning.target.saturating_sub(tuning.tolerance) {
        format!("Keep whisking... {count}/{}", tuning.target)
    } else if count < tuning.target {
        "Almost there! Keep going!".to_string()
    } else {
        "Perfect froth! Moving to serving...".to_string()
    }
}

/// Whisk step: pointer gating plus the detector
#[derive(Debug, Clone)]
pub struct WhiskBowl {
    detector: WhiskDetector,
    holding: bool,
    over_surface: bool,
}

impl WhiskBowl {
    pub(crate) fn mount(ctx: &mut Ctx) -> Self {
        Self {
            detector: WhiskDetector::new(ctx.tuning.whisk.clone()),
            holding: false,
            over_surface: false,
        }
    }

    pub fn detector(&self) -> &WhiskDetector {
        &self.detector
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    pub fn is_over_surface(&self) -> bool {
        self.over_surface
    }

    pub(crate) fn set_holding(&mut self, holding: bool) {
        self.holding = holding;
    }

    pub(crate) fn set_over_surface(&mut self, over: bool) {
        self.over_surface = over;
    }

    /// Sample built from the current pointer gating
    pub(crate) fn sample_at(&self, at_ms: u64, pos: Vec2) -> WhiskSample {
        WhiskSample {
            at_ms,
            pos,
            holding: self.holding,
            over_surface: self.over_surface,
        }
    }

    pub(crate) fn feed(&mut self, ctx: &mut Ctx, sample: WhiskSample) -> Option<WhiskEvent> {
        let event = self.detector.feed(sample)?;
        let tuning = &ctx.tuning.whisk;

        // Whisking on past the target while the advance is pending stays perfect
        let perfect = self.detector.target_reached()
            || within_tolerance(event.count, tuning.target, tuning.tolerance);
        ctx.store.update(GameStateUpdate {
            whisk_intensity: Some((event.count * 100 / tuning.target.max(1)).min(100)),
            is_perfect_whisk: Some(perfect),
            ..Default::default()
        });

        if event.reached_target {
            log::info!("Whisk target reached after {} whisks", event.count);
            ctx.scheduler.schedule(
                Step::Whisk,
                tuning.advance_ms,
                Task::GoToStep(Step::Serve),
            );
        }
        Some(event)
    }
}
