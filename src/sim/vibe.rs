//! Vibe selection: reveal the quote, hide it, then move on to the scoop
//!
//! A second selection while the reveal is running is rejected.

use super::session::{Ctx, Task};
use super::state::{GameStateUpdate, Step, VibeId};
use crate::error::RitualError;

/// Where the two-stage reveal currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    #[default]
    Idle,
    /// Quote visible, waiting to hide it
    ShowingQuote,
    /// Quote hidden, waiting to advance
    Advancing,
}

#[derive(Debug, Clone, Default)]
pub struct VibeSelection {
    phase: RevealPhase,
}

impl VibeSelection {
    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase != RevealPhase::Idle
    }

    pub(crate) fn select(&mut self, ctx: &mut Ctx, vibe: VibeId) -> Result<(), RitualError> {
        if self.is_pending() {
            log::warn!("Ignoring selection of {}: reveal in progress", vibe.as_str());
            return Err(RitualError::VibeSelectionPending);
        }

        ctx.store.update(GameStateUpdate {
            selected_vibe: Some(vibe),
            show_quote: Some(true),
            ..Default::default()
        });
        ctx.scheduler
            .schedule(Step::ChooseVibe, ctx.tuning.vibe.quote_ms, Task::HideQuote);
        self.phase = RevealPhase::ShowingQuote;
        log::info!("Vibe selected: {}", vibe.vibe().name);
        Ok(())
    }

    pub(crate) fn on_hide_quote(&mut self, ctx: &mut Ctx) {
        ctx.store.update(GameStateUpdate {
            show_quote: Some(false),
            ..Default::default()
        });
        ctx.scheduler.schedule(
            Step::ChooseVibe,
            ctx.tuning.vibe.advance_ms,
            Task::GoToStep(Step::Scoop),
        );
        self.phase = RevealPhase::Advancing;
    }

    /// Manual continue: needs a selected vibe
    pub(crate) fn finish(&self, ctx: &mut Ctx) -> Result<Step, RitualError> {
        match ctx.store.get().selected_vibe {
            Some(_) => Ok(Step::Scoop),
            None => Err(RitualError::NoVibeSelected),
        }
    }

    /// Leaving the step mid-reveal must not strand the quote on screen
    pub(crate) fn teardown(&mut self, ctx: &mut Ctx) {
        if ctx.store.get().show_quote {
            ctx.store.update(GameStateUpdate {
                show_quote: Some(false),
                ..Default::default()
            });
        }
        self.phase = RevealPhase::Idle;
    }
}
