//! Scoop accumulator
//!
//! Each scoop adds a fixed measure. The amount is committed when the scooping
//! motion ends; the scoop that fills the measure also queues the pour.

use super::catalog::PHILOSOPHY_LINES;
use super::session::{Ctx, Task};
use super::state::{GameStateUpdate, Step};
use crate::error::RitualError;

#[derive(Debug, Clone, Default)]
pub struct ScoopAccumulator {
    /// Local measure, 0..=capacity
    amount: u32,
    /// Scoop motions still running
    in_flight: u32,
    /// Index into PHILOSOPHY_LINES once the overlay is visible
    philosophy: Option<usize>,
}

impl ScoopAccumulator {
    pub(crate) fn mount(ctx: &mut Ctx) -> Self {
        ctx.scheduler.schedule(
            Step::Scoop,
            ctx.tuning.scoop.philosophy_delay_ms,
            Task::ShowPhilosophy,
        );
        Self::default()
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// True while a scooping motion is playing
    pub fn is_scooping(&self) -> bool {
        self.in_flight > 0
    }

    /// Current philosophy line, once the overlay has appeared
    pub fn philosophy(&self) -> Option<&'static str> {
        self.philosophy.map(|i| PHILOSOPHY_LINES[i])
    }

    /// Measurement readout
    pub fn readout(&self) -> String {
        format!("{}g", self.amount)
    }

    /// Returns false when the measure is already full
    pub(crate) fn scoop(&mut self, ctx: &mut Ctx) -> bool {
        let tuning = &ctx.tuning.scoop;
        if self.amount >= tuning.capacity {
            log::debug!("Scoop ignored: measure already full");
            return false;
        }

        let before = self.amount;
        self.amount = (before + tuning.step).min(tuning.capacity);
        self.in_flight += 1;
        ctx.scheduler.schedule(
            Step::Scoop,
            tuning.action_ms,
            Task::FinishScoop {
                amount: self.amount,
                fills: self.amount >= tuning.capacity,
            },
        );
        true
    }

    pub(crate) fn on_finish(&mut self, ctx: &mut Ctx, amount: u32, fills: bool) {
        self.in_flight = self.in_flight.saturating_sub(1);
        ctx.store.update(GameStateUpdate {
            matcha_amount: Some(amount),
            ..Default::default()
        });
        log::info!("Matcha measured: {amount}g");

        if fills {
            ctx.scheduler.schedule(
                Step::Scoop,
                ctx.tuning.scoop.advance_ms,
                Task::GoToStep(Step::Pour),
            );
        }
    }

    /// Start over: pending commits and the queued pour are dropped
    pub(crate) fn reset(&mut self, ctx: &mut Ctx) {
        let dropped = ctx.scheduler.cancel_where(|owner, task| {
            owner == Step::Scoop
                && matches!(task, Task::FinishScoop { .. } | Task::GoToStep(_))
        });
        if dropped > 0 {
            log::debug!("Scoop reset dropped {dropped} pending task(s)");
        }
        self.amount = 0;
        self.in_flight = 0;
        ctx.store.update(GameStateUpdate {
            matcha_amount: Some(0),
            ..Default::default()
        });
    }

    pub(crate) fn on_show_philosophy(&mut self, ctx: &mut Ctx) {
        self.philosophy = Some(0);
        let period = ctx.tuning.scoop.philosophy_interval_ms;
        ctx.scheduler
            .schedule_repeating(Step::Scoop, period, period, Task::RotatePhilosophy);
    }

    pub(crate) fn on_rotate_philosophy(&mut self) {
        self.philosophy = Some(self.philosophy.map_or(0, |i| (i + 1) % PHILOSOPHY_LINES.len()));
    }

    /// Manual continue: commits whatever has been measured so far
    pub(crate) fn finish(&mut self, ctx: &mut Ctx) -> Result<Step, RitualError> {
        if self.amount == 0 {
            return Err(RitualError::NothingToCommit(Step::Scoop));
        }
        ctx.store.update(GameStateUpdate {
            matcha_amount: Some(self.amount),
            ..Default::default()
        });
        Ok(Step::Pour)
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::catalog::PHILOSOPHY_LINES;
    use crate::sim::{Session, Step};
    use crate::{RitualError, Tuning};

    fn at_scoop() -> Session {
        let mut session = Session::new(Tuning::default());
        session.go_to_step(Step::Scoop);
        session
    }

    #[test]
    fn test_ten_scoops_fill_and_advance() {
        let mut session = at_scoop();
        for _ in 0..10 {
            session.scoop().unwrap();
        }
        assert_eq!(session.scoop_engine().unwrap().amount(), 100);
        assert!(session.scoop_engine().unwrap().is_scooping());
        // Not committed until the motion ends
        assert_eq!(session.state().matcha_amount, 0);

        session.advance(500);
        assert_eq!(session.state().matcha_amount, 100);
        assert!(!session.scoop_engine().unwrap().is_scooping());
        assert_eq!(session.state().current_step, Step::Scoop);

        // Eleventh scoop changes nothing
        session.scoop().unwrap();
        assert_eq!(session.scoop_engine().unwrap().amount(), 100);

        session.advance(999);
        assert_eq!(session.state().current_step, Step::Scoop);
        session.advance(1);
        assert_eq!(session.state().current_step, Step::Pour);
    }

    #[test]
    fn test_partial_scoop_commits_without_advancing() {
        let mut session = at_scoop();
        session.scoop().unwrap();
        session.advance(250);
        session.scoop().unwrap();
        session.advance(250);
        assert_eq!(session.state().matcha_amount, 10);
        session.advance(250);
        assert_eq!(session.state().matcha_amount, 20);
        assert_eq!(session.scoop_engine().unwrap().readout(), "20g");

        session.advance(10_000);
        assert_eq!(session.state().current_step, Step::Scoop);
    }

    #[test]
    fn test_reset_drops_pending_commit() {
        let mut session = at_scoop();
        for _ in 0..10 {
            session.scoop().unwrap();
        }
        session.advance(500);
        session.reset_scoop().unwrap();
        assert_eq!(session.state().matcha_amount, 0);
        assert_eq!(session.scoop_engine().unwrap().amount(), 0);

        // The queued pour is gone too
        session.advance(5_000);
        assert_eq!(session.state().current_step, Step::Scoop);
    }

    #[test]
    fn test_manual_continue_requires_some_matcha() {
        let mut session = at_scoop();
        assert!(matches!(
            session.continue_step(),
            Err(RitualError::NothingToCommit(Step::Scoop))
        ));

        session.scoop().unwrap();
        assert_eq!(session.continue_step().unwrap(), Step::Pour);
        assert_eq!(session.state().matcha_amount, 10);
    }

    #[test]
    fn test_philosophy_rotation() {
        let mut session = at_scoop();
        assert_eq!(session.scoop_engine().unwrap().philosophy(), None);

        session.advance(2000);
        assert_eq!(
            session.scoop_engine().unwrap().philosophy(),
            Some(PHILOSOPHY_LINES[0])
        );
        session.advance(5000);
        assert_eq!(
            session.scoop_engine().unwrap().philosophy(),
            Some(PHILOSOPHY_LINES[1])
        );
        session.advance(5000 * 4);
        assert_eq!(
            session.scoop_engine().unwrap().philosophy(),
            Some(PHILOSOPHY_LINES[0])
        );
    }

    #[test]
    fn test_scoop_outside_step_is_rejected() {
        let mut session = Session::new(Tuning::default());
        assert!(matches!(
            session.scoop(),
            Err(RitualError::WrongStep { .. })
        ));
        assert_eq!(session.state().matcha_amount, 0);
    }
}
