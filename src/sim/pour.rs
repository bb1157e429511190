//! Pour simulator
//!
//! While the hold is active a periodic tick adds water. Three ways to finish:
//! - the tick lands exactly on the target: commit, advance after the band delay
//! - the tick saturates the cup: commit, advance after the saturation delay
//! - the hold is released mid-range: commit the amount at release, no advance

use super::session::{Ctx, Task};
use super::state::{GameStateUpdate, Step};
use super::scheduler::TaskId;
use crate::error::RitualError;
use crate::tuning::PourTuning;
use crate::within_tolerance;

#[derive(Debug, Clone, Default)]
pub struct PourSimulator {
    amount: u32,
    /// Periodic tick while the hold is active
    tick: Option<TaskId>,
    show_tip: bool,
    committed: bool,
}

impl PourSimulator {
    pub(crate) fn mount(ctx: &mut Ctx) -> Self {
        ctx.scheduler
            .schedule(Step::Pour, ctx.tuning.pour.tip_delay_ms, Task::ShowPourTip);
        Self::default()
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn is_pouring(&self) -> bool {
        self.tick.is_some()
    }

    pub fn show_tip(&self) -> bool {
        self.show_tip
    }

    /// The pour button is disabled once the cup is full
    pub fn can_pour(&self, tuning: &PourTuning) -> bool {
        self.amount < tuning.max
    }

    pub fn message(&self, tuning: &PourTuning) -> &'static str {
        if self.amount == 0 {
            "Press and hold to pour water"
        } else if self.amount < tuning.target.saturating_sub(tuning.tolerance) {
            "A bit more..."
        } else if self.amount > tuning.target + tuning.tolerance {
            "That's too much!"
        } else {
            "Perfect temperature! Release to continue"
        }
    }

    /// Water opacity, 0.3 when empty up to 1.0 when full
    pub fn water_opacity(&self, tuning: &PourTuning) -> f32 {
        0.3 + 0.7 * (self.amount as f32 / tuning.max as f32)
    }

    /// Begin holding. Idempotent; a no-op once the cup is full.
    pub(crate) fn start(&mut self, ctx: &mut Ctx) {
        let tuning = &ctx.tuning.pour;
        if !self.can_pour(tuning) {
            log::debug!("Pour ignored: cup is full");
            return;
        }
        if self.tick.is_some() {
            return;
        }
        self.tick = Some(ctx.scheduler.schedule_repeating(
            Step::Pour,
            tuning.tick_ms,
            tuning.tick_ms,
            Task::PourTick,
        ));
    }

    /// Release the hold. Idempotent; only a release that actually stops a
    /// pour can commit.
    pub(crate) fn stop(&mut self, ctx: &mut Ctx) {
        let Some(tick) = self.tick.take() else {
            return;
        };
        ctx.scheduler.cancel(tick);

        if self.amount > 0 && self.amount < ctx.tuning.pour.max {
            self.commit(ctx, self.amount);
        }
    }

    pub(crate) fn on_tick(&mut self, ctx: &mut Ctx) {
        let tuning = ctx.tuning.pour.clone();
        let amount = (self.amount + tuning.increment).min(tuning.max);
        self.amount = amount;

        if amount == tuning.target || amount == tuning.max {
            self.commit(ctx, amount);

            if within_tolerance(amount, tuning.target, tuning.tolerance) {
                ctx.scheduler.schedule(
                    Step::Pour,
                    tuning.band_advance_ms,
                    Task::GoToStep(Step::Whisk),
                );
            } else if amount == tuning.max {
                ctx.scheduler.schedule(
                    Step::Pour,
                    tuning.saturation_advance_ms,
                    Task::GoToStep(Step::Whisk),
                );
            }
        }

        if amount >= tuning.max {
            if let Some(tick) = self.tick.take() {
                ctx.scheduler.cancel(tick);
            }
        }
    }

    pub(crate) fn on_show_tip(&mut self) {
        self.show_tip = true;
    }

    fn commit(&mut self, ctx: &mut Ctx, amount: u32) {
        let tuning = &ctx.tuning.pour;
        let perfect = within_tolerance(amount, tuning.target, tuning.tolerance);
        ctx.store.update(GameStateUpdate {
            water_amount: Some(amount),
            is_perfect_pour: Some(perfect),
            ..Default::default()
        });
        self.committed = true;
        log::info!("Water poured: {amount} (perfect: {perfect})");
    }

    /// Manual continue: needs a committed pour
    pub(crate) fn finish(&mut self, ctx: &mut Ctx) -> Result<Step, RitualError> {
        self.stop(ctx);
        if !self.committed {
            return Err(RitualError::NothingToCommit(Step::Pour));
        }
        Ok(Step::Whisk)
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::{Session, Step};
    use crate::{RitualError, Tuning};

    fn at_pour() -> Session {
        let mut session = Session::new(Tuning::default());
        session.go_to_step(Step::Pour);
        session
    }

    fn pour_amount(session: &Session) -> u32 {
        session.pour_engine().map(|p| p.amount()).unwrap_or_default()
    }

    #[test]
    fn test_hitting_target_commits_perfect_and_advances() {
        let mut session = at_pour();
        session.start_pour().unwrap();

        session.advance(50 * 70);
        assert_eq!(pour_amount(&session), 70);
        // Only exact target / saturation commit mid-hold
        assert_eq!(session.state().water_amount, 0);

        session.advance(50 * 10);
        assert_eq!(pour_amount(&session), 80);
        assert_eq!(session.state().water_amount, 80);
        assert!(session.state().is_perfect_pour);

        // Let go right away so the cup doesn't keep filling
        session.stop_pour().unwrap();
        assert_eq!(session.state().water_amount, 80);

        session.advance(1499);
        assert_eq!(session.state().current_step, Step::Pour);
        session.advance(1);
        assert_eq!(session.state().current_step, Step::Whisk);
    }

    #[test]
    fn test_saturation_commits_imperfect_and_advances() {
        let mut session = at_pour();
        let tick_100 = 50 * 100;
        session.start_pour().unwrap();

        // Held through the target; its band timer takes the session to the whisk
        session.advance(tick_100 - 50 * 20 + 1500);
        assert_eq!(session.state().current_step, Step::Whisk);

        // Same hold with the band advance pushed out of the way
        let mut tuning = Tuning::default();
        tuning.pour.band_advance_ms = 60_000;
        let mut session = Session::new(tuning);
        session.go_to_step(Step::Pour);
        session.start_pour().unwrap();

        session.advance(tick_100);
        assert_eq!(pour_amount(&session), 100);
        assert_eq!(session.state().water_amount, 100);
        assert!(!session.state().is_perfect_pour);
        assert!(!session.pour_engine().unwrap().is_pouring());
        assert!(!session.pour_engine().unwrap().can_pour(&session.tuning().pour));

        session.advance(999);
        assert_eq!(session.state().current_step, Step::Pour);
        session.advance(1);
        assert_eq!(session.state().current_step, Step::Whisk);
    }

    #[test]
    fn test_release_mid_range_commits_without_advancing() {
        let mut session = at_pour();
        session.start_pour().unwrap();
        session.advance(50 * 45);
        session.stop_pour().unwrap();

        assert_eq!(session.state().water_amount, 45);
        assert!(!session.state().is_perfect_pour);
        assert!(!session.pour_engine().unwrap().is_pouring());

        session.advance(60_000);
        assert_eq!(pour_amount(&session), 45);
        assert_eq!(session.state().current_step, Step::Pour);
    }

    #[test]
    fn test_release_inside_band_is_perfect() {
        let mut session = at_pour();
        session.start_pour().unwrap();
        session.advance(50 * 70);
        session.stop_pour().unwrap();

        assert_eq!(session.state().water_amount, 70);
        assert!(session.state().is_perfect_pour);
        assert_eq!(session.state().current_step, Step::Pour);
    }

    #[test]
    fn test_release_before_first_tick_commits_nothing() {
        let mut session = at_pour();
        session.update(crate::sim::GameStateUpdate {
            water_amount: Some(7),
            ..Default::default()
        });
        session.start_pour().unwrap();
        session.advance(49);
        session.stop_pour().unwrap();

        assert_eq!(session.state().water_amount, 7);
        assert!(matches!(
            session.continue_step(),
            Err(RitualError::NothingToCommit(Step::Pour))
        ));
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut session = at_pour();
        session.start_pour().unwrap();
        session.start_pour().unwrap();
        session.advance(50 * 10);
        // A second start must not double the tick rate
        assert_eq!(pour_amount(&session), 10);

        session.stop_pour().unwrap();
        session.stop_pour().unwrap();
        assert_eq!(session.state().water_amount, 10);

        // Resume where we left off
        session.start_pour().unwrap();
        session.advance(50 * 5);
        assert_eq!(pour_amount(&session), 15);
    }

    #[test]
    fn test_messages_and_tip() {
        let mut session = at_pour();
        let tuning = session.tuning().pour.clone();
        assert_eq!(
            session.pour_engine().unwrap().message(&tuning),
            "Press and hold to pour water"
        );
        assert!(!session.pour_engine().unwrap().show_tip());

        session.start_pour().unwrap();
        session.advance(50 * 60);
        assert_eq!(session.pour_engine().unwrap().message(&tuning), "A bit more...");
        assert!(session.pour_engine().unwrap().show_tip());

        session.advance(50 * 15);
        assert_eq!(
            session.pour_engine().unwrap().message(&tuning),
            "Perfect temperature! Release to continue"
        );
        let opacity = session.pour_engine().unwrap().water_opacity(&tuning);
        assert!((opacity - (0.3 + 0.7 * 0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_manual_continue_after_release() {
        let mut session = at_pour();
        session.start_pour().unwrap();
        session.advance(50 * 30);
        assert_eq!(session.continue_step().unwrap(), Step::Whisk);
        assert_eq!(session.state().water_amount, 30);
    }

    #[test]
    fn test_leaving_step_stops_ticking() {
        let mut session = at_pour();
        session.start_pour().unwrap();
        session.advance(50 * 10);
        session.go_to_step(Step::Whisk);
        session.advance(60_000);
        assert_eq!(session.state().water_amount, 0);
        assert_eq!(session.state().current_step, Step::Whisk);
    }
}
