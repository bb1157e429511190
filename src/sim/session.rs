//! Session: the step state machine host
//!
//! Owns the store, the scheduler and the engine of the active step. Every
//! step change tears down the old engine (cancelling its pending tasks) and
//! mounts a fresh one. Fired tasks are also checked against their owning
//! step, so nothing scheduled for one step can act inside another.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pour::PourSimulator;
use super::scheduler::{Fired, Scheduler};
use super::scoop::ScoopAccumulator;
use super::serve::ServeTable;
use super::state::{Garnish, GameState, GameStateUpdate, GameStore, ServeStyle, Step, VibeId};
use super::vibe::VibeSelection;
use super::whisk::{WhiskBowl, WhiskEvent, WhiskSample};
use crate::error::RitualError;
use crate::tuning::Tuning;

/// Deferred work owned by a step's engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Guarded transition
    GoToStep(Step),
    HideQuote,
    /// End of a scooping motion; commits `amount`
    FinishScoop { amount: u32, fills: bool },
    ShowPhilosophy,
    RotatePhilosophy,
    PourTick,
    ShowPourTip,
    RevealCertificate,
}

/// What an engine may touch
pub(crate) struct Ctx<'a> {
    pub store: &'a mut GameStore,
    pub scheduler: &'a mut Scheduler<Task>,
    pub tuning: &'a Tuning,
}

/// Engine of the active step
#[derive(Debug, Clone)]
enum Engine {
    Intro,
    ChooseVibe(VibeSelection),
    Scoop(ScoopAccumulator),
    Pour(PourSimulator),
    Whisk(WhiskBowl),
    Serve(ServeTable),
    Certificate,
}

impl Engine {
    fn mount(step: Step, ctx: &mut Ctx) -> Self {
        match step {
            Step::Intro => Engine::Intro,
            Step::ChooseVibe => Engine::ChooseVibe(VibeSelection::default()),
            Step::Scoop => Engine::Scoop(ScoopAccumulator::mount(ctx)),
            Step::Pour => Engine::Pour(PourSimulator::mount(ctx)),
            Step::Whisk => Engine::Whisk(WhiskBowl::mount(ctx)),
            Step::Serve => Engine::Serve(ServeTable::default()),
            Step::Certificate => Engine::Certificate,
        }
    }
}

/// A user intent from the presentation layer (one per input event)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Start,
    SelectVibe { vibe: VibeId },
    Scoop,
    ResetScoop,
    StartPour,
    StopPour,
    PointerDown,
    PointerUp,
    PointerEnter,
    PointerLeave,
    PointerMove { x: f32, y: f32 },
    ChooseServeStyle { style: ServeStyle },
    ChooseGarnish { garnish: Garnish },
    Serve,
    Continue,
    Back,
    Reset,
}

#[derive(Debug, Clone)]
pub struct Session {
    store: GameStore,
    scheduler: Scheduler<Task>,
    tuning: Tuning,
    engine: Engine,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl Session {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            store: GameStore::new(),
            scheduler: Scheduler::new(),
            tuning,
            engine: Engine::Intro,
        }
    }

    /// Read-only snapshot for rendering
    pub fn state(&self) -> &GameState {
        self.store.get()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Virtual time (ms)
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Pending tasks in firing order
    pub fn pending_tasks(&self) -> impl Iterator<Item = (u64, &Task)> {
        self.scheduler.pending()
    }

    /// Merge a partial update into the shared state
    pub fn update(&mut self, update: GameStateUpdate) {
        self.store.update(update);
    }

    /// Move to `step`. Performs no validation; callers own the completion
    /// predicate. Tears down the old engine and mounts a fresh one.
    pub fn go_to_step(&mut self, step: Step) {
        let from = self.store.current_step();
        if from == step {
            return;
        }

        self.teardown();
        self.store.go_to_step(step);
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        self.engine = Engine::mount(step, &mut ctx);
        log::info!("Step {from} -> {step} at {}ms", self.scheduler.now());
    }

    /// Back to the documented defaults, dropping every pending task
    pub fn reset(&mut self) {
        self.teardown();
        self.scheduler.clear();
        self.store.reset();
        self.engine = Engine::Intro;
        log::info!("Session reset");
    }

    fn teardown(&mut self) {
        let step = self.store.current_step();
        let cancelled = self.scheduler.cancel_owned_by(step);
        if cancelled > 0 {
            log::debug!("Leaving {step}: cancelled {cancelled} pending task(s)");
        }
        if let Engine::ChooseVibe(vibe) = &mut self.engine {
            let mut ctx = Ctx {
                store: &mut self.store,
                scheduler: &mut self.scheduler,
                tuning: &self.tuning,
            };
            vibe.teardown(&mut ctx);
        }
    }

    fn expect_step(&self, action: &'static str, expected: Step) -> Result<(), RitualError> {
        let current = self.store.current_step();
        if current != expected {
            log::warn!("Rejected `{action}` during {current}");
            return Err(RitualError::wrong_step(action, expected, current));
        }
        Ok(())
    }

    // === Clock ===

    /// Advance the clock by `ms`, firing everything that comes due
    pub fn advance(&mut self, ms: u64) -> usize {
        let until = self.scheduler.now() + ms;
        self.advance_to(until)
    }

    /// Advance the clock to `t` (never backwards). Returns tasks fired.
    pub fn advance_to(&mut self, t: u64) -> usize {
        let mut fired = 0;
        while let Some(task) = self.scheduler.pop_due(t) {
            self.dispatch(task);
            fired += 1;
        }
        self.scheduler.advance_clock_to(t);
        fired
    }

    fn dispatch(&mut self, fired: Fired<Task>) {
        let current = self.store.current_step();
        if fired.owner != current {
            log::debug!(
                "Skipping stale {:?} from {} (now in {current})",
                fired.task,
                fired.owner
            );
            return;
        }

        if let Task::GoToStep(step) = fired.task {
            self.go_to_step(step);
            return;
        }

        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        match (&mut self.engine, fired.task) {
            (Engine::ChooseVibe(vibe), Task::HideQuote) => vibe.on_hide_quote(&mut ctx),
            (Engine::Scoop(scoop), Task::FinishScoop { amount, fills }) => {
                scoop.on_finish(&mut ctx, amount, fills)
            }
            (Engine::Scoop(scoop), Task::ShowPhilosophy) => scoop.on_show_philosophy(&mut ctx),
            (Engine::Scoop(scoop), Task::RotatePhilosophy) => scoop.on_rotate_philosophy(),
            (Engine::Pour(pour), Task::PourTick) => pour.on_tick(&mut ctx),
            (Engine::Pour(pour), Task::ShowPourTip) => pour.on_show_tip(),
            (Engine::Serve(serve), Task::RevealCertificate) => serve.on_reveal_certificate(),
            (_, task) => log::debug!("Dropping unroutable {task:?} in {current}"),
        }
    }

    // === Step actions ===

    /// Leave the intro
    pub fn start(&mut self) -> Result<(), RitualError> {
        self.expect_step("start", Step::Intro)?;
        self.go_to_step(Step::ChooseVibe);
        Ok(())
    }

    /// Pick a vibe and start the reveal; rejected while one is pending
    pub fn select_vibe(&mut self, vibe: VibeId) -> Result<(), RitualError> {
        self.expect_step("select_vibe", Step::ChooseVibe)?;
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        match &mut self.engine {
            Engine::ChooseVibe(selection) => selection.select(&mut ctx, vibe),
            _ => Ok(()),
        }
    }

    pub fn scoop(&mut self) -> Result<(), RitualError> {
        self.expect_step("scoop", Step::Scoop)?;
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        if let Engine::Scoop(scoop) = &mut self.engine {
            scoop.scoop(&mut ctx);
        }
        Ok(())
    }

    pub fn reset_scoop(&mut self) -> Result<(), RitualError> {
        self.expect_step("reset_scoop", Step::Scoop)?;
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        if let Engine::Scoop(scoop) = &mut self.engine {
            scoop.reset(&mut ctx);
        }
        Ok(())
    }

    pub fn start_pour(&mut self) -> Result<(), RitualError> {
        self.expect_step("start_pour", Step::Pour)?;
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        if let Engine::Pour(pour) = &mut self.engine {
            pour.start(&mut ctx);
        }
        Ok(())
    }

    pub fn stop_pour(&mut self) -> Result<(), RitualError> {
        self.expect_step("stop_pour", Step::Pour)?;
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        if let Engine::Pour(pour) = &mut self.engine {
            pour.stop(&mut ctx);
        }
        Ok(())
    }

    pub fn pointer_down(&mut self) -> Result<(), RitualError> {
        self.whisk_bowl("pointer_down").map(|bowl| bowl.set_holding(true))
    }

    pub fn pointer_up(&mut self) -> Result<(), RitualError> {
        self.whisk_bowl("pointer_up").map(|bowl| bowl.set_holding(false))
    }

    pub fn pointer_enter(&mut self) -> Result<(), RitualError> {
        self.whisk_bowl("pointer_enter").map(|bowl| bowl.set_over_surface(true))
    }

    pub fn pointer_leave(&mut self) -> Result<(), RitualError> {
        self.whisk_bowl("pointer_leave").map(|bowl| bowl.set_over_surface(false))
    }

    fn whisk_bowl(&mut self, action: &'static str) -> Result<&mut WhiskBowl, RitualError> {
        let current = self.store.current_step();
        match &mut self.engine {
            Engine::Whisk(bowl) => Ok(bowl),
            _ => {
                log::warn!("Rejected `{action}` during {current}");
                Err(RitualError::wrong_step(action, Step::Whisk, current))
            }
        }
    }

    /// Pointer moved to `pos` now, gated by the current hold/hover state
    pub fn pointer_move(&mut self, pos: Vec2) -> Result<Option<WhiskEvent>, RitualError> {
        let now = self.scheduler.now();
        let sample = self.whisk_bowl("pointer_move")?.sample_at(now, pos);
        self.feed_sample(sample)
    }

    /// Feed a timestamped sample. The clock is first advanced to its time so
    /// due tasks fire in order; a sample from the past is taken as "now".
    pub fn feed_whisk_sample(
        &mut self,
        mut sample: WhiskSample,
    ) -> Result<Option<WhiskEvent>, RitualError> {
        self.expect_step("feed_whisk_sample", Step::Whisk)?;
        self.advance_to(sample.at_ms);
        // Reaching the sample time may have fired the transition to serve
        self.expect_step("feed_whisk_sample", Step::Whisk)?;
        sample.at_ms = sample.at_ms.max(self.scheduler.now());
        self.feed_sample(sample)
    }

    fn feed_sample(&mut self, sample: WhiskSample) -> Result<Option<WhiskEvent>, RitualError> {
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        match &mut self.engine {
            Engine::Whisk(bowl) => Ok(bowl.feed(&mut ctx, sample)),
            _ => Err(RitualError::wrong_step(
                "feed_whisk_sample",
                Step::Whisk,
                ctx.store.current_step(),
            )),
        }
    }

    pub fn choose_serve_style(&mut self, style: ServeStyle) -> Result<(), RitualError> {
        self.with_serve_table("choose_serve_style", |table, ctx| table.choose_style(ctx, style))
    }

    pub fn choose_garnish(&mut self, garnish: Garnish) -> Result<(), RitualError> {
        self.with_serve_table("choose_garnish", |table, ctx| table.choose_garnish(ctx, garnish))
    }

    pub fn serve(&mut self) -> Result<(), RitualError> {
        self.with_serve_table("serve", |table, ctx| table.serve(ctx))
    }

    fn with_serve_table(
        &mut self,
        action: &'static str,
        f: impl FnOnce(&mut ServeTable, &mut Ctx),
    ) -> Result<(), RitualError> {
        self.expect_step(action, Step::Serve)?;
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        if let Engine::Serve(table) = &mut self.engine {
            f(table, &mut ctx);
        }
        Ok(())
    }

    /// Explicit, timer-free way out of every non-terminal step
    pub fn continue_step(&mut self) -> Result<Step, RitualError> {
        let mut ctx = Ctx {
            store: &mut self.store,
            scheduler: &mut self.scheduler,
            tuning: &self.tuning,
        };
        let next = match &mut self.engine {
            Engine::Intro => Ok(Step::ChooseVibe),
            Engine::ChooseVibe(vibe) => vibe.finish(&mut ctx),
            Engine::Scoop(scoop) => scoop.finish(&mut ctx),
            Engine::Pour(pour) => pour.finish(&mut ctx),
            Engine::Whisk(_) => Ok(Step::Serve),
            Engine::Serve(table) => table.finish(),
            Engine::Certificate => Err(RitualError::RitualComplete),
        }?;
        self.go_to_step(next);
        Ok(next)
    }

    /// Previous step in the fixed sequence (no history is kept)
    pub fn back(&mut self) -> Result<Step, RitualError> {
        let current = self.store.current_step();
        let previous = current
            .previous()
            .ok_or(RitualError::NoPreviousStep(current))?;
        self.go_to_step(previous);
        Ok(previous)
    }

    /// Route one intent to the matching action
    pub fn apply(&mut self, intent: Intent) -> Result<(), RitualError> {
        match intent {
            Intent::Start => self.start(),
            Intent::SelectVibe { vibe } => self.select_vibe(vibe),
            Intent::Scoop => self.scoop(),
            Intent::ResetScoop => self.reset_scoop(),
            Intent::StartPour => self.start_pour(),
            Intent::StopPour => self.stop_pour(),
            Intent::PointerDown => self.pointer_down(),
            Intent::PointerUp => self.pointer_up(),
            Intent::PointerEnter => self.pointer_enter(),
            Intent::PointerLeave => self.pointer_leave(),
            Intent::PointerMove { x, y } => self.pointer_move(Vec2::new(x, y)).map(|_| ()),
            Intent::ChooseServeStyle { style } => self.choose_serve_style(style),
            Intent::ChooseGarnish { garnish } => self.choose_garnish(garnish),
            Intent::Serve => self.serve(),
            Intent::Continue => self.continue_step().map(|_| ()),
            Intent::Back => self.back().map(|_| ()),
            Intent::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    // === Engine read models ===

    pub fn vibe_engine(&self) -> Option<&VibeSelection> {
        match &self.engine {
            Engine::ChooseVibe(vibe) => Some(vibe),
            _ => None,
        }
    }

    pub fn scoop_engine(&self) -> Option<&ScoopAccumulator> {
        match &self.engine {
            Engine::Scoop(scoop) => Some(scoop),
            _ => None,
        }
    }

    pub fn pour_engine(&self) -> Option<&PourSimulator> {
        match &self.engine {
            Engine::Pour(pour) => Some(pour),
            _ => None,
        }
    }

    pub fn whisk_engine(&self) -> Option<&WhiskBowl> {
        match &self.engine {
            Engine::Whisk(bowl) => Some(bowl),
            _ => None,
        }
    }

    pub fn serve_engine(&self) -> Option<&ServeTable> {
        match &self.engine {
            Engine::Serve(table) => Some(table),
            _ => None,
        }
    }
}
