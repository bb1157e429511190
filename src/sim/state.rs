//! Game state and the shared store
//!
//! The store is the only shared mutable resource. Engines write results into
//! it through [`GameStateUpdate`]; only the session moves `current_step`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One stage of the fixed linear ritual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Intro,
    ChooseVibe,
    Scoop,
    Pour,
    Whisk,
    Serve,
    /// Terminal
    Certificate,
}

impl Step {
    /// Every step in play order
    pub const ALL: [Step; 7] = [
        Step::Intro,
        Step::ChooseVibe,
        Step::Scoop,
        Step::Pour,
        Step::Whisk,
        Step::Serve,
        Step::Certificate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Intro => "intro",
            Step::ChooseVibe => "choose-vibe",
            Step::Scoop => "scoop",
            Step::Pour => "pour",
            Step::Whisk => "whisk",
            Step::Serve => "serve",
            Step::Certificate => "certificate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.as_str() == s)
    }

    fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|step| step == self)
            .unwrap_or_default()
    }

    /// Following step in the sequence (None from the terminal step)
    pub fn next(&self) -> Option<Step> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Preceding step in the sequence (None from intro)
    pub fn previous(&self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn is_terminal(&self) -> bool {
        *self == Step::Certificate
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VibeId {
    Philosopher,
    Poet,
    Nomad,
}

impl VibeId {
    pub const ALL: [VibeId; 3] = [VibeId::Philosopher, VibeId::Poet, VibeId::Nomad];

    pub fn as_str(&self) -> &'static str {
        match self {
            VibeId::Philosopher => "philosopher",
            VibeId::Poet => "poet",
            VibeId::Nomad => "nomad",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|vibe| vibe.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServeStyle {
    #[default]
    Traditional,
    Modern,
    Ceremonial,
}

impl ServeStyle {
    pub const ALL: [ServeStyle; 3] = [
        ServeStyle::Traditional,
        ServeStyle::Modern,
        ServeStyle::Ceremonial,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Garnish {
    #[default]
    None,
    Mint,
    Flower,
    Cinnamon,
    WhippedCream,
}

impl Garnish {
    pub const ALL: [Garnish; 5] = [
        Garnish::None,
        Garnish::Mint,
        Garnish::Flower,
        Garnish::Cinnamon,
        Garnish::WhippedCream,
    ];
}

/// Complete session state read by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_step: Step,
    /// Set while choosing a vibe
    pub selected_vibe: Option<VibeId>,
    /// True only during the vibe reveal window
    pub show_quote: bool,
    /// 0-100, written by the scoop
    pub matcha_amount: u32,
    /// 0-100, written by the pour
    pub water_amount: u32,
    /// Presentation companion of the pour; no engine writes it
    pub water_temperature: u32,
    pub is_perfect_pour: bool,
    /// 0-100, percentage of the whisk target reached
    pub whisk_intensity: u32,
    pub is_perfect_whisk: bool,
    pub serve_style: ServeStyle,
    pub garnish: Garnish,
    // Presentation hints, never touched by the engines
    pub background: String,
    pub music_track: String,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            current_step: Step::Intro,
            selected_vibe: None,
            show_quote: false,
            matcha_amount: 0,
            water_amount: 0,
            water_temperature: 0,
            is_perfect_pour: false,
            whisk_intensity: 0,
            is_perfect_whisk: false,
            serve_style: ServeStyle::Traditional,
            garnish: Garnish::None,
            background: "default".to_string(),
            music_track: "default".to_string(),
        }
    }
}

/// Partial update: `Some` fields overwrite, `None` fields are preserved.
///
/// `current_step` is deliberately absent; steps only move through the
/// session's `go_to_step`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GameStateUpdate {
    /// Set-only: `None` leaves the selection alone, so clearing it takes a
    /// full [`GameStore::reset`]
    pub selected_vibe: Option<VibeId>,
    pub show_quote: Option<bool>,
    pub matcha_amount: Option<u32>,
    pub water_amount: Option<u32>,
    pub water_temperature: Option<u32>,
    pub is_perfect_pour: Option<bool>,
    pub whisk_intensity: Option<u32>,
    pub is_perfect_whisk: Option<bool>,
    pub serve_style: Option<ServeStyle>,
    pub garnish: Option<Garnish>,
    pub background: Option<String>,
    pub music_track: Option<String>,
}

impl GameStateUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Owner of the single [`GameState`] instance
#[derive(Debug, Clone, Default)]
pub struct GameStore {
    state: GameState,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    pub fn get(&self) -> &GameState {
        &self.state
    }

    pub fn current_step(&self) -> Step {
        self.state.current_step
    }

    /// Merge the present fields, last write wins
    pub fn update(&mut self, update: GameStateUpdate) {
        let GameStateUpdate {
            selected_vibe,
            show_quote,
            matcha_amount,
            water_amount,
            water_temperature,
            is_perfect_pour,
            whisk_intensity,
            is_perfect_whisk,
            serve_style,
            garnish,
            background,
            music_track,
        } = update;
        let state = &mut self.state;

        if let Some(v) = selected_vibe {
            state.selected_vibe = Some(v);
        }
        if let Some(v) = show_quote {
            state.show_quote = v;
        }
        if let Some(v) = matcha_amount {
            debug_assert!(v <= 100, "matcha amount out of range: {v}");
            state.matcha_amount = v;
        }
        if let Some(v) = water_amount {
            debug_assert!(v <= 100, "water amount out of range: {v}");
            state.water_amount = v;
        }
        if let Some(v) = water_temperature {
            state.water_temperature = v;
        }
        if let Some(v) = is_perfect_pour {
            state.is_perfect_pour = v;
        }
        if let Some(v) = whisk_intensity {
            debug_assert!(v <= 100, "whisk intensity out of range: {v}");
            state.whisk_intensity = v;
        }
        if let Some(v) = is_perfect_whisk {
            state.is_perfect_whisk = v;
        }
        if let Some(v) = serve_style {
            state.serve_style = v;
        }
        if let Some(v) = garnish {
            state.garnish = v;
        }
        if let Some(v) = background {
            state.background = v;
        }
        if let Some(v) = music_track {
            state.music_track = v;
        }
    }

    /// Plain setter, no validation; completion predicates live in the engines
    pub fn go_to_step(&mut self, step: Step) {
        self.state.current_step = step;
    }

    /// Restore the documented defaults
    pub fn reset(&mut self) {
        self.state = GameState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop::sample::select(Step::ALL.to_vec())
    }

    fn update_strategy() -> impl Strategy<Value = GameStateUpdate> {
        (
            (
                prop::option::of(prop::sample::select(VibeId::ALL.to_vec())),
                prop::option::of(any::<bool>()),
                prop::option::of(0u32..=100),
                prop::option::of(0u32..=100),
                prop::option::of(0u32..=100),
                prop::option::of(any::<bool>()),
            ),
            (
                prop::option::of(0u32..=100),
                prop::option::of(any::<bool>()),
                prop::option::of(prop::sample::select(ServeStyle::ALL.to_vec())),
                prop::option::of(prop::sample::select(Garnish::ALL.to_vec())),
                prop::option::of("[a-z]{1,8}"),
                prop::option::of("[a-z]{1,8}"),
            ),
        )
            .prop_map(|(a, b)| GameStateUpdate {
                selected_vibe: a.0,
                show_quote: a.1,
                matcha_amount: a.2,
                water_amount: a.3,
                water_temperature: a.4,
                is_perfect_pour: a.5,
                whisk_intensity: b.0,
                is_perfect_whisk: b.1,
                serve_style: b.2,
                garnish: b.3,
                background: b.4,
                music_track: b.5,
            })
    }

    /// Apply `update` by hand to an expected record
    fn expected_after(mut state: GameState, update: &GameStateUpdate) -> GameState {
        if let Some(v) = update.selected_vibe {
            state.selected_vibe = Some(v);
        }
        state.show_quote = update.show_quote.unwrap_or(state.show_quote);
        state.matcha_amount = update.matcha_amount.unwrap_or(state.matcha_amount);
        state.water_amount = update.water_amount.unwrap_or(state.water_amount);
        state.water_temperature = update.water_temperature.unwrap_or(state.water_temperature);
        state.is_perfect_pour = update.is_perfect_pour.unwrap_or(state.is_perfect_pour);
        state.whisk_intensity = update.whisk_intensity.unwrap_or(state.whisk_intensity);
        state.is_perfect_whisk = update.is_perfect_whisk.unwrap_or(state.is_perfect_whisk);
        state.serve_style = update.serve_style.unwrap_or(state.serve_style);
        state.garnish = update.garnish.unwrap_or(state.garnish);
        if let Some(v) = &update.background {
            state.background = v.clone();
        }
        if let Some(v) = &update.music_track {
            state.music_track = v.clone();
        }
        state
    }

    proptest! {
        #[test]
        fn prop_update_touches_only_present_fields(
            first in update_strategy(),
            second in update_strategy(),
            step in step_strategy(),
        ) {
            let mut store = GameStore::new();
            store.go_to_step(step);
            store.update(first);
            let before = store.get().clone();

            store.update(second.clone());

            prop_assert_eq!(store.get(), &expected_after(before, &second));
            prop_assert_eq!(store.current_step(), step);
        }

        #[test]
        fn prop_reset_restores_defaults(update in update_strategy(), step in step_strategy()) {
            let mut store = GameStore::new();
            store.update(update);
            store.go_to_step(step);
            store.reset();
            prop_assert_eq!(store.get(), &GameState::default());
        }
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut store = GameStore::new();
        store.update(GameStateUpdate {
            matcha_amount: Some(40),
            ..Default::default()
        });
        let before = store.get().clone();
        assert!(GameStateUpdate::default().is_empty());
        store.update(GameStateUpdate::default());
        assert_eq!(store.get(), &before);
    }

    #[test]
    fn test_vibe_selection_cleared_only_by_reset() {
        let mut store = GameStore::new();
        store.update(GameStateUpdate {
            selected_vibe: Some(VibeId::Nomad),
            ..Default::default()
        });
        store.update(GameStateUpdate {
            selected_vibe: None,
            show_quote: Some(true),
            ..Default::default()
        });
        assert_eq!(store.get().selected_vibe, Some(VibeId::Nomad));

        store.reset();
        assert_eq!(store.get().selected_vibe, None);
    }

    #[test]
    fn test_step_sequence() {
        assert_eq!(Step::Intro.next(), Some(Step::ChooseVibe));
        assert_eq!(Step::Whisk.next(), Some(Step::Serve));
        assert_eq!(Step::Certificate.next(), None);
        assert_eq!(Step::Intro.previous(), None);
        assert_eq!(Step::Scoop.previous(), Some(Step::ChooseVibe));
        assert!(Step::Certificate.is_terminal());
        assert_eq!(Step::from_str("choose-vibe"), Some(Step::ChooseVibe));
        assert_eq!(Step::ChooseVibe.to_string(), "choose-vibe");
    }

    #[test]
    fn test_update_rejects_unknown_fields() {
        let parsed: Result<GameStateUpdate, _> =
            serde_json::from_str(r#"{ "currentStep": "serve" }"#);
        assert!(parsed.is_err());

        let parsed: GameStateUpdate =
            serde_json::from_str(r#"{ "waterAmount": 45, "garnish": "whipped-cream" }"#).unwrap();
        assert_eq!(parsed.water_amount, Some(45));
        assert_eq!(parsed.garnish, Some(Garnish::WhippedCream));
    }
}
