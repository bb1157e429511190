//! Deterministic ritual simulation
//!
//! All control and scoring logic lives here. This module must stay pure:
//! - Virtual clock only (no wall time, no threads)
//! - One writer: the session applies every mutation in event order
//! - No rendering or platform dependencies

pub mod catalog;
pub mod pour;
pub mod scheduler;
pub mod scoop;
pub mod serve;
pub mod session;
pub mod state;
pub mod vibe;
pub mod whisk;

pub use catalog::{PHILOSOPHY_LINES, Rgba, VIBES, Vibe};
pub use pour::PourSimulator;
pub use scheduler::{Fired, Scheduler, TaskId};
pub use scoop::ScoopAccumulator;
pub use serve::{ServeTable, served_color, served_foam};
pub use session::{Intent, Session, Task};
pub use state::{Garnish, GameState, GameStateUpdate, GameStore, ServeStyle, Step, VibeId};
pub use vibe::{RevealPhase, VibeSelection};
pub use whisk::{WhiskBowl, WhiskDetector, WhiskEvent, WhiskSample, detect, foam_level, matcha_color};
