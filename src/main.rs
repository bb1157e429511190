//! Matcha Ritual entry point
//!
//! Plays one complete session in autoplay mode on the virtual clock and
//! prints the final state as JSON.
//!
//! Usage: matcha-ritual [--seed N] [--pace standard|brisk|instant] [--tuning FILE] [--vibe ID]

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use matcha_ritual::sim::{Garnish, ServeStyle, Session, Step, VibeId, WhiskSample};
use matcha_ritual::tuning::Pace;
use matcha_ritual::{RitualError, Tuning};

/// Safety cap on virtual time spent waiting inside one step
const SETTLE_LIMIT_MS: u64 = 30_000;
/// Whisk strokes tried before falling back to the manual continue
const MAX_STROKES: u32 = 200;

/// Autoplay one matcha ritual and print the final state
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Seed for the autoplay randomness
    #[arg(long, default_value_t = 0x6d61_7463_6861)]
    seed: u64,
    /// Timing preset: standard, brisk or instant
    #[arg(long, value_parser = parse_pace, default_value = "standard")]
    pace: Pace,
    /// JSON tuning file (compressed by the pace divisor)
    #[arg(long, value_name = "FILE")]
    tuning: Option<PathBuf>,
    /// Vibe to pick instead of a random one
    #[arg(long, value_parser = parse_vibe)]
    vibe: Option<VibeId>,
}

fn parse_pace(s: &str) -> Result<Pace, String> {
    Pace::from_str(s).ok_or(format!("unknown pace: {s}"))
}

fn parse_vibe(s: &str) -> Result<VibeId, String> {
    VibeId::from_str(s).ok_or(format!("unknown vibe: {s}"))
}

/// Advance in small slices until the step changes or the limit runs out
fn settle(session: &mut Session, from: Step) -> bool {
    let deadline = session.now() + SETTLE_LIMIT_MS;
    while session.state().current_step == from && session.now() < deadline {
        session.advance(10);
    }
    session.state().current_step != from
}

/// Fall back to the manual continue if the timers didn't move us on
fn settle_or_continue(session: &mut Session, from: Step) -> Result<(), RitualError> {
    if !settle(session, from) {
        log::warn!("No auto-advance from {from}, continuing manually");
        session.continue_step()?;
    }
    Ok(())
}

fn play(session: &mut Session, rng: &mut Pcg32, vibe: Option<VibeId>) -> Result<(), RitualError> {
    session.start()?;

    let vibe = vibe.unwrap_or(VibeId::ALL[rng.random_range(0..VibeId::ALL.len())]);
    session.select_vibe(vibe)?;
    log::info!("\"{}\"", vibe.vibe().quote);
    settle_or_continue(session, Step::ChooseVibe)?;

    let action_ms = session.tuning().scoop.action_ms;
    while session.scoop_engine().is_some_and(|s| s.amount() < session.tuning().scoop.capacity) {
        session.scoop()?;
        session.advance(action_ms + rng.random_range(0..200));
    }
    settle_or_continue(session, Step::Scoop)?;

    // Release somewhere around the target; overshooting is part of the fun
    let pour = session.tuning().pour.clone();
    let release_at = rng.random_range(pour.target.saturating_sub(pour.tolerance + 5)..=pour.max);
    session.start_pour()?;
    while session
        .pour_engine()
        .is_some_and(|p| p.is_pouring() && p.amount() < release_at)
    {
        session.advance(pour.tick_ms);
    }
    if session.state().current_step == Step::Pour {
        session.stop_pour()?;
    }
    settle_or_continue(session, Step::Pour)?;

    session.pointer_enter()?;
    session.pointer_down()?;
    let mut y = 200.0;
    let mut strokes = 0;
    while session
        .whisk_engine()
        .is_some_and(|w| !w.detector().target_reached())
        && strokes < MAX_STROKES
    {
        let at_ms = session.now() + rng.random_range(60..160);
        y = if y > 200.0 { 200.0 } else { 200.0 + rng.random_range(30.0..90.0) };
        session.feed_whisk_sample(WhiskSample::active(at_ms, Vec2::new(320.0, y)))?;
        strokes += 1;
    }
    if let Some(bowl) = session.whisk_engine() {
        log::info!("{}", bowl.detector().message());
        session.pointer_up()?;
    }
    settle_or_continue(session, Step::Whisk)?;

    session.choose_serve_style(ServeStyle::ALL[rng.random_range(0..ServeStyle::ALL.len())])?;
    session.choose_garnish(Garnish::ALL[rng.random_range(0..Garnish::ALL.len())])?;
    session.serve()?;
    session.advance(session.tuning().serve.certificate_delay_ms);
    session.continue_step()?;
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?.compressed(args.pace.divisor()),
        None => Tuning::from_pace(args.pace),
    };

    log::info!(
        "Matcha Ritual starting (seed {}, pace {})",
        args.seed,
        args.pace.as_str()
    );
    let mut rng = Pcg32::seed_from_u64(args.seed);
    let mut session = Session::new(tuning);
    play(&mut session, &mut rng, args.vibe)?;

    log::info!("Ritual complete at {}ms", session.now());
    println!("{}", serde_json::to_string_pretty(session.state())?);
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["matcha-ritual"]).unwrap();
        assert_eq!(args.seed, 0x6d61_7463_6861);
        assert_eq!(args.pace, Pace::Standard);
        assert!(args.tuning.is_none());
        assert!(args.vibe.is_none());
    }

    #[test]
    fn test_args_flags() {
        let args = Args::try_parse_from([
            "matcha-ritual",
            "--seed",
            "7",
            "--pace",
            "BRISK",
            "--vibe",
            "poet",
            "--tuning",
            "ritual.json",
        ])
        .unwrap();
        assert_eq!(args.seed, 7);
        assert_eq!(args.pace, Pace::Brisk);
        assert_eq!(args.vibe, Some(VibeId::Poet));
        assert_eq!(args.tuning, Some(PathBuf::from("ritual.json")));

        assert!(Args::try_parse_from(["matcha-ritual", "--pace", "glacial"]).is_err());
        assert!(Args::try_parse_from(["matcha-ritual", "--vibe", "monk"]).is_err());
    }
}
