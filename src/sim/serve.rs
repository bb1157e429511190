//! Serving: pick a style and garnish, serve, then unlock the certificate

use super::catalog::{MATCHA_BASE, Rgba};
use super::session::{Ctx, Task};
use super::state::{Garnish, GameStateUpdate, ServeStyle, Step};
use crate::error::RitualError;

#[derive(Debug, Clone, Default)]
pub struct ServeTable {
    served: bool,
    certificate_ready: bool,
}

impl ServeTable {
    pub fn is_served(&self) -> bool {
        self.served
    }

    /// Certificate affordance is shown a moment after serving
    pub fn certificate_ready(&self) -> bool {
        self.certificate_ready
    }

    pub(crate) fn choose_style(&mut self, ctx: &mut Ctx, style: ServeStyle) {
        ctx.store.update(GameStateUpdate {
            serve_style: Some(style),
            ..Default::default()
        });
    }

    pub(crate) fn choose_garnish(&mut self, ctx: &mut Ctx, garnish: Garnish) {
        ctx.store.update(GameStateUpdate {
            garnish: Some(garnish),
            ..Default::default()
        });
    }

    pub(crate) fn serve(&mut self, ctx: &mut Ctx) {
        if self.served {
            return;
        }
        self.served = true;
        let state = ctx.store.get();
        log::info!(
            "Served {} with garnish {}",
            state.serve_style.name(),
            state.garnish.name()
        );
        ctx.scheduler.schedule(
            Step::Serve,
            ctx.tuning.serve.certificate_delay_ms,
            Task::RevealCertificate,
        );
    }

    pub(crate) fn on_reveal_certificate(&mut self) {
        self.certificate_ready = true;
    }

    pub(crate) fn finish(&self) -> Result<Step, RitualError> {
        if !self.served {
            return Err(RitualError::NotServed);
        }
        Ok(Step::Certificate)
    }
}

/// Served cup colour: paler the less it was whisked
pub fn served_color(whisk_intensity: u32) -> Rgba {
    let intensity = whisk_intensity.min(100) as f32 / 100.0;
    let lighten = |c: f32| (c + (255.0 - c) * (1.0 - intensity) * 0.7).min(255.0);
    let [r, g, b] = MATCHA_BASE;
    Rgba::new(lighten(r), lighten(g), lighten(b), 0.9)
}

/// Foam shown on the served cup, 20-100
pub fn served_foam(whisk_intensity: u32) -> f32 {
    (20.0 + whisk_intensity as f32 * 0.8).min(100.0)
}
