//! Static reference data: vibes, serving options, scoop philosophy

use super::state::{Garnish, ServeStyle, VibeId};

/// A selectable vibe (read-only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vibe {
    pub id: VibeId,
    pub name: &'static str,
    pub description: &'static str,
    pub quote: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

pub static VIBES: [Vibe; 3] = [
    Vibe {
        id: VibeId::Philosopher,
        name: "The Philosopher's Cup",
        description: "For those who contemplate the void between sips.",
        quote: "Do not choose your drink. Let your drink choose you.",
        color: "#2c5f2d",
        icon: "☯️",
    },
    Vibe {
        id: VibeId::Poet,
        name: "The Urban Poet's Fuel",
        description: "For verses that flow like a perfectly steeped brew.",
        quote: "In the steam rises the soul of the city.",
        color: "#4a6fa5",
        icon: "✍️",
    },
    Vibe {
        id: VibeId::Nomad,
        name: "The Wandering Nomad's Elixir",
        description: "For those who find home in the journey, not the destination.",
        quote: "Not all who wander are lost, but your matcha might be.",
        color: "#8b5a2b",
        icon: "🌍",
    },
];

impl VibeId {
    /// Catalog entry for this vibe
    pub fn vibe(&self) -> &'static Vibe {
        match self {
            VibeId::Philosopher => &VIBES[0],
            VibeId::Poet => &VIBES[1],
            VibeId::Nomad => &VIBES[2],
        }
    }
}

/// Base matcha liquid colour (RGB, 0-255)
pub const MATCHA_BASE: [f32; 3] = [57.0, 96.0, 60.0];

/// Display colour handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.2})",
            self.r.round() as u8,
            self.g.round() as u8,
            self.b.round() as u8,
            self.a
        )
    }
}

/// Lines rotated under the scoop, in display order
pub const PHILOSOPHY_LINES: [&str; 5] = [
    "This teaspoon holds more than tea. It holds restraint.",
    "The measure of a man is in his patience, not his portion.",
    "A single gram can tip the scales of perfection.",
    "Precision is the language of the enlightened.",
    "Too much, and you're a glutton. Too little, and you're a miser.",
];

impl ServeStyle {
    pub fn name(&self) -> &'static str {
        match self {
            ServeStyle::Traditional => "Traditional",
            ServeStyle::Modern => "Modern",
            ServeStyle::Ceremonial => "Ceremonial",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ServeStyle::Traditional => "Served in a classic chawan with no frills",
            ServeStyle::Modern => "Sleek presentation with latte art",
            ServeStyle::Ceremonial => "Full traditional presentation with chasen and chashaku",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ServeStyle::Traditional => "🍵",
            ServeStyle::Modern => "☕",
            ServeStyle::Ceremonial => "🎎",
        }
    }
}

impl Garnish {
    pub fn name(&self) -> &'static str {
        match self {
            Garnish::None => "None",
            Garnish::Mint => "Mint Leaf",
            Garnish::Flower => "Edible Flower",
            Garnish::Cinnamon => "Cinnamon",
            Garnish::WhippedCream => "Whipped Cream",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Garnish::None => "",
            Garnish::Mint => "🌿",
            Garnish::Flower => "🌸",
            Garnish::Cinnamon => "🌡️",
            Garnish::WhippedCream => "🥛",
        }
    }
}
