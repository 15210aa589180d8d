use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Taxonomies with a fixed label -> colour table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Resolution,
    Codec,
    Hdr,
}

const RESOLUTION_COLORS: &[(&str, &str)] = &[
    ("4K", "#6a0dad"),
    ("Full HD", "#2e5cb8"),
    ("HD", "#17a2b8"),
    ("SD", "#6c757d"),
];

const CODEC_COLORS: &[(&str, &str)] = &[
    ("HEVC", "#5cb85c"),
    ("AV1", "#d9534f"),
    ("AVC", "#5bc0de"),
    ("VP9", "#f0ad4e"),
    ("MPEG", "#777777"),
];

const HDR_COLORS: &[(&str, &str)] = &[
    ("HDR10", "#e6a919"),
    ("HDR10+", "#ff9500"),
    ("Dolby Vision", "#a50034"),
    ("HLG", "#bf5700"),
    ("Kein HDR", "#aaaaaa"),
];

/// General-purpose ordered palette, assigned by position.
pub const FALLBACK_PALETTE: &[&str] = &[
    "#4e73df", "#1cc88a", "#36b9cc", "#f6c23e", "#e74a3b", "#5a5c69", "#6f42c1", "#20c9a6",
    "#fd7e14", "#6610f2",
];

/// Ordered palette for container formats, assigned by position.
pub const CONTAINER_PALETTE: &[&str] = &[
    "#607D8B", "#795548", "#9E9E9E", "#FF5722", "#FFEB3B", "#CDDC39", "#4CAF50", "#009688",
    "#00BCD4", "#03A9F4",
];

impl Category {
    pub fn fixed_color(self, label: &str) -> Option<&'static str> {
        let table = match self {
            Category::Resolution => RESOLUTION_COLORS,
            Category::Codec => CODEC_COLORS,
            Category::Hdr => HDR_COLORS,
        };
        table
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, color)| *color)
    }
}

/// Colour at `index`, wrapping around when the palette runs out.
pub fn palette_color(palette: &[&'static str], index: usize) -> &'static str {
    palette[index % palette.len()]
}

/// A uniformly random `#RRGGBB` colour.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut color = String::with_capacity(7);
    color.push('#');
    for _ in 0..6 {
        color.push(DIGITS[rng.random_range(0..16)] as char);
    }
    color
}

/// Resolves label colours for one refresh cycle.
///
/// Fixed palette entries win. Unknown labels get a random colour which is
/// memoised, so the same label keeps its colour until the resolver is dropped.
#[derive(Debug)]
pub struct ColorResolver<R = StdRng> {
    rng: R,
    generated: HashMap<String, String>,
}

impl ColorResolver<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ColorResolver<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            generated: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, category: Category, label: &str) -> String {
        if let Some(color) = category.fixed_color(label) {
            return color.to_string();
        }
        if let Some(color) = self.generated.get(label) {
            return color.clone();
        }

        let color = random_color(&mut self.rng);
        debug!(?category, label, %color, "generated colour for unknown label");
        self.generated.insert(label.to_string(), color.clone());
        color
    }

    /// Number of labels that needed a generated colour so far.
    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }
}
