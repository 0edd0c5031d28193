// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Continuous palettes.  A palette is an ordered list of colors that
//! a computed value cycles through, plus one color reserved for points
//! that never escaped.  Colors are 16 bits per channel so they drop
//! straight into the output buffer.

use image::Rgba;
use num::clamp;

use crate::errors::FractalError;

/// A 16-bit-per-channel RGBA color.
pub type Color = Rgba<u16>;

const fn rgb8(r: u8, g: u8, b: u8) -> Color {
    // 0xAB -> 0xABAB spreads an 8-bit channel evenly over 16 bits.
    Rgba([
        (r as u16) * 257,
        (g as u16) * 257,
        (b as u16) * 257,
        u16::MAX,
    ])
}

/// Pure black.
pub const BLACK: Color = rgb8(0, 0, 0);
/// Pure white.
pub const WHITE: Color = rgb8(255, 255, 255);

/// Every color that can be asked for by name.
pub const NAMED_COLORS: &[(&str, Color)] = &[
    ("blue", rgb8(0, 0, 255)),
    ("red", rgb8(255, 0, 0)),
    ("green", rgb8(0, 255, 0)),
    ("yellow", rgb8(255, 255, 0)),
    ("magenta", rgb8(255, 0, 255)),
    ("cyan", rgb8(0, 255, 255)),
    ("black", BLACK),
    ("white", WHITE),
    ("darkgreen", rgb8(0, 100, 0)),
    ("champagne", rgb8(247, 231, 206)),
    ("darkchampagne", rgb8(41, 25, 0)),
    ("orange", rgb8(255, 127, 0)),
    ("violet", rgb8(139, 0, 255)),
    ("lightpink", rgb8(255, 182, 193)),
    ("lightgreen", rgb8(172, 225, 175)),
    ("purple", rgb8(148, 0, 211)),
    ("indigo", rgb8(75, 0, 130)),
    ("teal", rgb8(0, 128, 128)),
    ("darkblue", rgb8(0, 0, 128)),
    ("softpink", rgb8(255, 221, 244)),
];

/// Look a color up by its lowercase name.
pub fn color_by_name(name: &str) -> Option<Color> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, color)| *color)
}

/// The colors used to paint one render.  Once built, a palette is
/// only ever read, so it can be shared freely between band workers.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    divergence: Color,
    colors: Vec<Color>,
    max_value: u32,
}

impl Palette {
    /// `max_value` is the period of the palette: raw values are taken
    /// modulo it before being spread over `colors`.
    pub fn new(divergence: Color, colors: Vec<Color>, max_value: u32) -> Result<Self, FractalError> {
        if colors.is_empty() {
            return Err(FractalError::config("a palette needs at least one color"));
        }
        if max_value == 0 {
            return Err(FractalError::config("the palette period must be positive"));
        }
        Ok(Palette {
            divergence,
            colors,
            max_value,
        })
    }

    /// The color of points that did not escape.
    pub fn divergence(&self) -> Color {
        self.divergence
    }

    /// The ordered color list.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// The period of the palette.
    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    /// Same colors, different period.
    pub fn with_max_value(self, max_value: u32) -> Result<Self, FractalError> {
        Palette::new(self.divergence, self.colors, max_value)
    }

    /// Map a computed value to a color.
    ///
    /// The value is wrapped into `[0, max_value)`, normalized, then
    /// pushed through a cubic easing that flattens the middle of each
    /// cycle and steepens its ends.  The eased value picks a pair of
    /// neighbouring colors and a blend factor between them.
    pub fn color(&self, raw_value: f64, converged: bool) -> Color {
        if !converged {
            return self.divergence;
        }
        if self.colors.len() == 1 {
            return self.colors[0];
        }

        let period = f64::from(self.max_value);
        let mut normalized = raw_value.rem_euclid(period) / period;
        // rem_euclid of a tiny negative value can round up to the period.
        if normalized >= 1.0 {
            normalized = 0.0;
        }
        let eased = ((normalized - 0.5).powi(3) + 0.125) / 0.25;

        let segments = self.colors.len() - 1;
        let position = segments as f64 * eased;
        let index = (position.floor() as usize) % segments;
        let blend = position - index as f64;

        let from = self.colors[index];
        let to = self.colors[index + 1];
        let mut out = [0u16; 4];
        for channel in 0..3 {
            let mixed =
                f64::from(to.0[channel]) * blend + f64::from(from.0[channel]) * (1.0 - blend);
            out[channel] = clamp(mixed.round(), 0.0, f64::from(u16::MAX)) as u16;
        }
        out[3] = u16::MAX;
        Rgba(out)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            divergence: BLACK,
            colors: vec![WHITE, BLACK, WHITE],
            max_value: 100,
        }
    }
}

/// Free-function form of [`Palette::color`].
pub fn color_from_palette(raw_value: f64, converged: bool, palette: &Palette) -> Color {
    palette.color(raw_value, converged)
}
