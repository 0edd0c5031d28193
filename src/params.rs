// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single configuration value every computation reads.

use crate::errors::FractalError;
use crate::palettes::Palette;

/// Default left edge of the viewport.
pub const LEFT: f64 = -2.0;
/// Default right edge of the viewport.
pub const RIGHT: f64 = 1.0;
/// Default top edge of the viewport.
pub const TOP: f64 = 1.0;
/// Default bottom edge of the viewport.
pub const BOTTOM: f64 = -1.0;
/// Default image width in pixels.
pub const WIDTH: usize = 900;
/// Default image height in pixels.
pub const HEIGHT: usize = 600;
/// Default iteration budget.
pub const MAX_ITER: u32 = 100;

/// Describes one image: which part of the complex plane it shows, at
/// what resolution, how hard to iterate and how to color the result.
///
/// `right > left` is not required; swapping the edges flips the image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageParams {
    /// Real coordinate of the left edge.
    pub left: f64,
    /// Real coordinate of the right edge.
    pub right: f64,
    /// Imaginary coordinate of the top edge.
    pub top: f64,
    /// Imaginary coordinate of the bottom edge.
    pub bottom: f64,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Iteration budget of the escape-time loops.
    pub max_iter: u32,
    /// Exponent of the Multibrot recurrence; 2 is the Mandelbrot set.
    pub power: f64,
    /// Colors of the image.
    pub palette: Palette,
}

impl Default for ImageParams {
    fn default() -> Self {
        ImageParams {
            left: LEFT,
            right: RIGHT,
            top: TOP,
            bottom: BOTTOM,
            width: WIDTH,
            height: HEIGHT,
            max_iter: MAX_ITER,
            power: 2.0,
            palette: Palette::default(),
        }
    }
}

impl ImageParams {
    /// Reject anything that would make the scaler divide by zero or
    /// feed NaN into the iteration loops.
    pub fn validate(&self) -> Result<(), FractalError> {
        let bounds = [
            ("left", self.left),
            ("right", self.right),
            ("top", self.top),
            ("bottom", self.bottom),
        ];
        for (name, value) in &bounds {
            if !value.is_finite() {
                return Err(FractalError::config(format!(
                    "{} bound must be finite, got {}",
                    name, value
                )));
            }
        }
        if self.width == 0 || self.height == 0 {
            return Err(FractalError::config(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_iter == 0 {
            return Err(FractalError::config("iteration count must be positive"));
        }
        if !self.power.is_finite() || self.power <= 1.0 {
            return Err(FractalError::config(format!(
                "power must be a finite number above 1, got {}",
                self.power
            )));
        }
        Ok(())
    }

    /// A square viewport of half-width `window` centered on `(x, y)`.
    pub fn centered(mut self, x: f64, y: f64, window: f64) -> Self {
        self.left = x - window;
        self.right = x + window;
        self.top = y - window;
        self.bottom = y + window;
        self
    }
}
