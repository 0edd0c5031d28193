#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Marzipan, a fractal renderer
//!
//! Two families of fractals are drawn here.  Escape-time fractals (the
//! Mandelbrot set, a Julia set, the Multibrot sets and their
//! orbit-trapped variants) take every pixel, map it to a point on the
//! complex plane and iterate a polynomial from it, scoring the pixel
//! by how fast the orbit runs away or by how close it comes to a trap.
//! Chaos-game fractals (Barnsley's fern, the Sierpinski triangle and a
//! fractal flame) work the other way around: one point wanders through
//! a set of random maps and every pixel it lands on is counted.
//!
//! Either way the result is a closure from pixel to color, which the
//! rasterizer in `render` drives over bands of the image in parallel.
//!
//! When the viewport is so small that neighbouring pixels collapse
//! onto the same `f64`, the Mandelbrot and Julia evaluators switch to
//! arbitrary-precision floats for the whole image.

extern crate crossbeam;
extern crate dashu_base;
extern crate dashu_float;
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate rand;

pub mod computation;
pub mod edt;
pub mod errors;
pub mod escape;
pub mod ifs;
pub mod large_complex;
pub mod orbits;
pub mod palettes;
pub mod params;
pub mod parsing;
pub mod planes;
pub mod render;

pub use computation::{computer_from_params, Computation, Fractal, FractalType};
pub use errors::FractalError;
pub use orbits::Orbit;
pub use palettes::{Color, Palette};
pub use params::ImageParams;
pub use render::{render, render_image, PixelBuffer};
