// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parallel rasterizer.
//!
//! The image is cut into contiguous bands of whole rows, one scoped
//! thread per band.  Each band owns its slice of the output buffer, so
//! the workers never share a writable element and need no locks.  All
//! bands are joined before anything is returned: a caller gets either
//! the whole image or an error.

use image::{ImageBuffer, Rgba};
use itertools::iproduct;
use std::time::Instant;

use crate::computation::Fractal;
use crate::errors::FractalError;
use crate::palettes::Color;
use crate::params::ImageParams;

/// A 16-bit RGBA image, ready for any encoder that takes one.
pub type PixelBuffer = ImageBuffer<Rgba<u16>, Vec<u16>>;

const CHANNELS: usize = 4;

/// Fill a `width` by `height` image by calling `compute(x, y)` for
/// every pixel, spread over `bands` worker threads.
///
/// A panicking worker fails the whole render with
/// `FractalError::Worker`.
pub fn render<F>(
    compute: &F,
    width: usize,
    height: usize,
    bands: usize,
) -> Result<PixelBuffer, FractalError>
where
    F: Fn(usize, usize) -> Color + Sync + ?Sized,
{
    if width == 0 || height == 0 {
        return Err(FractalError::config(format!(
            "cannot render a {}x{} image",
            width, height
        )));
    }
    let started = Instant::now();
    let bands = bands.max(1);
    let rows_per_band = height / bands + 1;
    let row_len = width * CHANNELS;
    let mut raw = vec![0u16; row_len * height];

    debug!(
        "rendering {}x{} in bands of {} rows over {} threads",
        width, height, rows_per_band, bands
    );

    crossbeam::scope(|spawner| {
        for (band, region) in raw.chunks_mut(rows_per_band * row_len).enumerate() {
            spawner.spawn(move |_| {
                let top = band * rows_per_band;
                let rows = top..top + region.len() / row_len;
                for ((y, x), pixel) in
                    iproduct!(rows, 0..width).zip(region.chunks_exact_mut(CHANNELS))
                {
                    pixel.copy_from_slice(&compute(x, y).0);
                }
            });
        }
    })
    .map_err(|_| FractalError::Worker)?;

    let buffer = ImageBuffer::from_raw(width as u32, height as u32, raw)
        .ok_or(FractalError::Buffer(width, height))?;
    info!(
        "rendered {}x{} in {:.3}s",
        width,
        height,
        started.elapsed().as_secs_f64()
    );
    Ok(buffer)
}

/// Validate `params`, build the computation for `fractal` and render it.
pub fn render_image(
    params: &ImageParams,
    fractal: &Fractal,
    threads: usize,
) -> Result<PixelBuffer, FractalError> {
    params.validate()?;
    let computer = fractal.computer(params)?;
    render(&*computer, params.width, params.height, threads)
}
