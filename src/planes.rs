// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0
//! (the pixels of the image) and a rectangle on the complex plane
//! given by its four edges.
//!
//! The mapper also answers the question of whether native floats are
//! good enough to tell the pixels of a row apart.  At deep zoom they
//! are not, and the whole image has to be computed with big floats.
use num::Complex;
use std::collections::HashSet;

use crate::large_complex::{big, LargeComplex};
use crate::params::ImageParams;

/// Describes the x, y of a pixel in the image.  (0, 0) is the top
/// left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pixel(pub usize, pub usize);

/// How many columns are allowed to collapse onto one another before
/// the native path is considered too coarse.
const COLLAPSE_TOLERANCE: usize = 5;

/// The arithmetic an image must be computed with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Precision {
    /// Plain `f64`.
    Native,
    /// Big floats with this many bits of mantissa.
    Arbitrary(usize),
}

/// Maps the pixels of an image onto its viewport in the complex plane.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    width: usize,
    height: usize,
}

impl PlaneMapper {
    /// Takes the viewport and resolution out of the parameters.
    pub fn new(params: &ImageParams) -> PlaneMapper {
        PlaneMapper {
            left: params.left,
            right: params.right,
            top: params.top,
            bottom: params.bottom,
            width: params.width,
            height: params.height,
        }
    }

    /// The total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Describes that the integral plane has no area.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Given a pixel, return the complex number it sits on.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.left + (pixel.0 as f64) / (self.width as f64) * (self.right - self.left),
            self.top + (pixel.1 as f64) / (self.height as f64) * (self.bottom - self.top),
        )
    }

    /// The same mapping as `pixel_to_point`, except the span and the
    /// offset are applied in big floats.  Only the ratio of the pixel
    /// to the image size is a native float.
    pub fn pixel_to_large(&self, pixel: &Pixel, precision_bits: usize) -> LargeComplex {
        let axis = |ratio: f64, from: f64, to: f64| {
            let from = big(from, precision_bits);
            let span = &big(to, precision_bits) - &from;
            &(&big(ratio, precision_bits) * &span) + &from
        };
        LargeComplex::new(
            axis(
                (pixel.0 as f64) / (self.width as f64),
                self.left,
                self.right,
            ),
            axis(
                (pixel.1 as f64) / (self.height as f64),
                self.top,
                self.bottom,
            ),
        )
    }

    /// Number of different real coordinates the columns of the image
    /// map to in native floats.
    pub fn distinct_columns(&self) -> usize {
        (0..self.width)
            .map(|x| self.pixel_to_point(&Pixel(x, 0)).re.to_bits())
            .collect::<HashSet<u64>>()
            .len()
    }

    /// Native floats are used unless so many columns collapse onto the
    /// same coordinate that the image would visibly band.
    pub fn precision(&self, precision_bits: usize) -> Precision {
        if self.distinct_columns() < self.width.saturating_sub(COLLAPSE_TOLERANCE) {
            Precision::Arbitrary(precision_bits)
        } else {
            Precision::Native
        }
    }
}

/// Map a pixel to the complex plane.
pub fn scale(pixel: &Pixel, params: &ImageParams) -> Complex<f64> {
    PlaneMapper::new(params).pixel_to_point(pixel)
}

/// Map a pixel to the complex plane in big floats.
pub fn scale_high(pixel: &Pixel, params: &ImageParams, precision_bits: usize) -> LargeComplex {
    PlaneMapper::new(params).pixel_to_large(pixel, precision_bits)
}
