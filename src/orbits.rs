// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orbit traps.
//!
//! Instead of counting iterations, an orbit-trapped fractal scores a
//! point by how close its orbit comes to some shape.  Each trap offers
//! two measurements: a cheap *fast value* that is monotonic in the true
//! distance and is taken at every iteration, and a *normalized value*
//! that turns the best fast value into a distance in `[0, max_value]`
//! once the loop is done.
//!
//! Point and line traps calibrate their normalization against the
//! corners of the canonical Mandelbrot viewport when they are built;
//! nothing about a trap changes afterwards, so a slice of traps can be
//! read from every band worker at once.

use num::Complex;
use std::path::Path;

use crate::edt::{distance_transform, DistanceField, Mask};
use crate::errors::FractalError;

/// Corners of the canonical viewport `[-2, 1] × [-1, 1]`.
const CALIBRATION_CORNERS: [Complex<f64>; 4] = [
    Complex::new(-2.0, -1.0),
    Complex::new(-2.0, 1.0),
    Complex::new(1.0, 1.0),
    Complex::new(1.0, -1.0),
];

/// Linear map from a true distance onto `[0, max_value]`.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Calibration {
    translation: f64,
    factor: f64,
}

impl Calibration {
    /// Spread the distances seen at the calibration corners over
    /// `[0, max_value]`.  The lower end is anchored at zero so that the
    /// trap itself always scores zero.
    fn from_corners<F>(max_value: f64, distance: F) -> Result<Self, FractalError>
    where
        F: Fn(Complex<f64>) -> f64,
    {
        check_max_value(max_value)?;
        let (min, max) = CALIBRATION_CORNERS
            .iter()
            .map(|corner| distance(*corner))
            .fold((0.0_f64, 0.0_f64), |(lo, hi), d| (lo.min(d), hi.max(d)));
        if !(max > min) || !max.is_finite() {
            return Err(FractalError::config(
                "orbit trap distances do not span the canonical viewport",
            ));
        }
        Ok(Calibration {
            translation: min,
            factor: (max_value - min) / (max - min),
        })
    }

    fn apply(&self, distance: f64) -> f64 {
        (distance - self.translation) * self.factor
    }
}

fn check_max_value(max_value: f64) -> Result<(), FractalError> {
    if max_value.is_finite() && max_value > 0.0 {
        Ok(())
    } else {
        Err(FractalError::config(format!(
            "orbit range must be a positive number, got {}",
            max_value
        )))
    }
}

/// Traps orbits near the point `(x, y)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointOrbit {
    x: f64,
    y: f64,
    calibration: Calibration,
}

impl PointOrbit {
    /// A point trap whose distances are spread over `[0, max_value]`.
    pub fn new(x: f64, y: f64, max_value: f64) -> Result<Self, FractalError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(FractalError::config("point orbit must have finite coordinates"));
        }
        let center = Complex::new(x, y);
        let calibration = Calibration::from_corners(max_value, |z| (z - center).norm())?;
        Ok(PointOrbit { x, y, calibration })
    }

    /// Squared distance from `z` to the point.
    pub fn fast_value(&self, z: Complex<f64>) -> f64 {
        (z.re - self.x) * (z.re - self.x) + (z.im - self.y) * (z.im - self.y)
    }

    /// Turn a squared distance into a normalized distance.
    pub fn normalized_value(&self, fast: f64) -> f64 {
        self.calibration.apply(fast.sqrt())
    }
}

/// Traps orbits near the line `a·x + b·y + c = 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineOrbit {
    a: f64,
    b: f64,
    c: f64,
    norm: f64,
    calibration: Calibration,
}

impl LineOrbit {
    /// A line trap.  `a` and `b` may not both be zero.
    pub fn new(a: f64, b: f64, c: f64, max_value: f64) -> Result<Self, FractalError> {
        let norm = (a * a + b * b).sqrt();
        if !(norm > 0.0) || !norm.is_finite() || !c.is_finite() {
            return Err(FractalError::config(format!(
                "line {}x + {}y + {} = 0 is degenerate",
                a, b, c
            )));
        }
        let calibration = Calibration::from_corners(max_value, |z| {
            (a * z.re + b * z.im + c).abs() / norm
        })?;
        Ok(LineOrbit {
            a,
            b,
            c,
            norm,
            calibration,
        })
    }

    /// Square of `a·x + b·y + c`, which is the squared distance times
    /// `a² + b²`.
    pub fn fast_value(&self, z: Complex<f64>) -> f64 {
        let side = self.a * z.re + self.b * z.im + self.c;
        side * side
    }

    /// Turn a fast value into a normalized distance.
    pub fn normalized_value(&self, fast: f64) -> f64 {
        self.calibration.apply(fast.sqrt() / self.norm)
    }
}

/// Where the mask sits in the complex plane: its top left pixel is at
/// `-2 + 1i` and it spans three units across and two down.
const MASK_LEFT: f64 = -2.0;
const MASK_TOP: f64 = 1.0;
const MASK_SPAN_RE: f64 = 3.0;
const MASK_SPAN_IM: f64 = 2.0;

/// Traps orbits near the black pixels of a mask image.
#[derive(Clone, Debug)]
pub struct ImageOrbit {
    mask_width: usize,
    mask_height: usize,
    distances: DistanceField,
}

impl ImageOrbit {
    /// Precompute the distance field of `mask`.  Distances are in mask
    /// pixels and saturate at `max_value`, which makes them already
    /// normalized.
    pub fn from_mask(mask: &Mask, max_value: f64) -> Result<Self, FractalError> {
        check_max_value(max_value)?;
        if mask.width() == 0 || mask.height() == 0 {
            return Err(FractalError::config("orbit mask is empty"));
        }
        Ok(ImageOrbit {
            mask_width: mask.width(),
            mask_height: mask.height(),
            distances: distance_transform(mask, max_value)?,
        })
    }

    /// Load the mask at `path`, then build as `from_mask` does.
    pub fn open<P: AsRef<Path>>(path: P, max_value: f64) -> Result<Self, FractalError> {
        let mask = Mask::open(path)?;
        ImageOrbit::from_mask(&mask, max_value)
    }

    /// Distance from `z` to the nearest black pixel.
    pub fn fast_value(&self, z: Complex<f64>) -> f64 {
        let x = (z.re - MASK_LEFT) / MASK_SPAN_RE * self.mask_width as f64;
        let y = (MASK_TOP - z.im) / MASK_SPAN_IM * self.mask_height as f64;
        if !x.is_finite() || !y.is_finite() {
            return self.distances.cap();
        }
        self.distances.get(x.floor() as i64, y.floor() as i64)
    }

    /// Field distances are already in range.
    pub fn normalized_value(&self, fast: f64) -> f64 {
        fast
    }
}

/// Any of the supported traps.
#[derive(Clone, Debug)]
pub enum Orbit {
    /// See [`PointOrbit`].
    Point(PointOrbit),
    /// See [`LineOrbit`].
    Line(LineOrbit),
    /// See [`ImageOrbit`].
    Image(ImageOrbit),
}

impl Orbit {
    /// Cheap monotonic surrogate of the distance from `z` to the trap.
    pub fn fast_value(&self, z: Complex<f64>) -> f64 {
        match self {
            Orbit::Point(orbit) => orbit.fast_value(z),
            Orbit::Line(orbit) => orbit.fast_value(z),
            Orbit::Image(orbit) => orbit.fast_value(z),
        }
    }

    /// Map a fast value onto `[0, max_value]`.
    pub fn normalized_value(&self, fast: f64) -> f64 {
        match self {
            Orbit::Point(orbit) => orbit.normalized_value(fast),
            Orbit::Line(orbit) => orbit.normalized_value(fast),
            Orbit::Image(orbit) => orbit.normalized_value(fast),
        }
    }
}

impl From<PointOrbit> for Orbit {
    fn from(orbit: PointOrbit) -> Self {
        Orbit::Point(orbit)
    }
}

impl From<LineOrbit> for Orbit {
    fn from(orbit: LineOrbit) -> Self {
        Orbit::Line(orbit)
    }
}

impl From<ImageOrbit> for Orbit {
    fn from(orbit: ImageOrbit) -> Self {
        Orbit::Image(orbit)
    }
}

/// The trap used when a requested one cannot be built.
pub fn default_orbit() -> Result<Orbit, FractalError> {
    PointOrbit::new(0.5, -0.7, 100.0).map(Orbit::from)
}
