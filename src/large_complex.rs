// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A complex number over arbitrary-precision binary floats.
//!
//! Only the three operations the escape-time loop needs exist: square,
//! add and magnitude.  Every operation returns a new value.  Both
//! components always carry a finite precision, so repeated squaring
//! rounds instead of growing without bound.

use dashu_base::Approximation;
use dashu_float::FBig;

/// Working precision of the high-precision path, in bits.
pub const HIGH_PRECISION_BITS: usize = 128;

/// Convert a native float to a big float of the given precision.
/// Non-finite input has no big-float counterpart and becomes zero;
/// callers validate their parameters before getting here.
pub fn big(value: f64, precision_bits: usize) -> FBig {
    let exact = FBig::try_from(value).unwrap_or(FBig::ZERO);
    match exact.with_precision(precision_bits) {
        Approximation::Exact(v) => v,
        Approximation::Inexact(v, _) => v,
    }
}

fn rounded(value: &FBig) -> f64 {
    match value.to_f64() {
        Approximation::Exact(v) => v,
        Approximation::Inexact(v, _) => v,
    }
}

/// An arbitrary-precision complex number.
#[derive(Clone, Debug, PartialEq)]
pub struct LargeComplex {
    /// Real component.
    pub re: FBig,
    /// Imaginary component.
    pub im: FBig,
}

impl LargeComplex {
    /// Build from two big floats.
    pub fn new(re: FBig, im: FBig) -> Self {
        LargeComplex { re, im }
    }

    /// Build from native floats at the given precision.
    pub fn from_f64(re: f64, im: f64, precision_bits: usize) -> Self {
        LargeComplex {
            re: big(re, precision_bits),
            im: big(im, precision_bits),
        }
    }

    /// Zero at the given precision.
    pub fn zero(precision_bits: usize) -> Self {
        LargeComplex::from_f64(0.0, 0.0, precision_bits)
    }

    /// `(re² - im², 2·re·im)`
    pub fn square(&self) -> Self {
        let re_sq = &self.re * &self.re;
        let im_sq = &self.im * &self.im;
        let cross = &self.re * &self.im;
        LargeComplex {
            re: &re_sq - &im_sq,
            im: &cross + &cross,
        }
    }

    /// Componentwise sum.
    pub fn add(&self, other: &LargeComplex) -> Self {
        LargeComplex {
            re: &self.re + &other.re,
            im: &self.im + &other.im,
        }
    }

    /// `sqrt(re² + im²)`.  The sum of squares stays in big floats; only
    /// the final result is rounded to `f64`.
    pub fn magnitude(&self) -> f64 {
        let norm_sqr = &(&self.re * &self.re) + &(&self.im * &self.im);
        rounded(&norm_sqr).sqrt()
    }

    /// Round both components to native floats.
    pub fn to_f64(&self) -> (f64, f64) {
        (rounded(&self.re), rounded(&self.im))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_of_a_pythagorean_triple() {
        let z = LargeComplex::from_f64(0.3, 0.4, HIGH_PRECISION_BITS);
        assert!((z.magnitude() - 0.5).abs() < 1e-15);
        let z = LargeComplex::from_f64(3.0, -4.0, HIGH_PRECISION_BITS);
        assert_eq!(z.magnitude(), 5.0);
    }

    #[test]
    fn square_of_one_minus_two_i() {
        let z = LargeComplex::from_f64(1.0, -2.0, HIGH_PRECISION_BITS).square();
        assert_eq!(z.to_f64(), (-3.0, -4.0));
    }

    #[test]
    fn sum_is_componentwise() {
        let z = LargeComplex::from_f64(0.5, 0.25, HIGH_PRECISION_BITS);
        let c = LargeComplex::from_f64(1.0, 2.0, HIGH_PRECISION_BITS);
        assert_eq!(z.add(&c).to_f64(), (1.5, 2.25));
    }

    #[test]
    fn operations_leave_operands_untouched() {
        let z = LargeComplex::from_f64(1.5, -0.5, HIGH_PRECISION_BITS);
        let before = z.clone();
        let _ = z.square();
        let _ = z.add(&before);
        assert_eq!(z, before);
    }

    #[test]
    fn keeps_digits_a_native_float_would_drop() {
        // 1 + 2^-80 is indistinguishable from 1 in an f64.
        let tiny = big(2f64.powi(-80), HIGH_PRECISION_BITS);
        let one = big(1.0, HIGH_PRECISION_BITS);
        let sum = &one + &tiny;
        assert_ne!(sum, one);
        assert_eq!(sum.to_f64().value(), 1.0);
    }
}
