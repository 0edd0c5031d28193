// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time evaluators.
//!
//! Every evaluator returns `(value, escaped)`.  An escaping point gets
//! a smoothed, fractional iteration count; a point that survives the
//! whole iteration budget gets `NOT_ESCAPED` and `false`.

use num::Complex;

use crate::large_complex::LargeComplex;
use crate::orbits::Orbit;

/// Beyond this modulus a point is considered gone.  A large radius
/// makes the smoothed count nearly continuous.
pub const ESCAPE_RADIUS: f64 = 1000.0;

/// Orbit-trapped loops stop as soon as the orbit leaves this radius.
pub const TRAP_RADIUS: f64 = 4.0;

/// Returned for points that never escaped.  No iteration budget that
/// fits in a `u32` gets anywhere near it.
pub const NOT_ESCAPED: f64 = i64::MAX as f64;

/// The constant of the Julia set we draw.
pub const JULIA_C: Complex<f64> = Complex::new(-0.4, 0.6);

#[inline]
fn smoothed(iteration: u32, modulus: f64) -> f64 {
    f64::from(iteration) + 1.0 - modulus.log2().log2()
}

fn escape_time(mut z: Complex<f64>, c: Complex<f64>, max_iter: u32) -> (f64, bool) {
    for i in 0..max_iter {
        z = z * z + c;
        let modulus = z.norm();
        if modulus > ESCAPE_RADIUS {
            return (smoothed(i, modulus), true);
        }
    }
    (NOT_ESCAPED, false)
}

/// Smoothed escape time of `c` under `z ← z² + c` from `z = 0`.
pub fn mandelbrot_value(c: Complex<f64>, max_iter: u32) -> (f64, bool) {
    escape_time(Complex::new(0.0, 0.0), c, max_iter)
}

/// Smoothed escape time of `z` under `z ← z² + JULIA_C`.
pub fn julia_value(z: Complex<f64>, max_iter: u32) -> (f64, bool) {
    escape_time(z, JULIA_C, max_iter)
}

/// Smoothed escape time of `c` under `z ← z^power + c`.
///
/// The smoothing term generalizes the quadratic one: with the bailout
/// `B = 2^(1/(p-1))` it is `log2(ln|z| / ln B) / log2(p)`, which is
/// `log2(log2|z|)` again when `p = 2`.
pub fn multibrot_value(c: Complex<f64>, power: f64, max_iter: u32) -> (f64, bool) {
    let bailout = 2f64.powf(1.0 / (power - 1.0));
    let mut z = Complex::new(0.0, 0.0);
    for i in 0..max_iter {
        z = z.powf(power) + c;
        let modulus = z.norm();
        if modulus > ESCAPE_RADIUS {
            let correction = (modulus.ln() / bailout.ln()).log2() / power.log2();
            return (f64::from(i) + 1.0 - correction, true);
        }
    }
    (NOT_ESCAPED, false)
}

fn escape_time_high(mut z: LargeComplex, c: &LargeComplex, max_iter: u32) -> (f64, bool) {
    for i in 0..max_iter {
        z = z.square().add(c);
        let modulus = z.magnitude();
        if modulus > ESCAPE_RADIUS {
            return (smoothed(i, modulus), true);
        }
    }
    (NOT_ESCAPED, false)
}

/// `mandelbrot_value` in big floats.  The precision of `c` is the
/// precision of the whole computation.
pub fn mandelbrot_value_high(c: &LargeComplex, max_iter: u32) -> (f64, bool) {
    let precision = c.re.precision().max(c.im.precision());
    escape_time_high(LargeComplex::zero(precision), c, max_iter)
}

/// `julia_value` in big floats, at the precision of `z`.
pub fn julia_value_high(z: LargeComplex, max_iter: u32) -> (f64, bool) {
    let precision = z.re.precision().max(z.im.precision());
    let c = LargeComplex::from_f64(JULIA_C.re, JULIA_C.im, precision);
    escape_time_high(z, &c, max_iter)
}

fn orbit_trap(mut z: Complex<f64>, c: Complex<f64>, max_iter: u32, orbits: &[Orbit]) -> (f64, bool) {
    let mut closest = vec![std::f64::INFINITY; orbits.len()];
    let mut i = 0;
    while i < max_iter && z.norm() < TRAP_RADIUS {
        z = z * z + c;
        for (best, orbit) in closest.iter_mut().zip(orbits) {
            *best = best.min(orbit.fast_value(z));
        }
        i += 1;
    }
    if i == max_iter {
        return (std::f64::INFINITY, false);
    }

    let distance = closest
        .iter()
        .zip(orbits)
        .map(|(fast, orbit)| orbit.normalized_value(*fast))
        .fold(std::f64::INFINITY, f64::min);
    // A seed already past the trap radius, or an empty trap list,
    // escaped without scoring: it is as far as a point can be.
    if distance.is_infinite() {
        return (std::f64::MAX, true);
    }
    (distance, true)
}

/// Closest approach of the Mandelbrot orbit of `c` to any of `orbits`.
pub fn mandelbrot_orbit_value(c: Complex<f64>, max_iter: u32, orbits: &[Orbit]) -> (f64, bool) {
    orbit_trap(Complex::new(0.0, 0.0), c, max_iter, orbits)
}

/// Closest approach of the Julia orbit of `z` to any of `orbits`.
pub fn julia_orbit_value(z: Complex<f64>, max_iter: u32, orbits: &[Orbit]) -> (f64, bool) {
    orbit_trap(z, JULIA_C, max_iter, orbits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::large_complex::HIGH_PRECISION_BITS;
    use crate::orbits::{LineOrbit, PointOrbit};

    #[test]
    fn origin_never_escapes() {
        for max_iter in &[1, 2, 10, 100, 1000, 5000] {
            let (value, escaped) = mandelbrot_value(Complex::new(0.0, 0.0), *max_iter);
            assert!(!escaped);
            assert_eq!(value, NOT_ESCAPED);
        }
    }

    #[test]
    fn sentinel_exceeds_any_iteration_budget() {
        assert!(NOT_ESCAPED > f64::from(u32::MAX));
    }

    #[test]
    fn far_points_escape_on_the_first_iteration() {
        let (value, escaped) = mandelbrot_value(Complex::new(2000.0, 0.0), 50);
        assert!(escaped);
        assert!(value.is_finite());
        assert!((value - (1.0 - 2000f64.log2().log2())).abs() < 1e-12);
    }

    #[test]
    fn slower_escapes_score_higher() {
        let fast = mandelbrot_value(Complex::new(1.0, 1.0), 100);
        let slow = mandelbrot_value(Complex::new(0.26, 0.0), 100);
        assert!(fast.1 && slow.1);
        assert!(slow.0 > fast.0);
    }

    #[test]
    fn big_float_evaluators_agree_with_native_ones() {
        let native = mandelbrot_value(Complex::new(0.5, 0.5), 100);
        let high = mandelbrot_value_high(
            &LargeComplex::from_f64(0.5, 0.5, HIGH_PRECISION_BITS),
            100,
        );
        assert_eq!(native.1, high.1);
        assert!((native.0 - high.0).abs() < 1e-6);

        let native = julia_value(Complex::new(1.0, 0.5), 200);
        let high = julia_value_high(LargeComplex::from_f64(1.0, 0.5, HIGH_PRECISION_BITS), 200);
        assert_eq!(native.1, high.1);
        assert!((native.0 - high.0).abs() < 1e-6);

        let inside = mandelbrot_value_high(&LargeComplex::zero(HIGH_PRECISION_BITS), 50);
        assert_eq!(inside, (NOT_ESCAPED, false));
    }

    #[test]
    fn julia_points_escape_from_their_own_seed() {
        let (value, escaped) = julia_value(Complex::new(1.5, 1.5), 500);
        assert!(escaped);
        // 1.5 + 1.5i is already past |z| = 2, so it is gone within a few steps.
        assert!(value < 5.0);
    }

    #[test]
    fn multibrot_with_power_two_matches_mandelbrot() {
        for c in &[Complex::new(0.5, 0.5), Complex::new(-1.9, 0.3), Complex::new(1.0, 1.0)] {
            let quadratic = mandelbrot_value(*c, 200);
            let general = multibrot_value(*c, 2.0, 200);
            assert_eq!(quadratic.1, general.1);
            assert!((quadratic.0 - general.0).abs() < 1e-6);
        }
        assert!(!multibrot_value(Complex::new(0.0, 0.0), 3.0, 100).1);
    }

    #[test]
    fn orbit_traps_score_distance_not_speed() {
        let orbits = vec![Orbit::from(PointOrbit::new(0.0, 0.0, 100.0).unwrap())];
        // c = 1 runs 1, 2, 5, ... and leaves the radius-4 disc at 5.
        let (distance, escaped) = mandelbrot_orbit_value(Complex::new(1.0, 0.0), 50, &orbits);
        assert!(escaped);
        let expected = orbits[0].normalized_value(1.0);
        assert!((distance - expected).abs() < 1e-12);

        let (value, escaped) = mandelbrot_orbit_value(Complex::new(0.0, 0.0), 50, &orbits);
        assert!(!escaped);
        assert!(value.is_infinite());
    }

    #[test]
    fn several_traps_take_the_closest() {
        let point = Orbit::from(PointOrbit::new(3.0, 3.0, 100.0).unwrap());
        let line = Orbit::from(LineOrbit::new(0.0, 1.0, 0.0, 100.0).unwrap());
        let c = Complex::new(1.0, 0.0);
        let (alone, _) = mandelbrot_orbit_value(c, 50, &[point.clone()]);
        let (both, escaped) = mandelbrot_orbit_value(c, 50, &[point, line]);
        assert!(escaped);
        // The orbit of 1 stays on the real axis.
        assert!(both.abs() < 1e-12);
        assert!(alone > both);
    }

    #[test]
    fn julia_seeds_outside_the_trap_radius_escape_at_the_far_end() {
        let orbits = vec![Orbit::from(PointOrbit::new(0.0, 0.0, 100.0).unwrap())];
        assert_eq!(
            julia_orbit_value(Complex::new(5.0, 0.0), 50, &orbits),
            (std::f64::MAX, true)
        );
        assert_eq!(
            julia_orbit_value(Complex::new(0.0, -4.5), 50, &[default_trap()]),
            (std::f64::MAX, true)
        );
    }

    #[test]
    fn without_traps_escaping_points_still_escape() {
        assert_eq!(
            mandelbrot_orbit_value(Complex::new(1.0, 0.0), 50, &[]),
            (std::f64::MAX, true)
        );
        let (value, escaped) = mandelbrot_orbit_value(Complex::new(0.0, 0.0), 50, &[]);
        assert!(!escaped);
        assert!(value.is_infinite());
    }

    fn default_trap() -> Orbit {
        crate::orbits::default_orbit().unwrap()
    }
}
