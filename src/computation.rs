// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns a configuration into the per-pixel closure the rasterizer
//! drives.
//!
//! Everything the closure needs (parameters, palette, traps, chaos-game
//! maps) is built here, before any band worker starts, and moved into
//! the closure.  The workers only ever read it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::FractalError;
use crate::escape::{
    julia_orbit_value, julia_value, julia_value_high, mandelbrot_orbit_value, mandelbrot_value,
    mandelbrot_value_high, multibrot_value,
};
use crate::ifs::ChaosGame;
use crate::large_complex::HIGH_PRECISION_BITS;
use crate::orbits::Orbit;
use crate::palettes::{Color, Palette};
use crate::params::ImageParams;
use crate::planes::{Pixel, PlaneMapper, Precision};

/// Computes the raw value of the pixel at `(x, y)`, and whether it
/// escaped.
pub type ValueComputation = Box<dyn Fn(usize, usize) -> (f64, bool) + Send + Sync>;

/// Computes the final color of the pixel at `(x, y)`.
pub type Computation = Box<dyn Fn(usize, usize) -> Color + Send + Sync>;

/// The fractals we know how to draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FractalType {
    /// The Mandelbrot set, or a Multibrot set when the power is not 2.
    Mandelbrot,
    /// The Julia set of `-0.4 + 0.6i`.
    Julia,
    /// Barnsley's fern.
    Fern,
    /// The Sierpinski triangle.
    Sierpinski,
    /// A fractal flame.
    Flame,
}

impl FromStr for FractalType {
    type Err = FractalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mandelbrot" => Ok(FractalType::Mandelbrot),
            "julia" => Ok(FractalType::Julia),
            "fern" => Ok(FractalType::Fern),
            "sierp" | "sierpinski" => Ok(FractalType::Sierpinski),
            "flame" => Ok(FractalType::Flame),
            other => Err(FractalError::config(format!("unknown fractal type {:?}", other))),
        }
    }
}

impl fmt::Display for FractalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FractalType::Mandelbrot => "mandelbrot",
            FractalType::Julia => "julia",
            FractalType::Fern => "fern",
            FractalType::Sierpinski => "sierpinski",
            FractalType::Flame => "flame",
        };
        write!(f, "{}", name)
    }
}

/// A fractal type plus everything that tunes it beyond the image
/// parameters.
#[derive(Clone, Debug)]
pub struct Fractal {
    kind: FractalType,
    orbits: Vec<Orbit>,
    samples: Option<u64>,
}

impl Fractal {
    /// The plain version of `kind`.
    pub fn new(kind: FractalType) -> Self {
        Fractal {
            kind,
            orbits: Vec::new(),
            samples: None,
        }
    }

    /// Score escape-time fractals by their closest approach to these
    /// traps instead of by escape speed.
    pub fn with_orbits(mut self, orbits: Vec<Orbit>) -> Self {
        self.orbits = orbits;
        self
    }

    /// Override the sample count of the chaos games.
    pub fn with_samples(mut self, samples: u64) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Which fractal this is.
    pub fn kind(&self) -> FractalType {
        self.kind
    }

    fn chaos_game(&self, params: &ImageParams) -> ChaosGame {
        let game = ChaosGame::new(params.width, params.height);
        match self.samples {
            Some(samples) => game.with_samples(samples),
            None => game,
        }
    }

    /// Whether an arbitrary-precision evaluator exists for this request.
    fn has_high_precision(&self, params: &ImageParams) -> bool {
        self.orbits.is_empty()
            && match self.kind {
                FractalType::Mandelbrot => params.power == 2.0,
                FractalType::Julia => true,
                _ => false,
            }
    }

    /// Decide, once for the whole image, which arithmetic to use.
    pub fn precision(&self, params: &ImageParams) -> Precision {
        let wanted = PlaneMapper::new(params).precision(HIGH_PRECISION_BITS);
        match wanted {
            Precision::Arbitrary(bits) if self.has_high_precision(params) => {
                debug!("{} at this zoom needs {}-bit floats", self.kind, bits);
                wanted
            }
            Precision::Arbitrary(_) => {
                warn!(
                    "{} has no high-precision evaluator; rendering with native floats",
                    self.kind
                );
                Precision::Native
            }
            Precision::Native => Precision::Native,
        }
    }

    /// The raw-value closure of an escape-time or hit-count fractal.
    /// Flames color their pixels directly and have none.
    pub fn value_computer(&self, params: &ImageParams) -> Result<ValueComputation, FractalError> {
        params.validate()?;
        let mapper = PlaneMapper::new(params);
        let max_iter = params.max_iter;
        let precision = self.precision(params);

        let computer: ValueComputation = match (self.kind, precision) {
            (FractalType::Mandelbrot, Precision::Arbitrary(bits)) => Box::new(move |x, y| {
                mandelbrot_value_high(&mapper.pixel_to_large(&Pixel(x, y), bits), max_iter)
            }),
            (FractalType::Julia, Precision::Arbitrary(bits)) => Box::new(move |x, y| {
                julia_value_high(mapper.pixel_to_large(&Pixel(x, y), bits), max_iter)
            }),
            (FractalType::Mandelbrot, Precision::Native) if params.power != 2.0 => {
                if !self.orbits.is_empty() {
                    warn!("orbit traps are ignored for Multibrot sets");
                }
                let power = params.power;
                Box::new(move |x, y| {
                    multibrot_value(mapper.pixel_to_point(&Pixel(x, y)), power, max_iter)
                })
            }
            (FractalType::Mandelbrot, Precision::Native) if !self.orbits.is_empty() => {
                let orbits: Arc<[Orbit]> = self.orbits.clone().into();
                Box::new(move |x, y| {
                    mandelbrot_orbit_value(mapper.pixel_to_point(&Pixel(x, y)), max_iter, &orbits)
                })
            }
            (FractalType::Mandelbrot, Precision::Native) => Box::new(move |x, y| {
                mandelbrot_value(mapper.pixel_to_point(&Pixel(x, y)), max_iter)
            }),
            (FractalType::Julia, Precision::Native) if !self.orbits.is_empty() => {
                let orbits: Arc<[Orbit]> = self.orbits.clone().into();
                Box::new(move |x, y| {
                    julia_orbit_value(mapper.pixel_to_point(&Pixel(x, y)), max_iter, &orbits)
                })
            }
            (FractalType::Julia, Precision::Native) => Box::new(move |x, y| {
                julia_value(mapper.pixel_to_point(&Pixel(x, y)), max_iter)
            }),
            (FractalType::Fern, _) | (FractalType::Sierpinski, _) => {
                let game = self.chaos_game(params);
                let mut rng = rand::thread_rng();
                let hits = if self.kind == FractalType::Fern {
                    game.fern(&mut rng)
                } else {
                    game.sierpinski(&mut rng)
                };
                Box::new(move |x, y| match hits.get(&Pixel(x, y)) {
                    Some(count) => (count as f64, true),
                    None => (0.0, false),
                })
            }
            (FractalType::Flame, _) => {
                return Err(FractalError::config(
                    "flames are colored directly and have no raw values",
                ))
            }
        };
        Ok(computer)
    }

    /// The color closure the rasterizer drives.
    pub fn computer(&self, params: &ImageParams) -> Result<Computation, FractalError> {
        params.validate()?;
        if self.kind == FractalType::Flame {
            let flame = self.chaos_game(params).flame(&mut rand::thread_rng());
            let background = params.palette.divergence();
            return Ok(Box::new(move |x, y| {
                flame.get(&Pixel(x, y)).unwrap_or(background)
            }));
        }
        let value = self.value_computer(params)?;
        Ok(create_computer(value, params.palette.clone()))
    }
}

/// Color the raw values of `value` with `palette`.
pub fn create_computer(value: ValueComputation, palette: Palette) -> Computation {
    Box::new(move |x, y| {
        let (raw, converged) = value(x, y);
        palette.color(raw, converged)
    })
}

/// The color closure for the plain version of `kind`.
pub fn computer_from_params(
    params: &ImageParams,
    kind: FractalType,
) -> Result<Computation, FractalError> {
    Fractal::new(kind).computer(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::NOT_ESCAPED;
    use crate::orbits::PointOrbit;
    use crate::palettes::{BLACK, WHITE};

    fn small() -> ImageParams {
        ImageParams {
            width: 10,
            height: 10,
            max_iter: 50,
            ..ImageParams::default()
        }
    }

    #[test]
    fn fractal_types_parse_by_name() {
        assert_eq!("julia".parse::<FractalType>().unwrap(), FractalType::Julia);
        assert_eq!("sierp".parse::<FractalType>().unwrap(), FractalType::Sierpinski);
        assert!("buddhabrot".parse::<FractalType>().is_err());
        assert_eq!(FractalType::Flame.to_string(), "flame");
    }

    #[test]
    fn mandelbrot_corner_escapes_and_center_does_not() {
        let value = Fractal::new(FractalType::Mandelbrot).value_computer(&small()).unwrap();
        let (_, escaped) = value(0, 0);
        assert!(escaped);
        // Pixel (7, 5) sits on 0.1 + 0i.
        assert_eq!(value(7, 5), (NOT_ESCAPED, false));
    }

    #[test]
    fn power_selects_the_multibrot() {
        let params = ImageParams {
            power: 3.0,
            ..small()
        };
        let value = Fractal::new(FractalType::Mandelbrot).value_computer(&params).unwrap();
        let expected = multibrot_value(PlaneMapper::new(&params).pixel_to_point(&Pixel(1, 1)), 3.0, 50);
        assert_eq!(value(1, 1), expected);
    }

    #[test]
    fn orbits_select_the_trap_evaluator() {
        let orbit = Orbit::from(PointOrbit::new(0.0, 0.0, 100.0).unwrap());
        let value = Fractal::new(FractalType::Mandelbrot)
            .with_orbits(vec![orbit.clone()])
            .value_computer(&small())
            .unwrap();
        let c = PlaneMapper::new(&small()).pixel_to_point(&Pixel(0, 0));
        assert_eq!(value(0, 0), mandelbrot_orbit_value(c, 50, &[orbit]));
    }

    #[test]
    fn deep_zoom_uses_big_floats_where_available() {
        let left = -0.743_643_887_037_151;
        let deep = ImageParams {
            left,
            right: left + 1e-14,
            top: 0.131_825_904_205_33,
            bottom: 0.131_825_904_205_33 - 1e-14,
            width: 200,
            height: 4,
            ..ImageParams::default()
        };
        assert_eq!(
            Fractal::new(FractalType::Mandelbrot).precision(&deep),
            Precision::Arbitrary(HIGH_PRECISION_BITS)
        );
        assert_eq!(
            Fractal::new(FractalType::Julia).precision(&deep),
            Precision::Arbitrary(HIGH_PRECISION_BITS)
        );
        let multibrot = ImageParams {
            power: 3.0,
            ..deep.clone()
        };
        assert_eq!(
            Fractal::new(FractalType::Mandelbrot).precision(&multibrot),
            Precision::Native
        );
        assert_eq!(
            Fractal::new(FractalType::Mandelbrot).precision(&small()),
            Precision::Native
        );
    }

    #[test]
    fn chaos_games_report_hits_as_values() {
        let value = Fractal::new(FractalType::Sierpinski)
            .with_samples(20_000)
            .value_computer(&small())
            .unwrap();
        // Bottom left corner of the triangle is always visited.
        let (count, hit) = value(0, 9);
        assert!(hit);
        assert!(count >= 1.0);
        assert_eq!(value(9, 0), (0.0, false));
    }

    #[test]
    fn flame_has_no_value_computer_but_colors_pixels() {
        let flame = Fractal::new(FractalType::Flame).with_samples(5_000);
        assert!(flame.value_computer(&small()).is_err());
        let params = ImageParams {
            palette: Palette::new(WHITE, vec![BLACK], 10).unwrap(),
            ..small()
        };
        let computer = flame.computer(&params).unwrap();
        let _ = computer(5, 5);
    }

    #[test]
    fn invalid_parameters_are_rejected_up_front() {
        let params = ImageParams {
            height: 0,
            ..small()
        };
        assert!(computer_from_params(&params, FractalType::Mandelbrot).is_err());
        assert!(Fractal::new(FractalType::Fern).value_computer(&params).is_err());
    }

    #[test]
    fn computers_apply_the_palette() {
        let params = ImageParams {
            palette: Palette::new(BLACK, vec![WHITE], 10).unwrap(),
            ..small()
        };
        let computer = computer_from_params(&params, FractalType::Mandelbrot).unwrap();
        assert_eq!(computer(0, 0), WHITE);
        assert_eq!(computer(7, 5), BLACK);
    }
}
