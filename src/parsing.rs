// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Textual configuration: image sizes, corners, palettes and orbit
//! traps as they are typed on a command line.

use num::Complex;
use std::str::FromStr;

use crate::errors::FractalError;
use crate::orbits::{ImageOrbit, LineOrbit, Orbit, PointOrbit};
use crate::palettes::{color_by_name, Palette, BLACK};

/// Range of a raster trap when none is given.
const DEFAULT_RASTER_RANGE: f64 = 100.0;

/// Given a string and a separator, returns the two values
/// separated by the separator.
pub fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A comma-separated pair of floats as a complex number.
pub fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex { re, im })
}

/// `"black,white,black"`: the first color paints points that never
/// escape, the rest are the cycle.  Names we do not know are black.
pub fn parse_palette(s: &str, max_value: u32) -> Result<Palette, FractalError> {
    let mut colors = s
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            color_by_name(name).unwrap_or_else(|| {
                warn!("unknown color {:?}, using black", name);
                BLACK
            })
        });
    let divergence = colors
        .next()
        .ok_or_else(|| FractalError::config(format!("palette {:?} names no colors", s)))?;
    Palette::new(divergence, colors.collect(), max_value)
}

fn numbers(args: &[&str], s: &str) -> Result<Vec<f64>, FractalError> {
    args.iter()
        .map(|arg| {
            f64::from_str(arg)
                .map_err(|_| FractalError::config(format!("{:?} is not a number in {:?}", arg, s)))
        })
        .collect()
}

/// One of `point(x,y,d)`, `line(a,b,c,d)` or `raster(path[,d])`, where
/// `d` is the distance range the trap normalizes onto.
pub fn parse_orbit(s: &str) -> Result<Orbit, FractalError> {
    let malformed = || FractalError::config(format!("cannot read orbit {:?}", s));
    let s = s.trim();
    let open = s.find('(').ok_or_else(malformed)?;
    if !s.ends_with(')') {
        return Err(malformed());
    }
    let kind = &s[..open];
    let args: Vec<&str> = s[open + 1..s.len() - 1].split(',').map(str::trim).collect();

    match (kind, args.len()) {
        ("point", 3) => {
            let n = numbers(&args, s)?;
            PointOrbit::new(n[0], n[1], n[2]).map(Orbit::from)
        }
        ("line", 4) => {
            let n = numbers(&args, s)?;
            LineOrbit::new(n[0], n[1], n[2], n[3]).map(Orbit::from)
        }
        ("raster", 1) => ImageOrbit::open(args[0], DEFAULT_RASTER_RANGE).map(Orbit::from),
        ("raster", 2) => {
            let range = numbers(&args[1..], s)?[0];
            ImageOrbit::open(args[0], range).map(Orbit::from)
        }
        _ => Err(malformed()),
    }
}
