// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate image;
#[macro_use]
extern crate log;
extern crate marzipan;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use image::ImageFormat;
use std::str::FromStr;

use marzipan::orbits::default_orbit;
use marzipan::parsing::{parse_complex, parse_orbit, parse_pair, parse_palette};
use marzipan::{render_image, Fractal, FractalError, FractalType, ImageParams, Orbit};

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTUPPER: &str = "leftupper";
const RIGHTLOWER: &str = "rightlower";
const TYPE: &str = "type";
const ITERATIONS: &str = "iterations";
const POWER: &str = "power";
const PALETTE: &str = "palette";
const PALETTE_SIZE: &str = "palette-size";
const ORBIT: &str = "orbit";
const THREADS: &str = "threads";
const SAMPLES: &str = "samples";

fn app(default_threads: &str) -> App {
    let max_threads = num_cpus::get();

    App::new("marzipan")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Escape-time and chaos-game fractal renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output PNG file"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("900x600")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTUPPER)
                .long(LEFTUPPER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2,1")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left upper corner"))
                .help("Left upper corner of the complex plane"),
        )
        .arg(
            Arg::with_name(RIGHTLOWER)
                .long(RIGHTLOWER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1,-1")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right lower corner"))
                .help("Right lower corner of the complex plane"),
        )
        .arg(
            Arg::with_name(TYPE)
                .long(TYPE)
                .short("f")
                .takes_value(true)
                .default_value("mandelbrot")
                .validator(|s| {
                    FractalType::from_str(&s)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .help("mandelbrot, julia, fern, sierp or flame"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1u32,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iteration budget per pixel"),
        )
        .arg(
            Arg::with_name(POWER)
                .long(POWER)
                .short("p")
                .takes_value(true)
                .default_value("2")
                .validator(|s| {
                    validate_range(
                        &s,
                        1.0f64 + std::f64::EPSILON,
                        1e6,
                        "Could not parse power",
                        "Power must be above 1",
                    )
                })
                .help("Exponent of the Mandelbrot recurrence"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .long(PALETTE)
                .short("c")
                .takes_value(true)
                .default_value("black,white,black,white")
                .help("Comma-separated color names; the first paints points that never escape"),
        )
        .arg(
            Arg::with_name(PALETTE_SIZE)
                .long(PALETTE_SIZE)
                .short("m")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1u32,
                        std::u32::MAX,
                        "Could not parse palette size",
                        "Palette size must be positive",
                    )
                })
                .help("Period of the palette"),
        )
        .arg(
            Arg::with_name(ORBIT)
                .long(ORBIT)
                .short("b")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .allow_hyphen_values(true)
                .help("Orbit trap: point(x,y,d), line(a,b,c,d) or raster(path[,d])"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value(default_threads)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of bands rendered in parallel"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .long(SAMPLES)
                .short("n")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1u64,
                        std::u64::MAX,
                        "Could not parse sample count",
                        "Sample count must be positive",
                    )
                })
                .help("Points drawn by the chaos games"),
        )
}

fn value<'m>(matches: &'m ArgMatches, name: &str) -> Result<&'m str, FractalError> {
    matches
        .value_of(name)
        .ok_or_else(|| FractalError::config(format!("missing --{}", name)))
}

fn parsed<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, FractalError> {
    let raw = value(matches, name)?;
    raw.parse()
        .map_err(|_| FractalError::config(format!("could not parse --{} {:?}", name, raw)))
}

fn orbit_or_default(spec: &str) -> Result<Orbit, FractalError> {
    parse_orbit(spec).or_else(|e| {
        warn!("{}; using the default orbit", e);
        default_orbit()
    })
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let output = value(matches, OUTPUT)?;
    let (width, height) = parse_pair::<u16>(value(matches, SIZE)?, 'x')
        .ok_or_else(|| FractalError::config("could not parse image size"))?;
    let leftupper = parse_complex(value(matches, LEFTUPPER)?)
        .ok_or_else(|| FractalError::config("could not parse left upper corner"))?;
    let rightlower = parse_complex(value(matches, RIGHTLOWER)?)
        .ok_or_else(|| FractalError::config("could not parse right lower corner"))?;

    let params = ImageParams {
        left: leftupper.re,
        top: leftupper.im,
        right: rightlower.re,
        bottom: rightlower.im,
        width: usize::from(width),
        height: usize::from(height),
        max_iter: parsed(matches, ITERATIONS)?,
        power: parsed(matches, POWER)?,
        palette: parse_palette(value(matches, PALETTE)?, parsed(matches, PALETTE_SIZE)?)?,
    };

    let orbits = match matches.values_of(ORBIT) {
        Some(specs) => specs.map(orbit_or_default).collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let mut fractal = Fractal::new(parsed(matches, TYPE)?).with_orbits(orbits);
    if matches.is_present(SAMPLES) {
        fractal = fractal.with_samples(parsed(matches, SAMPLES)?);
    }

    let image = render_image(&params, &fractal, parsed(matches, THREADS)?)?;
    image.save_with_format(output, ImageFormat::Png)?;
    info!("wrote {} to {}", fractal.kind(), output);
    Ok(())
}

fn main() {
    env_logger::init();
    let default_threads = num_cpus::get().to_string();
    let matches = app(&default_threads).get_matches();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
