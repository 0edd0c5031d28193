// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Chaos-game renderers for iterated function systems: the Barnsley
//! fern, the Sierpinski triangle and a small fractal flame.
//!
//! A chaos game walks a single point through randomly chosen maps and
//! plots where it lands.  Every step depends on the one before it, so
//! the walk is strictly sequential.  It runs once, into a builder that
//! owns the accumulation map; `build()` hands back an immutable map
//! that the band workers can then read concurrently.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use std::collections::HashMap;

use crate::palettes::Color;
use crate::planes::Pixel;

/// Samples drawn for a fern.
pub const FERN_SAMPLES: u64 = 100_000_000;
/// Samples drawn for a Sierpinski triangle.
pub const SIERPINSKI_SAMPLES: u64 = 50_000_000;
/// Samples drawn for a flame.
pub const FLAME_SAMPLES: u64 = 500_000_000;

/// The flame does not plot its first few points, which are still on
/// their way to the attractor.
const FLAME_WARMUP: u64 = 20;

/// `(x, y) → (a·x + b·y + e, c·x + d·y + f)`
#[derive(Copy, Clone, Debug, PartialEq)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Affine { a, b, c, d, e, f }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.e,
            self.c * x + self.d * y + self.f,
        )
    }
}

/// Pick the map whose cumulative probability first exceeds `roll`.
fn pick<T>(table: &[(f64, T)], roll: f64) -> &T {
    let last = &table[table.len() - 1].1;
    table
        .iter()
        .find(|(threshold, _)| roll < *threshold)
        .map(|(_, item)| item)
        .unwrap_or(last)
}

/// Stem, main frond, and the two side fronds, with cumulative
/// probabilities.
const FERN: [(f64, Affine); 4] = [
    (0.05, Affine::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0)),
    (0.86, Affine::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.6)),
    (0.93, Affine::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44)),
    (1.0, Affine::new(0.20, -0.26, 0.23, 0.22, 0.0, 1.6)),
];

/// The three halvings towards the corners of the unit triangle.
const SIERPINSKI: [Affine; 3] = [
    Affine::new(0.5, 0.0, 0.0, 0.5, 0.0, 0.0),
    Affine::new(0.5, 0.0, 0.0, 0.5, 0.5, 0.0),
    Affine::new(0.5, 0.0, 0.0, 0.5, 0.0, 0.5),
];

/// Affine part of each flame map, with cumulative probabilities.
const FLAME: [(f64, Affine); 5] = [
    (0.08, Affine::new(-0.98, -0.12, -0.6, 0.01, -0.028, 0.07)),
    (0.8, Affine::new(-0.5, 0.43, -0.06, -0.44, -0.09, -0.88)),
    (0.85, Affine::new(0.18, -0.12, -0.18, 0.04, 0.18, 0.40)),
    (0.87, Affine::new(1.62, 1.03, 0.59, -0.66, 0.25, -0.72)),
    (1.0, Affine::new(0.02, 0.13, -1.17, -1.44, -0.17, -0.14)),
];

/// Color each flame map pulls the running color towards.
const FLAME_COLORS: [[f64; 3]; 5] = [
    [1.0, 0.0, 0.0],
    [1.0, 0.1, 0.0],
    [1.0, 0.2, 0.0],
    [1.0, 0.3, 0.0],
    [1.0, 0.4, 0.0],
];

/// The nonlinear warp applied after the affine part of flame map
/// `index`.
fn variation(index: usize, x: f64, y: f64) -> (f64, f64) {
    let r = (x * x + y * y).sqrt();
    match index {
        // swirl-ish: (x² - y², 2xy) / r
        0 => ((x - y) * (x + y) / r, 2.0 * x * y / r),
        // sinusoidal in x only
        1 => (x.sin(), y),
        2 => {
            let theta = (x / y).atan();
            ((theta.cos() + r.sin()) / r, (theta.sin() - r.cos()) / r)
        }
        // fisheye-like folding of the left and bottom half planes
        3 => (
            if x < 0.0 { 2.0 * x } else { x },
            if y < 0.0 { y / 2.0 } else { y },
        ),
        _ => {
            let theta = (x / y).atan();
            (theta.sin() * r.cos(), theta.cos() * r.sin())
        }
    }
}

/// Map a plotted coordinate to a pixel, if it lands inside the image.
fn to_pixel(x: f64, y: f64, width: usize, height: usize) -> Option<Pixel> {
    // NaN fails every comparison and is dropped here too.
    if x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64 {
        Some(Pixel(x as usize, y as usize))
    } else {
        None
    }
}

/// The fern lives in `[-2.1820, 2.6558] × [0, 9.9983]`; stretch that
/// over the image, growing upwards.
fn scale_fern(x: f64, y: f64, width: usize, height: usize) -> Option<Pixel> {
    to_pixel(
        (x + 2.1820) * width as f64 / (2.1820 + 2.6558),
        (9.9983 - y) * height as f64 / 9.9983,
        width,
        height,
    )
}

/// The triangle fills the unit square, right angle at the bottom left.
fn scale_sierpinski(x: f64, y: f64, width: usize, height: usize) -> Option<Pixel> {
    to_pixel(x * width as f64, (1.0 - y) * height as f64, width, height)
}

/// The flame is framed on `[-1, 1] × [-1, 1]`.
fn scale_flame(x: f64, y: f64, width: usize, height: usize) -> Option<Pixel> {
    to_pixel(
        (x + 1.0) / 2.0 * width as f64,
        (y + 1.0) / 2.0 * height as f64,
        width,
        height,
    )
}

/// How often each pixel was visited.
#[derive(Clone, Debug, Default)]
pub struct HitMap {
    hits: HashMap<Pixel, u64>,
    max: u64,
}

impl HitMap {
    /// Visits of `pixel`, if it was visited at all.
    pub fn get(&self, pixel: &Pixel) -> Option<u64> {
        self.hits.get(pixel).cloned()
    }

    /// The busiest pixel's count.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Number of distinct pixels visited.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether no pixel was visited.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Owns a `HitMap` while the chaos game fills it.
#[derive(Debug, Default)]
pub struct HitMapBuilder {
    map: HitMap,
}

impl HitMapBuilder {
    /// An empty map.
    pub fn new() -> Self {
        HitMapBuilder::default()
    }

    /// Count one visit of `pixel`.
    pub fn record(&mut self, pixel: Pixel) {
        let count = self.map.hits.entry(pixel).or_insert(0);
        *count += 1;
        if *count > self.map.max {
            self.map.max = *count;
        }
    }

    /// Freeze the counts.
    pub fn build(self) -> HitMap {
        self.map
    }
}

/// Final colors of the pixels a flame visited.
#[derive(Clone, Debug, Default)]
pub struct FlameMap {
    colors: HashMap<Pixel, Color>,
}

impl FlameMap {
    /// Color of `pixel`, if the flame visited it.
    pub fn get(&self, pixel: &Pixel) -> Option<Color> {
        self.colors.get(pixel).cloned()
    }

    /// Number of distinct pixels visited.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no pixel was visited.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Owns the color and histogram accumulators while a flame runs.
#[derive(Debug, Default)]
pub struct FlameMapBuilder {
    colors: HashMap<Pixel, [f64; 3]>,
    histogram: HitMapBuilder,
}

impl FlameMapBuilder {
    /// Empty accumulators.
    pub fn new() -> Self {
        FlameMapBuilder::default()
    }

    /// The walk passed through `pixel` carrying `color`; the last color
    /// to pass wins.
    pub fn record(&mut self, pixel: Pixel, color: [f64; 3]) {
        self.colors.insert(pixel, color);
        self.histogram.record(pixel);
    }

    /// Tone-map the accumulated colors.
    ///
    /// Pixel brightness is `ln(count + 1) / ln(max + 1)`: one for the
    /// busiest pixel, falling off logarithmically with the visit count.
    /// Each channel of the carried color is scaled by it.
    pub fn build(self) -> FlameMap {
        let histogram = self.histogram.build();
        let scale = ((histogram.max() + 1) as f64).ln();
        let colors = self
            .colors
            .into_iter()
            .map(|(pixel, color)| {
                let count = histogram.get(&pixel).unwrap_or(0);
                let brightness = if scale > 0.0 {
                    ((count + 1) as f64).ln() / scale
                } else {
                    0.0
                };
                let channel = |v: f64| (v * brightness * f64::from(u16::MAX)).round() as u16;
                (
                    pixel,
                    image::Rgba([channel(color[0]), channel(color[1]), channel(color[2]), u16::MAX]),
                )
            })
            .collect();
        FlameMap { colors }
    }
}

/// Runs the chaos games for an image of a given size.
#[derive(Copy, Clone, Debug)]
pub struct ChaosGame {
    width: usize,
    height: usize,
    samples: Option<u64>,
}

impl ChaosGame {
    /// Games for a `width` by `height` image, each drawing its default
    /// number of samples.
    pub fn new(width: usize, height: usize) -> Self {
        ChaosGame {
            width,
            height,
            samples: None,
        }
    }

    /// Draw exactly `samples` points, whatever the game.
    pub fn with_samples(mut self, samples: u64) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Barnsley's fern.
    pub fn fern<R: Rng>(&self, rng: &mut R) -> HitMap {
        let samples = self.samples.unwrap_or(FERN_SAMPLES);
        let roll = Uniform::new(0.0_f64, 1.0);
        let mut builder = HitMapBuilder::new();
        let (mut x, mut y) = (0.0_f64, 0.0_f64);
        if let Some(pixel) = scale_fern(x, y, self.width, self.height) {
            builder.record(pixel);
        }
        for _ in 0..samples {
            let (nx, ny) = pick(&FERN, roll.sample(rng)).apply(x, y);
            if let Some(pixel) = scale_fern(nx, ny, self.width, self.height) {
                builder.record(pixel);
            }
            x = nx;
            y = ny;
        }
        let map = builder.build();
        debug!(
            "fern: {} samples over {} pixels, busiest pixel hit {} times",
            samples,
            map.len(),
            map.max()
        );
        map
    }

    /// The Sierpinski triangle.
    pub fn sierpinski<R: Rng>(&self, rng: &mut R) -> HitMap {
        let samples = self.samples.unwrap_or(SIERPINSKI_SAMPLES);
        let rule = Uniform::new(0, SIERPINSKI.len());
        let mut builder = HitMapBuilder::new();
        let (mut x, mut y) = (0.0_f64, 0.0_f64);
        for _ in 0..samples {
            let (nx, ny) = SIERPINSKI[rule.sample(rng)].apply(x, y);
            if let Some(pixel) = scale_sierpinski(nx, ny, self.width, self.height) {
                builder.record(pixel);
            }
            x = nx;
            y = ny;
        }
        let map = builder.build();
        debug!(
            "sierpinski: {} samples over {} pixels, busiest pixel hit {} times",
            samples,
            map.len(),
            map.max()
        );
        map
    }

    /// A five-map fractal flame.  The running color drifts halfway
    /// towards the color of each map applied.
    pub fn flame<R: Rng>(&self, rng: &mut R) -> FlameMap {
        let samples = self.samples.unwrap_or(FLAME_SAMPLES);
        let roll = Uniform::new(0.0_f64, 1.0);
        let restart = Uniform::new_inclusive(-1.0_f64, 1.0);
        let maps: Vec<(f64, usize)> = FLAME
            .iter()
            .enumerate()
            .map(|(index, (threshold, _))| (*threshold, index))
            .collect();

        let mut builder = FlameMapBuilder::new();
        let (mut x, mut y) = (0.0_f64, 0.0_f64);
        let mut color = [1.0, 0.0, 0.0];
        let mut restarts = 0u64;

        for i in 0..samples {
            let index = *pick(&maps, roll.sample(rng));
            let (ax, ay) = FLAME[index].1.apply(x, y);
            let (nx, ny) = variation(index, ax, ay);
            if !nx.is_finite() || !ny.is_finite() {
                // The warps divide by the radius; a walk that hits the
                // origin starts over somewhere in the frame.
                x = restart.sample(rng);
                y = restart.sample(rng);
                restarts += 1;
                continue;
            }
            for (channel, target) in color.iter_mut().zip(&FLAME_COLORS[index]) {
                *channel = (*channel + target) / 2.0;
            }
            if i > FLAME_WARMUP {
                if let Some(pixel) = scale_flame(nx, ny, self.width, self.height) {
                    builder.record(pixel, color);
                }
            }
            x = nx;
            y = ny;
        }
        let map = builder.build();
        debug!(
            "flame: {} samples over {} pixels, {} restarts",
            samples,
            map.len(),
            restarts
        );
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pick_walks_cumulative_thresholds() {
        let table = [(0.25, 'a'), (0.5, 'b'), (1.0, 'c')];
        assert_eq!(*pick(&table, 0.0), 'a');
        assert_eq!(*pick(&table, 0.3), 'b');
        assert_eq!(*pick(&table, 0.99), 'c');
        assert_eq!(*pick(&table, 1.0), 'c');
    }

    #[test]
    fn fern_grows_upwards_from_the_bottom_of_the_frame() {
        assert_eq!(scale_fern(0.0, 1.0, 100, 100), Some(Pixel(45, 89)));
        // The origin itself sits on the bottom edge, just outside.
        assert_eq!(scale_fern(0.0, 0.0, 100, 100), None);
        assert_eq!(scale_fern(0.0, 10.5, 100, 100), None);
    }

    #[test]
    fn fern_stays_inside_its_frame() {
        let mut rng = StdRng::seed_from_u64(42);
        let map = ChaosGame::new(60, 80).with_samples(50_000).fern(&mut rng);
        assert!(!map.is_empty());
        assert!(map.max() > 1);
        // The stem at the bottom center sees traffic, the corners never.
        assert!(map.get(&Pixel(0, 0)).is_none());
        assert!(map.get(&Pixel(59, 79)).is_none());
    }

    #[test]
    fn sierpinski_leaves_the_middle_triangle_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        let map = ChaosGame::new(64, 64).with_samples(200_000).sierpinski(&mut rng);
        assert!(map.len() > 100);
        // The point (0.375, 0.375) lies inside the first removed triangle.
        assert!(map.get(&Pixel(24, 40)).is_none());
        // The hypotenuse side above the triangle is never visited.
        assert!(map.get(&Pixel(60, 4)).is_none());
    }

    #[test]
    fn hit_map_counts_visits() {
        let mut builder = HitMapBuilder::new();
        builder.record(Pixel(1, 1));
        builder.record(Pixel(1, 1));
        builder.record(Pixel(2, 3));
        let map = builder.build();
        assert_eq!(map.get(&Pixel(1, 1)), Some(2));
        assert_eq!(map.get(&Pixel(2, 3)), Some(1));
        assert_eq!(map.get(&Pixel(0, 0)), None);
        assert_eq!(map.max(), 2);
    }

    #[test]
    fn flame_tone_mapping_is_logarithmic() {
        let mut builder = FlameMapBuilder::new();
        for _ in 0..99 {
            builder.record(Pixel(0, 0), [1.0, 1.0, 1.0]);
        }
        builder.record(Pixel(1, 0), [1.0, 0.5, 0.0]);
        let map = builder.build();

        assert_eq!(map.get(&Pixel(0, 0)), Some(image::Rgba([u16::MAX; 4])));
        let dim = map.get(&Pixel(1, 0)).unwrap();
        let brightness = 2f64.ln() / 100f64.ln();
        assert_eq!(dim.0[0], (brightness * 65535.0).round() as u16);
        assert_eq!(dim.0[1], (0.5 * brightness * 65535.0).round() as u16);
        assert_eq!(dim.0[2], 0);
        assert_eq!(dim.0[3], u16::MAX);
    }

    #[test]
    fn flame_survives_the_singular_warps() {
        let mut rng = StdRng::seed_from_u64(3);
        let map = ChaosGame::new(50, 50).with_samples(20_000).flame(&mut rng);
        assert!(!map.is_empty());
        for y in 0..50 {
            for x in 0..50 {
                if let Some(color) = map.get(&Pixel(x, y)) {
                    // Red is pulled towards 1 by every map.
                    assert!(color.0[0] >= color.0[1]);
                    assert_eq!(color.0[2], 0);
                }
            }
        }
    }
}
