// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Binary masks and their Euclidean distance transform.
//!
//! The transform is the separable lower-envelope-of-parabolas method:
//! every row is transformed on its own, the grid is transposed, the
//! former columns are transformed the same way, and the grid is
//! transposed back.  Each 1-D pass is linear in the row length, so the
//! whole transform costs O(W·H) once, after which every distance is a
//! lookup.

use image::DynamicImage;
use std::path::Path;

use crate::errors::FractalError;

/// A grid of pixels that are either marked or not.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    marked: Vec<bool>,
}

impl Mask {
    /// Row-major `marked` flags for a `width` by `height` grid.
    pub fn new(width: usize, height: usize, marked: Vec<bool>) -> Result<Self, FractalError> {
        if marked.len() != width * height {
            return Err(FractalError::config(format!(
                "a {}x{} mask needs {} cells, got {}",
                width,
                height,
                width * height,
                marked.len()
            )));
        }
        Ok(Mask {
            width,
            height,
            marked,
        })
    }

    /// Build a mask by asking `is_marked(x, y)` for every cell.
    pub fn from_fn<F>(width: usize, height: usize, is_marked: F) -> Self
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut marked = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                marked.push(is_marked(x, y));
            }
        }
        Mask {
            width,
            height,
            marked,
        }
    }

    /// Pure black pixels are marked, everything else is not.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Mask::from_fn(width as usize, height as usize, |x, y| {
            rgb.get_pixel(x as u32, y as u32).0 == [0, 0, 0]
        })
    }

    /// Decode the image at `path` and classify its pixels.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FractalError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| FractalError::Mask {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Mask::from_image(&image))
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the cell at `(x, y)` is marked.
    pub fn is_marked(&self, x: usize, y: usize) -> bool {
        self.marked[y * self.width + x]
    }
}

/// Distances to the nearest marked cell over the mask grid padded by
/// `pad` cells on each side.  Anything farther than `cap` reads as
/// `cap`, and so does anything outside the padded grid.
#[derive(Clone, Debug)]
pub struct DistanceField {
    pad: usize,
    width: usize,
    height: usize,
    cap: f64,
    distances: Vec<f64>,
}

impl DistanceField {
    /// Distance at mask coordinate `(x, y)`.  Coordinates may be
    /// negative or past the mask edge.
    pub fn get(&self, x: i64, y: i64) -> f64 {
        let px = x + self.pad as i64;
        let py = y + self.pad as i64;
        if px < 0 || py < 0 || px >= self.width as i64 || py >= self.height as i64 {
            return self.cap;
        }
        self.distances[py as usize * self.width + px as usize]
    }

    /// The largest distance this field ever reports.
    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// Padding on each side of the mask.
    pub fn pad(&self) -> usize {
        self.pad
    }
}

/// Largest padded grid, in cells, a distance field may span.
pub const MAX_FIELD_CELLS: usize = 1 << 25;

/// Padding and padded dimensions for `mask` at `max_value`, if the
/// grid fits in `MAX_FIELD_CELLS`.
fn padded_grid(mask: &Mask, max_value: f64) -> Option<(usize, usize, usize)> {
    if !max_value.is_finite() || max_value < 0.0 || max_value.ceil() > MAX_FIELD_CELLS as f64 {
        return None;
    }
    let pad = max_value.ceil() as usize;
    let width = pad.checked_mul(2)?.checked_add(mask.width)?;
    let height = pad.checked_mul(2)?.checked_add(mask.height)?;
    match width.checked_mul(height) {
        Some(cells) if cells <= MAX_FIELD_CELLS => Some((pad, width, height)),
        _ => None,
    }
}

/// Compute the distance field of `mask`, padded and capped at
/// `max_value`.
pub fn distance_transform(mask: &Mask, max_value: f64) -> Result<DistanceField, FractalError> {
    let (pad, width, height) = padded_grid(mask, max_value).ok_or_else(|| {
        FractalError::config(format!(
            "a {}x{} mask padded by {} exceeds {} distance cells",
            mask.width, mask.height, max_value, MAX_FIELD_CELLS
        ))
    })?;
    let cap_sq = max_value * max_value;

    let mut grid = vec![std::f64::INFINITY; width * height];
    for y in 0..mask.height {
        for x in 0..mask.width {
            if mask.is_marked(x, y) {
                grid[(y + pad) * width + x + pad] = 0.0;
            }
        }
    }

    // Clamping between the passes keeps every value finite for the
    // column pass without changing the capped result.
    transform_rows(&mut grid, width, cap_sq);
    let mut columns = transpose(&grid, width, height);
    transform_rows(&mut columns, height, cap_sq);
    let squared = transpose(&columns, height, width);

    debug!(
        "distance transform over a {}x{} grid (pad {})",
        width, height, pad
    );

    Ok(DistanceField {
        pad,
        width,
        height,
        cap: max_value,
        distances: squared.into_iter().map(f64::sqrt).collect(),
    })
}

fn transform_rows(grid: &mut [f64], row_len: usize, cap_sq: f64) {
    if row_len == 0 {
        return;
    }
    for row in grid.chunks_mut(row_len) {
        let transformed = squared_distance_1d(row);
        for (cell, value) in row.iter_mut().zip(transformed) {
            *cell = value.min(cap_sq);
        }
    }
}

fn transpose(grid: &[f64], width: usize, height: usize) -> Vec<f64> {
    let mut out = vec![0.0; grid.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = grid[y * width + x];
        }
    }
    out
}

/// One-dimensional squared distance transform of the sampled function
/// `f`: `d(p) = min_q ((p - q)² + f(q))` over every finite `f(q)`.
///
/// `vertices` holds the roots of the parabolas on the lower envelope
/// and `bounds[k]..bounds[k + 1]` is the stretch where parabola `k` is
/// lowest.
fn squared_distance_1d(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    let mut roots = (0..n).filter(|&q| f[q].is_finite());
    let first = match roots.next() {
        Some(q) => q,
        None => return vec![std::f64::INFINITY; n],
    };

    let mut vertices = vec![first];
    let mut bounds = vec![std::f64::NEG_INFINITY, std::f64::INFINITY];

    let intersect = |p: usize, q: usize| {
        let (pf, qf) = (p as f64, q as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    for q in roots {
        let mut s = intersect(vertices[vertices.len() - 1], q);
        // bounds[0] is -inf, so the envelope never empties.
        while s <= bounds[vertices.len() - 1] {
            vertices.pop();
            bounds.pop();
            s = intersect(vertices[vertices.len() - 1], q);
        }
        let last = bounds.len() - 1;
        bounds[last] = s;
        vertices.push(q);
        bounds.push(std::f64::INFINITY);
    }

    let mut k = 0;
    (0..n)
        .map(|p| {
            while bounds[k + 1] < p as f64 {
                k += 1;
            }
            let offset = p as f64 - vertices[k] as f64;
            offset * offset + f[vertices[k]]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn brute_force(mask: &Mask, x: i64, y: i64, cap: f64) -> f64 {
        iproduct!(0..mask.width(), 0..mask.height())
            .filter(|&(mx, my)| mask.is_marked(mx, my))
            .map(|(mx, my)| {
                let dx = (mx as i64 - x) as f64;
                let dy = (my as i64 - y) as f64;
                (dx * dx + dy * dy).sqrt()
            })
            .fold(cap, f64::min)
    }

    fn assert_matches_brute_force(mask: &Mask, cap: f64) {
        let field = distance_transform(mask, cap).unwrap();
        let pad = field.pad() as i64;
        for y in -pad..(mask.height() as i64 + pad) {
            for x in -pad..(mask.width() as i64 + pad) {
                let expected = brute_force(mask, x, y, cap);
                let got = field.get(x, y);
                assert!(
                    (expected - got).abs() < 1e-9,
                    "at ({}, {}): expected {}, got {}",
                    x,
                    y,
                    expected,
                    got
                );
            }
        }
    }

    #[test]
    fn one_dimensional_transform_of_two_roots() {
        let inf = std::f64::INFINITY;
        let d = squared_distance_1d(&[0.0, inf, inf, inf, 0.0]);
        assert_eq!(d, vec![0.0, 1.0, 4.0, 1.0, 0.0]);
    }

    #[test]
    fn one_dimensional_transform_without_roots() {
        let inf = std::f64::INFINITY;
        assert!(squared_distance_1d(&[inf, inf]).iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn single_marked_corner() {
        let mask = Mask::from_fn(5, 5, |x, y| x == 0 && y == 0);
        let field = distance_transform(&mask, 10.0).unwrap();
        assert_eq!(field.get(0, 0), 0.0);
        assert_eq!(field.get(4, 0), 4.0);
        assert!((field.get(4, 4) - 32f64.sqrt()).abs() < 1e-12);
        assert_matches_brute_force(&mask, 10.0);
    }

    #[test]
    fn scattered_marks_match_brute_force() {
        let mask = Mask::from_fn(9, 7, |x, y| (x * 7 + y * 3) % 11 == 0);
        assert_matches_brute_force(&mask, 4.0);
    }

    #[test]
    fn marked_cells_are_at_distance_zero() {
        let mask = Mask::from_fn(6, 6, |x, y| x == y);
        let field = distance_transform(&mask, 3.0).unwrap();
        for i in 0..6 {
            assert_eq!(field.get(i, i), 0.0);
        }
    }

    #[test]
    fn far_and_outside_cells_read_as_the_cap() {
        let mask = Mask::from_fn(3, 3, |_, _| false);
        let field = distance_transform(&mask, 2.0).unwrap();
        assert_eq!(field.get(1, 1), 2.0);
        assert_eq!(field.get(-100, 50), 2.0);
    }

    #[test]
    fn rejects_mismatched_cell_counts() {
        assert!(Mask::new(2, 2, vec![true; 3]).is_err());
        assert!(Mask::new(2, 2, vec![true; 4]).is_ok());
    }

    #[test]
    fn oversized_padding_is_a_configuration_error() {
        let mask = Mask::from_fn(2, 2, |x, y| x == y);
        for range in &[1e20, 1e6, std::f64::MAX, -1.0, std::f64::NAN] {
            match distance_transform(&mask, *range) {
                Err(FractalError::Config(_)) => {}
                other => panic!("range {} gave {:?}", range, other.map(|f| f.pad())),
            }
        }
        assert!(distance_transform(&mask, 100.0).is_ok());
    }

    #[test]
    fn only_pure_black_pixels_of_a_png_are_marked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let mut picture = image::RgbImage::from_pixel(4, 3, image::Rgb([255, 255, 255]));
        picture.put_pixel(1, 2, image::Rgb([0, 0, 0]));
        picture.put_pixel(2, 2, image::Rgb([1, 0, 0]));
        picture.save(&path).unwrap();

        let mask = Mask::open(&path).unwrap();
        assert_eq!((mask.width(), mask.height()), (4, 3));
        assert!(mask.is_marked(1, 2));
        assert!(!mask.is_marked(2, 2));
        let marked = iproduct!(0..4, 0..3)
            .filter(|&(x, y)| mask.is_marked(x, y))
            .count();
        assert_eq!(marked, 1);
    }

    #[test]
    fn missing_mask_file_is_a_resource_error() {
        match Mask::open("no/such/mask.png") {
            Err(FractalError::Mask { path, .. }) => assert_eq!(path, "no/such/mask.png"),
            other => panic!("expected a mask error, got {:?}", other),
        }
    }
}
