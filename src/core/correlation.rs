// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Similarity of a reference patch with every placement inside a region.
//!
//! A response surface has one score per placement of the patch
//! fully inside the region, indexed by the `(row, column)`
//! of the top left corner of the placement.

use itertools::iproduct;
use nalgebra::{DMatrix, DMatrixSlice, Scalar};
use num_traits::AsPrimitive;

use crate::misc::type_aliases::Float;

/// Sums of squared deviations below this are considered null.
const ZERO_ENERGY: f64 = 1e-9;

/// Strategy used to score the placements of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Zero-mean normalized cross-correlation.
    /// Invariant to affine intensity changes, scores in [-1, 1].
    NormalizedCrossCorrelation,
}

impl Default for MatchMethod {
    fn default() -> Self {
        MatchMethod::NormalizedCrossCorrelation
    }
}

impl MatchMethod {
    /// Decode the numeric `match_method` parameter.
    /// Only 0 (normalized cross-correlation) is known.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MatchMethod::NormalizedCrossCorrelation),
            _ => None,
        }
    }

    /// Decode a textual `match_method` parameter.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ncc" | "normalized_cross_correlation" => Some(MatchMethod::NormalizedCrossCorrelation),
            _ => None,
        }
    }

    /// Response surface of `patch` over `region`.
    /// It is empty if the patch is empty or does not fit in the region.
    pub fn response<T, U>(self, region: &DMatrixSlice<T>, patch: &DMatrix<U>) -> DMatrix<Float>
    where
        T: Scalar + AsPrimitive<f64>,
        U: Scalar + AsPrimitive<f64>,
    {
        match self {
            MatchMethod::NormalizedCrossCorrelation => normalized_cross_correlation(region, patch),
        }
    }
}

/// Zero-mean normalized cross-correlation of `patch` at every placement in `region`.
///
/// For a placement R of the patch P:
///
/// ```text
///          sum( (R - mean(R)) * (P - mean(P)) )
/// score = ---------------------------------------------------
///         sqrt( sum((R - mean(R))^2) * sum((P - mean(P))^2) )
/// ```
///
/// When either the patch or the placement has a constant intensity,
/// the ratio is 0 / 0 and the score is defined as 0.
#[allow(clippy::cast_possible_truncation)]
pub fn normalized_cross_correlation<T, U>(
    region: &DMatrixSlice<T>,
    patch: &DMatrix<U>,
) -> DMatrix<Float>
where
    T: Scalar + AsPrimitive<f64>,
    U: Scalar + AsPrimitive<f64>,
{
    let (region_rows, region_cols) = region.shape();
    let (patch_rows, patch_cols) = patch.shape();
    if patch_rows == 0 || patch_cols == 0 || patch_rows > region_rows || patch_cols > region_cols {
        return DMatrix::zeros(0, 0);
    }

    // Center the patch once, it is shared by all placements.
    let nb_pixels = (patch_rows * patch_cols) as f64;
    let patch_mean = patch.iter().map(|&p| -> f64 { p.as_() }).sum::<f64>() / nb_pixels;
    let centered: DMatrix<f64> = patch.map(|p| -> f64 { p.as_() - patch_mean });
    let patch_energy = centered.iter().map(|p| p * p).sum::<f64>();

    DMatrix::from_fn(
        region_rows - patch_rows + 1,
        region_cols - patch_cols + 1,
        |row, col| {
            let mut sum = 0.0;
            let mut sum_squared = 0.0;
            let mut sum_cross = 0.0;
            for j in 0..patch_cols {
                for i in 0..patch_rows {
                    let r: f64 = region[(row + i, col + j)].as_();
                    sum += r;
                    sum_squared += r * r;
                    // sum(P - mean(P)) == 0 so mean(R) cancels out.
                    sum_cross += r * centered[(i, j)];
                }
            }
            let region_energy = sum_squared - sum * sum / nb_pixels;
            normalized_score(sum_cross, patch_energy, region_energy) as Float
        },
    )
}

fn normalized_score(cross: f64, patch_energy: f64, region_energy: f64) -> f64 {
    if patch_energy <= ZERO_ENERGY || region_energy <= ZERO_ENERGY {
        0.0
    } else {
        (cross / (patch_energy * region_energy).sqrt())
            .max(-1.0)
            .min(1.0)
    }
}

/// `(row, column, score)` of the highest score of a response surface.
///
/// Rows are scanned one after the other, so the first maximum
/// in reading order wins ties. `None` if the response is empty.
pub fn max_location(response: &DMatrix<Float>) -> Option<(usize, usize, Float)> {
    let (nrows, ncols) = response.shape();
    iproduct!(0..nrows, 0..ncols).fold(None, |best, (row, col)| {
        let score = response[(row, col)];
        match best {
            Some((_, _, best_score)) if best_score >= score => best,
            _ => Some((row, col, score)),
        }
    })
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use approx;
    use quickcheck_macros;

    const EPSILON: Float = 1e-5;

    fn texture(x: usize, y: usize) -> u8 {
        let mut h = (x as u32).wrapping_mul(374_761_393) ^ (y as u32).wrapping_mul(668_265_263);
        h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
        (h >> 24) as u8
    }

    fn textured(height: usize, width: usize) -> DMatrix<u8> {
        DMatrix::from_fn(height, width, |row, col| texture(col, row))
    }

    fn full<T: Scalar>(mat: &DMatrix<T>) -> DMatrixSlice<T> {
        mat.slice((0, 0), mat.shape())
    }

    #[test]
    fn response_shape() {
        let region = textured(12, 20);
        let patch = textured(5, 5);
        let response = normalized_cross_correlation(&full(&region), &patch);
        assert_eq!(response.shape(), (8, 16));
    }

    #[test]
    fn patch_bigger_than_region() {
        let region = textured(4, 20);
        let patch = textured(5, 5);
        let response = MatchMethod::default().response(&full(&region), &patch);
        assert_eq!(response.shape(), (0, 0));
        assert_eq!(max_location(&response), None);
    }

    #[test]
    fn exact_copy_is_found() {
        let region = textured(20, 30);
        let patch = region.slice((6, 11), (7, 7)).into_owned();
        let response = normalized_cross_correlation(&full(&region), &patch);
        let (row, col, score) = max_location(&response).unwrap();
        assert_eq!((row, col), (6, 11));
        approx::assert_relative_eq!(score, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn affine_intensity_invariance() {
        let patch = textured(5, 5).map(|p| p / 4);
        let brighter = patch.map(|p| 2 * p + 10);
        let inverted = patch.map(|p| 200 - p);
        let same = normalized_cross_correlation(&full(&brighter), &patch);
        let opposite = normalized_cross_correlation(&full(&inverted), &patch);
        approx::assert_relative_eq!(same[(0, 0)], 1.0, epsilon = EPSILON);
        approx::assert_relative_eq!(opposite[(0, 0)], -1.0, epsilon = EPSILON);
    }

    #[test]
    fn uniform_is_zero() {
        let uniform_region: DMatrix<u8> = DMatrix::repeat(10, 10, 42);
        let uniform_patch: DMatrix<u8> = DMatrix::repeat(3, 3, 42);
        let textured_patch = textured(3, 3);
        let both = normalized_cross_correlation(&full(&uniform_region), &uniform_patch);
        let region_only = normalized_cross_correlation(&full(&uniform_region), &textured_patch);
        let patch_only = normalized_cross_correlation(&full(&textured(10, 10)), &uniform_patch);
        assert!(both.iter().all(|&s| s == 0.0));
        assert!(region_only.iter().all(|&s| s == 0.0));
        assert!(patch_only.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn float_pixels() {
        let region = textured(9, 9).map(|p| Float::from(p) / 255.0);
        let patch = region.slice((2, 3), (3, 3)).into_owned();
        let response = normalized_cross_correlation(&full(&region), &patch);
        let (row, col, _) = max_location(&response).unwrap();
        assert_eq!((row, col), (2, 3));
    }

    #[test]
    fn first_maximum_wins() {
        let response = DMatrix::from_row_slice(2, 3, &[0.1, 0.5, 0.2, 0.5, 0.3, 0.5]);
        assert_eq!(max_location(&response), Some((0, 1, 0.5)));
    }

    #[test]
    fn method_codes() {
        assert_eq!(
            MatchMethod::from_code(0),
            Some(MatchMethod::NormalizedCrossCorrelation)
        );
        assert_eq!(MatchMethod::from_code(1), None);
        assert_eq!(
            MatchMethod::from_name("NCC"),
            Some(MatchMethod::NormalizedCrossCorrelation)
        );
        assert_eq!(MatchMethod::from_name("sqdiff"), None);
    }

    // PROPERTY TESTS ################################################

    #[quickcheck_macros::quickcheck]
    fn scores_are_bounded(pixels: Vec<u8>, patch_pixels: Vec<u8>) -> bool {
        if pixels.len() < 36 || patch_pixels.len() < 9 {
            return true;
        }
        let region = DMatrix::from_row_slice(6, 6, &pixels[0..36]);
        let patch = DMatrix::from_row_slice(3, 3, &patch_pixels[0..9]);
        let response = normalized_cross_correlation(&full(&region), &patch);
        response.iter().all(|&s| s >= -1.0 && s <= 1.0)
    }

    #[quickcheck_macros::quickcheck]
    fn maximum_is_an_upper_bound(values: Vec<Float>) -> bool {
        let values: Vec<Float> = values.into_iter().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return true;
        }
        let response = DMatrix::from_row_slice(1, values.len(), &values);
        match max_location(&response) {
            Some((0, col, score)) => {
                response[(0, col)] == score && values.iter().all(|&v| v <= score)
            }
            _ => false,
        }
    }
}
