// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seeding of new features where the image has strong gradients.
//!
//! The frame is split in a grid of square cells and, in each cell,
//! the pixel with the strongest 2x2 gradient is picked,
//! if that gradient is strong enough and a whole patch fits around it.
//! This gives well distributed features on textured areas.

use itertools::iproduct;
use nalgebra::DMatrix;

use crate::core::feature::{Feature, FeatureList, TrackStatus};

/// Configuration of the seeding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Side of the grid cells. At most one feature is seeded per cell.
    pub cell_size: usize,
    /// Half side of the captured patches.
    pub patch_half_size: usize,
    /// Minimum squared gradient norm of a seeded pixel.
    pub min_gradient: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cell_size: 32,
            patch_half_size: 7,
            min_gradient: 100,
        }
    }
}

/// Gradient squared norm in a 2x2 pixels block.
///
/// The block is of the form:
///   a c
///   b d
#[allow(clippy::many_single_char_names)]
pub fn bloc_squared_norm(a: u8, b: u8, c: u8, d: u8) -> u16 {
    let a = i32::from(a);
    let b = i32::from(b);
    let c = i32::from(c);
    let d = i32::from(d);
    let dx = c + d - a - b;
    let dy = b - a + d - c;
    // dx^2 + dy^2 is at most 260100, so the result fits in u16.
    ((dx * dx + dy * dy) / 4) as u16
}

/// Squared gradient norms of all 2x2 blocks of the frame.
/// Block at `(row, col)` has its top left pixel at `(row, col)`,
/// so the result is one smaller than the frame in both directions.
pub fn squared_gradients(frame: &DMatrix<u8>) -> DMatrix<u16> {
    let (nrows, ncols) = frame.shape();
    if nrows < 2 || ncols < 2 {
        return DMatrix::zeros(0, 0);
    }
    DMatrix::from_fn(nrows - 1, ncols - 1, |row, col| {
        bloc_squared_norm(
            frame[(row, col)],
            frame[(row + 1, col)],
            frame[(row, col + 1)],
            frame[(row + 1, col + 1)],
        )
    })
}

/// Seed features in every cell of the frame.
/// Identifiers are given in sequence, starting at `first_id`.
pub fn seed(frame: &DMatrix<u8>, config: &Config, first_id: usize) -> FeatureList {
    let gradients = squared_gradients(frame);
    let mut features = Vec::new();
    for (cell_row, cell_col) in cells(frame, config) {
        if let Some(feature) = seed_in_cell(
            frame,
            &gradients,
            config,
            cell_row,
            cell_col,
            first_id + features.len(),
        ) {
            features.push(feature);
        }
    }
    features
}

/// Drop lost features and seed new ones in the cells
/// that do not hold a remaining feature anymore.
/// New identifiers start at `*next_id`, which is then advanced.
/// Returns the number of seeded features.
pub fn refill(
    frame: &DMatrix<u8>,
    config: &Config,
    features: &mut FeatureList,
    next_id: &mut usize,
) -> usize {
    features.retain(|f| f.status != TrackStatus::Lost);
    let cell_size = config.cell_size.max(1);
    let occupied: Vec<(usize, usize)> = features
        .iter()
        .map(|f| (f.y / cell_size, f.x / cell_size))
        .collect();
    let gradients = squared_gradients(frame);
    let nb_before = features.len();
    for (cell_row, cell_col) in cells(frame, config) {
        if occupied.contains(&(cell_row, cell_col)) {
            continue;
        }
        if let Some(feature) =
            seed_in_cell(frame, &gradients, config, cell_row, cell_col, *next_id)
        {
            *next_id += 1;
            features.push(feature);
        }
    }
    features.len() - nb_before
}

/// (row, col) indices of all grid cells, in row-major order.
fn cells(frame: &DMatrix<u8>, config: &Config) -> impl Iterator<Item = (usize, usize)> {
    let cell_size = config.cell_size.max(1);
    let (nrows, ncols) = frame.shape();
    let cell_rows = (nrows + cell_size - 1) / cell_size;
    let cell_cols = (ncols + cell_size - 1) / cell_size;
    iproduct!(0..cell_rows, 0..cell_cols)
}

/// Strongest gradient pixel of a cell, where a whole patch fits.
/// The first one in row-major order wins ties.
fn seed_in_cell(
    frame: &DMatrix<u8>,
    gradients: &DMatrix<u16>,
    config: &Config,
    cell_row: usize,
    cell_col: usize,
    id: usize,
) -> Option<Feature> {
    let cell_size = config.cell_size.max(1);
    let half = config.patch_half_size;
    let (grad_rows, grad_cols) = gradients.shape();
    let (nrows, ncols) = frame.shape();
    // Rows and columns where both the gradient block and the patch fit.
    let row_end = grad_rows.min(nrows.saturating_sub(half));
    let col_end = grad_cols.min(ncols.saturating_sub(half));
    let rows = (cell_row * cell_size).max(half)..((cell_row + 1) * cell_size).min(row_end);
    let cols = (cell_col * cell_size).max(half)..((cell_col + 1) * cell_size).min(col_end);
    let best = iproduct!(rows, cols).fold(None, |best: Option<(usize, usize, u16)>, (y, x)| {
        let g = gradients[(y, x)];
        match best {
            Some((_, _, best_g)) if best_g >= g => best,
            _ => Some((y, x, g)),
        }
    });
    match best {
        Some((y, x, g)) if g >= config.min_gradient => Feature::from_frame(id, frame, x, y, half),
        _ => None,
    }
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use quickcheck_macros;

    #[test]
    fn block_gradients() {
        assert_eq!(bloc_squared_norm(0, 0, 0, 0), 0);
        assert_eq!(bloc_squared_norm(7, 7, 7, 7), 0);
        // Vertical edge: dx = 2 * 100, dy = 0.
        assert_eq!(bloc_squared_norm(0, 0, 100, 100), 10_000);
        assert_eq!(bloc_squared_norm(255, 0, 0, 255), bloc_squared_norm(0, 255, 255, 0));
        assert_eq!(bloc_squared_norm(0, 255, 255, 255), 32_512);
    }

    #[test]
    fn gradients_shape() {
        let frame = DMatrix::repeat(10, 20, 3_u8);
        assert_eq!(squared_gradients(&frame).shape(), (9, 19));
        assert_eq!(squared_gradients(&DMatrix::repeat(1, 20, 3_u8)).shape(), (0, 0));
    }

    #[test]
    fn uniform_frame_has_no_seeds() {
        let frame = DMatrix::repeat(64, 64, 120_u8);
        assert!(seed(&frame, &Config::default(), 0).is_empty());
    }

    #[test]
    fn single_dot() {
        let mut frame = DMatrix::repeat(48, 64, 10_u8);
        frame[(30, 40)] = 250;
        let config = Config {
            cell_size: 16,
            patch_half_size: 3,
            min_gradient: 100,
        };
        let features = seed(&frame, &config, 5);
        // The 4 blocks touching the dot are equally strong and in the same cell.
        assert_eq!(features.len(), 1);
        let first = &features[0];
        assert_eq!((first.x, first.y), (39, 29));
        assert_eq!(first.status, TrackStatus::Idle);
        assert_eq!(first.patch_size(), 7);
        assert_eq!(first.id, 5);
    }

    #[test]
    fn refill_replaces_lost_features() {
        let frame = checkerboard(64, 64);
        let config = Config {
            cell_size: 16,
            patch_half_size: 3,
            min_gradient: 100,
        };
        let mut features = seed(&frame, &config, 0);
        let nb_seeded = features.len();
        assert!(nb_seeded > 0);
        features[0].status = TrackStatus::Lost;
        features[1].status = TrackStatus::Tracked;
        let mut next_id = nb_seeded;
        let added = refill(&frame, &config, &mut features, &mut next_id);
        assert_eq!(added, 1);
        assert_eq!(features.len(), nb_seeded);
        assert_eq!(next_id, nb_seeded + 1);
        assert!(features.iter().all(|f| f.id != 0));
        assert!(features.iter().any(|f| f.id == nb_seeded));
    }

    // PROPERTY TESTS ################################################

    #[quickcheck_macros::quickcheck]
    fn seeds_are_distributed_and_valid(cell_size: usize, half_size: usize) -> bool {
        let frame = checkerboard(50, 70);
        let config = Config {
            cell_size: 4 + cell_size % 20,
            patch_half_size: 1 + half_size % 6,
            min_gradient: 1,
        };
        let features = seed(&frame, &config, 0);
        let mut cells: Vec<_> = features
            .iter()
            .map(|f| (f.y / config.cell_size, f.x / config.cell_size))
            .collect();
        let nb_features = cells.len();
        cells.dedup();
        cells.len() == nb_features
            && features.iter().all(|f| {
                f.check_patch().is_ok() && f.patch_size() == 2 * config.patch_half_size + 1
            })
    }

    // GENERATORS ####################################################

    fn checkerboard(height: usize, width: usize) -> DMatrix<u8> {
        DMatrix::from_fn(height, width, |row, col| {
            if (row / 5 + col / 5) % 2 == 0 {
                30
            } else {
                200
            }
        })
    }
}
