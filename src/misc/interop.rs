// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interoperability conversions between the image and matrix types.
//!
//! Matrices are indexed `(row, column)`, that is `(y, x)`,
//! while image buffers are indexed `(x, y)`.

use image::{GrayImage, Luma, Rgb, RgbImage};
use nalgebra::DMatrix;

/// Convert an `u8` matrix into a `GrayImage`.
/// Inverse operation of `matrix_from_image`.
#[allow(clippy::cast_possible_truncation)]
pub fn image_from_matrix(mat: &DMatrix<u8>) -> GrayImage {
    let (nb_rows, nb_cols) = mat.shape();
    GrayImage::from_fn(nb_cols as u32, nb_rows as u32, |x, y| {
        Luma([mat[(y as usize, x as usize)]])
    })
}

/// Convert an `(u8,u8,u8)` matrix into an `RgbImage`.
/// Inverse operation of `rgb_matrix_from_image`.
#[allow(clippy::cast_possible_truncation)]
pub fn rgb_from_matrix(mat: &DMatrix<(u8, u8, u8)>) -> RgbImage {
    let (nb_rows, nb_cols) = mat.shape();
    RgbImage::from_fn(nb_cols as u32, nb_rows as u32, |x, y| {
        let (r, g, b) = mat[(y as usize, x as usize)];
        Rgb([r, g, b])
    })
}

/// Convert a `GrayImage` into an `u8` matrix.
/// Image buffers are row major, so the raw buffer is read row by row.
pub fn matrix_from_image(img: GrayImage) -> DMatrix<u8> {
    let (width, height) = img.dimensions();
    DMatrix::from_row_slice(height as usize, width as usize, &img.into_raw())
}

/// Convert an `RgbImage` into an `(u8,u8,u8)` matrix.
pub fn rgb_matrix_from_image(img: &RgbImage) -> DMatrix<(u8, u8, u8)> {
    let (width, height) = img.dimensions();
    DMatrix::from_fn(height as usize, width as usize, |row, col| {
        let [r, g, b] = img.get_pixel(col as u32, row as u32).data;
        (r, g, b)
    })
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn gray_orientation() {
        // 2 rows, 3 columns.
        let mat = DMatrix::from_row_slice(2, 3, &[0, 1, 2, 3, 4, 5]);
        let img = image_from_matrix(&mat);
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 0), &Luma([2]));
        assert_eq!(img.get_pixel(0, 1), &Luma([3]));
        assert_eq!(matrix_from_image(img), mat);
    }

    #[test]
    fn rgb_orientation() {
        let mat = DMatrix::from_fn(4, 2, |row, col| (row as u8, col as u8, 7));
        let img = rgb_from_matrix(&mat);
        assert_eq!(img.dimensions(), (2, 4));
        assert_eq!(img.get_pixel(1, 3), &Rgb([3, 1, 7]));
        assert_eq!(rgb_matrix_from_image(&img), mat);
    }
}
