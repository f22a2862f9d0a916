// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions to visualize tracked features.

use image::RgbImage;
use nalgebra::DMatrix;

use crate::core::feature::{Feature, TrackStatus};
use crate::misc::interop;

/// Color of a feature marker, depending on its status.
pub fn status_color(status: TrackStatus) -> (u8, u8, u8) {
    match status {
        TrackStatus::Idle => (255, 255, 0),
        TrackStatus::Tracked => (0, 255, 0),
        TrackStatus::Lost => (255, 0, 0),
    }
}

/// Create an RGB image containing the gray image
/// and the outline of each feature patch, colored by status.
pub fn features_on_image(img: &DMatrix<u8>, features: &[Feature]) -> RgbImage {
    let mut rgb_mat = img.map(|i| (i, i, i));
    features
        .iter()
        .for_each(|f| draw_square(&mut rgb_mat, f, status_color(f.status)));
    interop::rgb_from_matrix(&rgb_mat)
}

// Square outline of the feature patch, clipped to the image.
fn draw_square(mat: &mut DMatrix<(u8, u8, u8)>, feature: &Feature, color: (u8, u8, u8)) {
    let (nrows, ncols) = mat.shape();
    let radius = feature.patch_radius().max(1);
    let left = feature.x.saturating_sub(radius);
    let top = feature.y.saturating_sub(radius);
    let right = feature.x + radius;
    let bottom = feature.y + radius;
    for x in left..=right.min(ncols.saturating_sub(1)) {
        for &y in &[top, bottom] {
            if y < nrows {
                mat[(y, x)] = color;
            }
        }
    }
    for y in top..=bottom.min(nrows.saturating_sub(1)) {
        for &x in &[left, right] {
            if x < ncols {
                mat[(y, x)] = color;
            }
        }
    }
}

// TESTS #############################################################
