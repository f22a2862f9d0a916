// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bounded search windows around the last known position of a feature.
//!
//! A window around `(x, y)` with half sizes `(half_width, half_height)`
//! holds the placements of the patch whose top left corner is in
//! `[x - half_width, x + half_width] x [y - half_height, y + half_height]`.
//! It is then clamped to the frame:
//!
//! * on the right and bottom edges, the size shrinks by exactly the amount
//!   by which the searched pixels would overflow the frame,
//! * on the left and top edges, the origin is clamped to 0
//!   and the size shrinks by the clipped amount, keeping the far edge in place.
//!
//! If a size is not positive after clamping, there is no window.

/// Clamped search window inside a frame.
///
/// Placements of the patch have their top left corner in
/// `[x, x + width] x [y, y + height]`, so the searched pixels are
/// `[x, x + width + patch_size) x [y, y + height + patch_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    /// First column of the searched region.
    pub x: usize,
    /// First row of the searched region.
    pub y: usize,
    /// Horizontal extent of the placements, there are `width + 1` of them per row.
    pub width: usize,
    /// Vertical extent of the placements, there are `height + 1` of them per column.
    pub height: usize,
    /// Side of the searched patch.
    pub patch_size: usize,
}

/// The search window of a feature degenerated while clamping it to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfBounds {
    /// No column placement fits in the frame.
    Horizontal,
    /// No row placement fits in the frame.
    Vertical,
}

impl SearchWindow {
    /// Clamped window around the feature position `(x, y)`.
    pub fn around(
        x: usize,
        y: usize,
        half_width: usize,
        half_height: usize,
        patch_size: usize,
        frame_width: usize,
        frame_height: usize,
    ) -> Result<Self, OutOfBounds> {
        let (x0, width) = clamp_axis(x, half_width, patch_size, frame_width)
            .ok_or(OutOfBounds::Horizontal)?;
        let (y0, height) = clamp_axis(y, half_height, patch_size, frame_height)
            .ok_or(OutOfBounds::Vertical)?;
        Ok(Self {
            x: x0,
            y: y0,
            width,
            height,
            patch_size,
        })
    }

    /// (rows, columns) of the searched region.
    pub fn region_shape(&self) -> (usize, usize) {
        (self.height + self.patch_size, self.width + self.patch_size)
    }

    /// Column just after the searched region.
    pub fn right(&self) -> usize {
        self.x + self.width + self.patch_size
    }

    /// Row just after the searched region.
    pub fn bottom(&self) -> usize {
        self.y + self.height + self.patch_size
    }

    /// Frame position `(x, y)` of the center of the placement
    /// at `(row, col)` in the response surface of this window.
    pub fn placement_center(&self, row: usize, col: usize) -> (usize, usize) {
        let radius = self.patch_size.saturating_sub(1) / 2;
        (self.x + col + radius, self.y + row + radius)
    }
}

/// Start and size of the placements along one axis.
/// Computed in `i128` so that any `usize` input is exact.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_axis(
    position: usize,
    half_size: usize,
    patch_size: usize,
    length: usize,
) -> Option<(usize, usize)> {
    let mut start = position as i128 - half_size as i128;
    let mut size = 2 * half_size as i128;
    let overflow = start + size + patch_size as i128 - length as i128;
    if overflow > 0 {
        size -= overflow;
    }
    if start < 0 {
        size += start;
        start = 0;
    }
    if size > 0 {
        Some((start as usize, size as usize))
    } else {
        None
    }
}

// TESTS #############################################################
