// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tracked features and their reference patches.

use nalgebra::DMatrix;
use std::fmt;

/// Smallest usable patch side. A 1 pixel patch has no neighborhood.
pub const MIN_PATCH_SIZE: usize = 3;

/// Ordered list of features.
/// Order only matters for iteration determinism, each feature is tracked independently.
pub type FeatureList = Vec<Feature>;

/// Outcome of the last tracking pass of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    /// Freshly captured, not tracked yet.
    Idle,
    /// Successfully relocated in the last frame.
    Tracked,
    /// No sufficiently confident match was found.
    /// Terminal until the feature is reinitialized by its owner.
    Lost,
}

/// A point of interest, with the patch that was captured around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifier, only used by callers.
    pub id: usize,
    /// Column of the feature center.
    pub x: usize,
    /// Row of the feature center.
    pub y: usize,
    /// Square reference patch of odd side, centered on the feature at capture time.
    pub patch: DMatrix<u8>,
    /// Status after the last tracking pass.
    pub status: TrackStatus,
}

/// Reasons for a patch to be unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchDefect {
    /// Width and height differ.
    NotSquare {
        /// Width of the patch.
        width: usize,
        /// Height of the patch.
        height: usize,
    },
    /// Patch side is smaller than `MIN_PATCH_SIZE`.
    TooSmall(usize),
    /// Patch side is even, so the patch has no center pixel.
    EvenSide(usize),
}

impl fmt::Display for PatchDefect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PatchDefect::NotSquare { width, height } => {
                write!(f, "patch is not square ({}x{})", width, height)
            }
            PatchDefect::TooSmall(side) => write!(
                f,
                "patch side {} is smaller than {}",
                side, MIN_PATCH_SIZE
            ),
            PatchDefect::EvenSide(side) => write!(f, "patch side {} is even", side),
        }
    }
}

impl Feature {
    /// Create an idle feature from an already captured patch.
    /// The patch is not validated here, trackers do it before using it.
    pub fn new(id: usize, x: usize, y: usize, patch: DMatrix<u8>) -> Self {
        Self {
            id,
            x,
            y,
            patch,
            status: TrackStatus::Idle,
        }
    }

    /// Capture a patch of side `2 * half_size + 1` centered on `(x, y)`.
    /// Returns `None` if the patch does not fit inside the frame,
    /// or if `half_size` is 0.
    pub fn from_frame(
        id: usize,
        frame: &DMatrix<u8>,
        x: usize,
        y: usize,
        half_size: usize,
    ) -> Option<Self> {
        let (height, width) = frame.shape();
        let side = 2 * half_size + 1;
        if half_size == 0 || x < half_size || y < half_size {
            return None;
        }
        if x + half_size >= width || y + half_size >= height {
            return None;
        }
        let patch = frame
            .slice((y - half_size, x - half_size), (side, side))
            .into_owned();
        Some(Self::new(id, x, y, patch))
    }

    /// Side of the (square) patch.
    /// Only meaningful once `check_patch` succeeded.
    pub fn patch_size(&self) -> usize {
        self.patch.ncols()
    }

    /// Offset from the top left corner of the patch to its center.
    pub fn patch_radius(&self) -> usize {
        self.patch_size().saturating_sub(1) / 2
    }

    /// Verify that the patch is square, big enough, and of odd side.
    pub fn check_patch(&self) -> Result<(), PatchDefect> {
        let (height, width) = self.patch.shape();
        if width != height {
            Err(PatchDefect::NotSquare { width, height })
        } else if width < MIN_PATCH_SIZE {
            Err(PatchDefect::TooSmall(width))
        } else if width % 2 == 0 {
            Err(PatchDefect::EvenSide(width))
        } else {
            Ok(())
        }
    }

    /// True if the last tracking pass relocated the feature.
    pub fn is_tracked(&self) -> bool {
        self.status == TrackStatus::Tracked
    }
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use quickcheck_macros;

    fn ramp(height: usize, width: usize) -> DMatrix<u8> {
        DMatrix::from_fn(height, width, |row, col| (3 * row + col) as u8)
    }

    #[test]
    fn capture_centered_patch() {
        let frame = ramp(20, 30);
        let feature = Feature::from_frame(4, &frame, 10, 5, 2).unwrap();
        assert_eq!(feature.status, TrackStatus::Idle);
        assert_eq!(feature.patch_size(), 5);
        assert_eq!(feature.patch_radius(), 2);
        assert_eq!(feature.patch[(0, 0)], frame[(3, 8)]);
        assert_eq!(feature.patch[(2, 2)], frame[(5, 10)]);
        assert_eq!(feature.patch[(4, 4)], frame[(7, 12)]);
        assert_eq!(feature.check_patch(), Ok(()));
    }

    #[test]
    fn capture_outside_frame() {
        let frame = ramp(20, 30);
        assert!(Feature::from_frame(0, &frame, 1, 10, 2).is_none());
        assert!(Feature::from_frame(0, &frame, 10, 1, 2).is_none());
        assert!(Feature::from_frame(0, &frame, 28, 10, 2).is_none());
        assert!(Feature::from_frame(0, &frame, 10, 18, 2).is_none());
        assert!(Feature::from_frame(0, &frame, 10, 10, 0).is_none());
        assert!(Feature::from_frame(0, &frame, 27, 17, 2).is_some());
    }

    #[test]
    fn patch_defects() {
        let not_square = Feature::new(0, 5, 5, DMatrix::repeat(3, 5, 0));
        assert_eq!(
            not_square.check_patch(),
            Err(PatchDefect::NotSquare {
                width: 5,
                height: 3
            })
        );
        let too_small = Feature::new(0, 5, 5, DMatrix::repeat(1, 1, 0));
        assert_eq!(too_small.check_patch(), Err(PatchDefect::TooSmall(1)));
        let empty = Feature::new(0, 5, 5, DMatrix::repeat(0, 0, 0));
        assert_eq!(empty.check_patch(), Err(PatchDefect::TooSmall(0)));
        let even = Feature::new(0, 5, 5, DMatrix::repeat(4, 4, 0));
        assert_eq!(even.check_patch(), Err(PatchDefect::EvenSide(4)));
    }

    // PROPERTY TESTS ################################################

    #[quickcheck_macros::quickcheck]
    fn captured_patches_are_valid(x: usize, y: usize, half_size: usize) -> bool {
        let frame = ramp(40, 50);
        match Feature::from_frame(0, &frame, x % 50, y % 40, half_size % 10) {
            Some(feature) => {
                feature.check_patch().is_ok()
                    && feature.patch[(feature.patch_radius(), feature.patch_radius())]
                        == frame[(feature.y, feature.x)]
            }
            None => true,
        }
    }
}
