// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Frames given to the trackers, and their conversion to intensity.
//!
//! Trackers only ever read single channel 8 bits intensity matrices.
//! A `Frame` may hold other representations coming from a sensor,
//! in which case the conversion happens once per tracking call.

use image::DynamicImage;
use nalgebra::DMatrix;
use std::borrow::Cow;

use crate::misc::interop;
use crate::misc::type_aliases::Float;

/// An image, as provided by the upstream imaging layer.
///
/// Matrices are indexed `(row, column)`,
/// so `nrows()` is the height and `ncols()` the width of the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Single channel 8 bits intensity.
    Gray(DMatrix<u8>),
    /// Three channels 8 bits color, in (red, green, blue) order.
    Rgb(DMatrix<(u8, u8, u8)>),
    /// Single channel intensity normalized in [0, 1].
    Normalized(DMatrix<Float>),
}

impl Frame {
    /// (height, width) of the frame.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Frame::Gray(mat) => mat.shape(),
            Frame::Rgb(mat) => mat.shape(),
            Frame::Normalized(mat) => mat.shape(),
        }
    }

    /// Width of the frame in pixels.
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// Height of the frame in pixels.
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// True if the frame holds more than one channel.
    pub fn is_color(&self) -> bool {
        match self {
            Frame::Rgb(_) => true,
            Frame::Gray(_) | Frame::Normalized(_) => false,
        }
    }

    /// 8 bits intensity view of the frame.
    /// Borrows gray frames, converts the others.
    pub fn intensity(&self) -> Cow<DMatrix<u8>> {
        match self {
            Frame::Gray(mat) => Cow::Borrowed(mat),
            Frame::Rgb(mat) => Cow::Owned(mat.map(|(r, g, b)| luma(r, g, b))),
            Frame::Normalized(mat) => Cow::Owned(mat.map(quantize)),
        }
    }
}

impl From<DMatrix<u8>> for Frame {
    fn from(mat: DMatrix<u8>) -> Self {
        Frame::Gray(mat)
    }
}

impl From<DynamicImage> for Frame {
    /// Gray 8 bits images are kept as is, anything else goes through RGB.
    fn from(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(gray) => Frame::Gray(interop::matrix_from_image(gray)),
            other => Frame::Rgb(interop::rgb_matrix_from_image(&other.to_rgb())),
        }
    }
}

/// ITU-R BT.601 luma of a color, with integer arithmetic and rounding.
#[allow(clippy::cast_possible_truncation)]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((weighted + 500) / 1000) as u8
}

/// Map a normalized intensity to [0, 255], saturating outside of [0, 1].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: Float) -> u8 {
    (255.0 * value).round().max(0.0).min(255.0) as u8
}

// TESTS #############################################################
