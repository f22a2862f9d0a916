// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Feature Tracking Rust (ftrs)
//!
//! Patch based tracking of image features from one frame to the next.
//!
//! Each feature carries a small square reference patch captured in a previous frame.
//! In the new frame, the patch is searched in a bounded window around the
//! last known position of the feature, using normalized cross-correlation.
//! The feature is then marked as tracked (with its new position) or lost.
//!
//! ```no_run
//! use feature_tracking_rs::core::feature::Feature;
//! use feature_tracking_rs::core::frame::Frame;
//! use feature_tracking_rs::core::track::patch_match::{Config, PatchTracker};
//! use feature_tracking_rs::core::track::FeatureTracker;
//! # use nalgebra::DMatrix;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let old_img: DMatrix<u8> = DMatrix::repeat(480, 640, 0);
//! # let new_img: DMatrix<u8> = DMatrix::repeat(480, 640, 0);
//! let mut features: Vec<Feature> = Feature::from_frame(0, &old_img, 320, 240, 7)
//!     .into_iter()
//!     .collect();
//! let tracker = PatchTracker::new(Config::default());
//! tracker.track(&Frame::Gray(old_img), &Frame::Gray(new_img), &mut features)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod core;
pub mod dataset;
pub mod misc;
