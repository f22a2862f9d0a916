// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful types and functions for tracking features from one frame to the next.

pub mod patch_match;
pub mod window;

use thiserror::Error;

use crate::core::feature::{Feature, PatchDefect};
use crate::core::frame::Frame;

/// Errors failing a whole tracking call.
///
/// When a call fails, none of the features has been modified.
/// Features that merely cannot be found are not errors, they are marked lost.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The requested configuration is not implemented or not valid.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    /// A feature reference patch is malformed.
    /// This is a bug of whoever captured the patch.
    #[error("feature at index {index} has a malformed patch: {defect}")]
    Precondition {
        /// Index of the feature in the list.
        index: usize,
        /// What is wrong with its patch.
        defect: PatchDefect,
    },
    /// Configuration parameters could not be read.
    #[error("invalid tracker parameters: {0}")]
    Parse(String),
}

/// Shared interface of feature trackers.
///
/// A tracker relocates in `new_frame` the features observed in `old_frame`,
/// updating their positions and statuses in place.
pub trait FeatureTracker {
    /// Track all `features` into `new_frame`.
    fn track(
        &self,
        old_frame: &Frame,
        new_frame: &Frame,
        features: &mut [Feature],
    ) -> Result<(), Error>;
}
