// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Feature tracking by patch matching.
//!
//! Each feature is searched in a bounded window around its last known position,
//! by scoring every placement of its reference patch inside the window.
//! If the best score is above a threshold, the feature moves to the center
//! of the best placement and is marked tracked. Otherwise it is marked lost
//! and keeps its last known position.
//!
//! Features are independent of each other,
//! so they can be tracked sequentially or in parallel with the same results.

use log::{debug, trace, warn};
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::fmt::Display;
use std::str::FromStr;

use crate::core::correlation::{self, MatchMethod};
use crate::core::feature::{Feature, TrackStatus};
use crate::core::frame::Frame;
use crate::core::track::window::SearchWindow;
use crate::core::track::{Error, FeatureTracker};
use crate::misc::params;
use crate::misc::type_aliases::Float;

/// Default half size of the search window, in both directions.
pub const DEFAULT_WINDOW_SIZE: usize = 15;

/// Default acceptance threshold of the correlation score.
pub const DEFAULT_THRESHOLD: Float = 0.90;

/// Configuration of the `PatchTracker`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Horizontal half size of the search window.
    pub window_width: usize,
    /// Vertical half size of the search window.
    pub window_height: usize,
    /// Scoring of the patch placements.
    pub match_method: MatchMethod,
    /// A match is accepted if its score is strictly greater than this.
    pub threshold: Float,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_SIZE,
            window_height: DEFAULT_WINDOW_SIZE,
            match_method: MatchMethod::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Config {
    /// Verify that the configuration can be used for tracking.
    pub fn check(&self) -> Result<(), Error> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(Error::UnsupportedConfiguration(format!(
                "search window half sizes must be positive, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        if !(self.threshold >= -1.0 && self.threshold <= 1.0) {
            return Err(Error::UnsupportedConfiguration(format!(
                "threshold {} is outside of the correlation range [-1, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Read a configuration from `key = value` parameter lines.
    ///
    /// Known keys are `window_width`, `window_height`, `threshold`
    /// and `match_method` (`0`, `ncc` or `normalized_cross_correlation`).
    /// Missing keys keep their default value, unknown keys are ignored.
    pub fn from_params(content: &str) -> Result<Self, Error> {
        let mut config = Self::default();
        for (key, value) in params::parse(content).map_err(Error::Parse)? {
            match key.as_str() {
                "window_width" => config.window_width = parse_value(&key, &value)?,
                "window_height" => config.window_height = parse_value(&key, &value)?,
                "threshold" => config.threshold = parse_value(&key, &value)?,
                "match_method" => config.match_method = parse_match_method(&value)?,
                _ => warn!("Ignoring unknown tracker parameter: {}", key),
            }
        }
        config.check()?;
        Ok(config)
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|err| Error::Parse(format!("{} = {}: {}", key, value, err)))
}

fn parse_match_method(value: &str) -> Result<MatchMethod, Error> {
    let method = match value.parse::<i64>() {
        Ok(code) => MatchMethod::from_code(code),
        Err(_) => MatchMethod::from_name(value),
    };
    method.ok_or_else(|| {
        Error::UnsupportedConfiguration(format!("match_method {} is not implemented", value))
    })
}

/// Best placement of a feature patch inside its search window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Column of the center of the placement.
    pub x: usize,
    /// Row of the center of the placement.
    pub y: usize,
    /// Score of the placement.
    pub score: Float,
    /// Window that was searched.
    pub window: SearchWindow,
}

/// Tracker relocating features by matching their patches in a search window.
#[derive(Debug, Clone, Default)]
pub struct PatchTracker {
    config: Config,
}

impl PatchTracker {
    /// Create a tracker. The configuration is checked at each tracking call.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration of the tracker.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Track features into an intensity frame, one after the other.
    pub fn track_intensity(
        &self,
        frame: &DMatrix<u8>,
        features: &mut [Feature],
    ) -> Result<(), Error> {
        self.check(features)?;
        features
            .iter_mut()
            .for_each(|feature| self.track_feature(frame, feature));
        log_summary(features);
        Ok(())
    }

    /// Track features into `new_frame`, spreading them on the rayon thread pool.
    /// Results are identical to the ones of `track`.
    pub fn track_par(&self, new_frame: &Frame, features: &mut [Feature]) -> Result<(), Error> {
        self.check(features)?;
        let frame = new_frame.intensity();
        features
            .par_iter_mut()
            .for_each(|feature| self.track_feature(&frame, feature));
        log_summary(features);
        Ok(())
    }

    /// Best placement of the feature patch around its current position.
    /// `None` if the search window does not fit in the frame.
    ///
    /// The patch of the feature must have been checked beforehand.
    pub fn best_match(&self, frame: &DMatrix<u8>, feature: &Feature) -> Option<Match> {
        let (frame_height, frame_width) = frame.shape();
        let window = match SearchWindow::around(
            feature.x,
            feature.y,
            self.config.window_width,
            self.config.window_height,
            feature.patch_size(),
            frame_width,
            frame_height,
        ) {
            Ok(window) => window,
            Err(out_of_bounds) => {
                trace!(
                    "Feature {} at ({}, {}) is out of bounds: {:?}",
                    feature.id,
                    feature.x,
                    feature.y,
                    out_of_bounds
                );
                return None;
            }
        };
        let region = frame.slice((window.y, window.x), window.region_shape());
        let response = self.config.match_method.response(&region, &feature.patch);
        correlation::max_location(&response).map(|(row, col, score)| {
            let (x, y) = window.placement_center(row, col);
            Match {
                x,
                y,
                score,
                window,
            }
        })
    }

    /// Fail before touching any feature if something is malformed.
    fn check(&self, features: &[Feature]) -> Result<(), Error> {
        self.config.check()?;
        features
            .iter()
            .enumerate()
            .try_for_each(|(index, feature)| {
                feature
                    .check_patch()
                    .map_err(|defect| Error::Precondition { index, defect })
            })
    }

    /// Lost features are left untouched until their owner reinitializes them.
    fn track_feature(&self, frame: &DMatrix<u8>, feature: &mut Feature) {
        if feature.status == TrackStatus::Lost {
            return;
        }
        match self.best_match(frame, feature) {
            Some(m) if m.score > self.config.threshold => {
                feature.x = m.x;
                feature.y = m.y;
                feature.status = TrackStatus::Tracked;
            }
            _ => feature.status = TrackStatus::Lost,
        }
    }
}

impl FeatureTracker for PatchTracker {
    /// Only `new_frame` is read, the patches were captured in `old_frame`.
    fn track(
        &self,
        _old_frame: &Frame,
        new_frame: &Frame,
        features: &mut [Feature],
    ) -> Result<(), Error> {
        self.track_intensity(&new_frame.intensity(), features)
    }
}

fn log_summary(features: &[Feature]) {
    let nb_tracked = features.iter().filter(|f| f.is_tracked()).count();
    debug!(
        "Patch matching: {} tracked, {} lost",
        nb_tracked,
        features.len() - nb_tracked
    );
}

// TESTS #############################################################
