// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Type aliases for common types used all over the code base.

/// At the moment, the library is focused on f32 computation.
/// Correlation sums are still accumulated in f64 internally.
pub type Float = f32;
