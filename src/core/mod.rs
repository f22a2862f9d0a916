//! Core functionalities of Feature Tracking Rust.

pub mod correlation;
pub mod feature;
pub mod frame;
pub mod seed;
pub mod track;
