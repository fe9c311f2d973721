//! Data models

pub mod lead;

pub use lead::*;
