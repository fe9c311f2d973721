//! HTTP handlers

pub mod health;
pub mod leads;
pub mod model;
