//! Logic Module - Inference pipeline
//!
//! ## Layout
//! - `features/` - schema registry, raw records, reconstruction
//! - `model/` - forest loading, scoring, label threshold
//! - `explain/` - TreeSHAP attribution and ranking
//! - `recommendation/` - outreach script rules
//! - `artifacts.rs` / `pipeline.rs` / `batch.rs` / `service.rs` - wiring

pub mod features;
pub mod model;
pub mod explain;
pub mod recommendation;

pub mod artifacts;
pub mod pipeline;
pub mod batch;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
