//! Features Module - Feature Reconstruction Engine
//!
//! Schema registry, raw record types, versioned preprocessing tables and the
//! reconstructor that turns a raw lead into the model's input vector.

pub mod layout;
pub mod preprocessing;
pub mod raw;
pub mod reconstruct;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::FeatureSchema;
pub use preprocessing::{ContactRecency, PreprocessingConfig};
pub use raw::{normalize_field_name, RawLeadRecord, RawValue};
pub use reconstruct::FeatureReconstructor;
pub use vector::FeatureVector;
