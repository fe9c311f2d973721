//! Feature Vector - Aligned model input
//!
//! **Schema-tagged feature vector**
//!
//! Uses the shared `FeatureSchema` for:
//! - Consistent feature ordering
//! - Layout hash for compatibility checks
//!
//! A vector can only be created through [`FeatureVector::zeros`] or
//! [`FeatureVector::align`], so its key set and order always equal the
//! schema's.

use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::{Array1, ArrayView1};

use super::layout::FeatureSchema;

// ============================================================================
// ALIGNED FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct FeatureVector {
    schema: Arc<FeatureSchema>,
    values: Array1<f32>,
}

impl FeatureVector {
    /// Zeroed vector for the given schema
    pub fn zeros(schema: Arc<FeatureSchema>) -> Self {
        let values = Array1::zeros(schema.len());
        Self { schema, values }
    }

    /// Reindex a named column set against the schema.
    ///
    /// Schema features absent from `columns` stay 0; columns the schema
    /// does not know are dropped.
    pub fn align(schema: Arc<FeatureSchema>, columns: &BTreeMap<String, f64>) -> Self {
        let mut vector = Self::zeros(schema);
        for (name, value) in columns {
            vector.set_by_name(name, *value as f32);
        }
        vector
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Get feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        self.schema.feature_index(name).and_then(|i| self.get(i))
    }

    /// Set feature by name; returns false when the schema lacks it
    pub fn set_by_name(&mut self, name: &str, value: f32) -> bool {
        match self.schema.feature_index(name) {
            Some(index) => {
                self.values[index] = value;
                true
            }
            None => false,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        self.schema.names()
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn layout_hash(&self) -> u32 {
        self.schema.layout_hash()
    }

    /// (name, value) pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "layout_hash": self.layout_hash(),
            "values": self.values.to_vec(),
            "named_values": self.iter()
                .filter(|(_, v)| *v != 0.0)
                .map(|(name, value)| (name.to_string(), value))
                .collect::<BTreeMap<_, _>>(),
        })
    }
}

impl PartialEq for FeatureVector {
    fn eq(&self, other: &Self) -> bool {
        self.layout_hash() == other.layout_hash()
            && self.feature_names() == other.feature_names()
            && self.values == other.values
    }
}

// ============================================================================
// TESTS
// ============================================================================
