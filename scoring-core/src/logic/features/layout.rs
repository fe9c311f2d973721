//! Feature Layout - Training-time Feature Schema
//!
//! **This file controls the feature schema**
//!
//! The ordered name list comes from the frozen `model_features.json`
//! artifact and is the single source of truth for alignment. It is loaded
//! once, never mutated, and shared behind an `Arc`.
//!
//! ## Rules:
//! 1. Order is the model's column order, never re-sorted
//! 2. Names are unique and non-empty
//! 3. The CRC32 layout hash tags every vector built against this schema

use std::collections::HashMap;
use std::path::Path;

use crc32fast::Hasher;

use crate::error::ArtifactLoadError;

// ============================================================================
// FEATURE SCHEMA (Authoritative source)
// ============================================================================

/// Ordered canonical feature names the model was trained on
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
    hash: u32,
}

impl FeatureSchema {
    /// Build a schema from an ordered name list
    pub fn from_names(names: Vec<String>) -> Result<Self, ArtifactLoadError> {
        if names.is_empty() {
            return Err(ArtifactLoadError::SchemaMismatch(
                "feature schema is empty".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ArtifactLoadError::SchemaMismatch(format!(
                    "feature {} has an empty name",
                    i
                )));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(ArtifactLoadError::SchemaMismatch(format!(
                    "duplicate feature name '{}'",
                    name
                )));
            }
        }

        let hash = compute_layout_hash(&names);
        Ok(Self { names, index, hash })
    }

    /// Load the JSON array artifact
    pub fn load(path: &Path) -> Result<Self, ArtifactLoadError> {
        if !path.exists() {
            return Err(ArtifactLoadError::Missing { path: path.to_path_buf() });
        }

        let data = std::fs::read(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let names: Vec<String> = serde_json::from_slice(&data)
            .map_err(|e| ArtifactLoadError::corrupt(path, e.to_string()))?;

        Self::from_names(names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get feature index by name
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Get feature name by index
    pub fn feature_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// CRC32 of the ordered names
    pub fn layout_hash(&self) -> u32 {
        self.hash
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of an ordered feature layout
pub fn compute_layout_hash(names: &[String]) -> u32 {
    let mut hasher = Hasher::new();

    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// TESTS
// ============================================================================
