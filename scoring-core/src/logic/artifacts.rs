//! Artifact Store - load-once frozen model bundle
//!
//! One directory holds the model, the ordered feature list and the optional
//! preprocessing / script tables. Everything is cross-checked before a
//! pipeline is built; any inconsistency is an `ArtifactLoadError`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{FEATURES_FILE, MODEL_FILE, PREPROCESSING_FILE, SCRIPTS_FILE};
use crate::error::ArtifactLoadError;
use crate::logic::features::{FeatureSchema, PreprocessingConfig};
use crate::logic::model::Forest;
use crate::logic::recommendation::RuleTable;

/// Where the frozen artifacts live
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

/// Describes what is currently loaded (status endpoint, logs)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub model_path: String,
    pub checksum: String, // sha256 hex of model.json
    pub schema_hash: String,
    pub feature_count: usize,
    pub tree_count: usize,
    pub preprocessing_version: String,
    pub script_version: String,
    pub loaded_at: DateTime<Utc>,
}

/// Validated, ready-to-share artifact set
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub schema: Arc<FeatureSchema>,
    pub forest: Arc<Forest>,
    pub config: Arc<PreprocessingConfig>,
    pub rules: Arc<RuleTable>,
    pub metadata: ModelMetadata,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn features_path(&self) -> PathBuf {
        self.dir.join(FEATURES_FILE)
    }

    pub fn preprocessing_path(&self) -> PathBuf {
        self.dir.join(PREPROCESSING_FILE)
    }

    pub fn scripts_path(&self) -> PathBuf {
        self.dir.join(SCRIPTS_FILE)
    }

    pub fn load(&self) -> Result<LoadedArtifacts, ArtifactLoadError> {
        log::info!("Loading scoring artifacts from: {}", self.dir.display());

        let schema = Arc::new(FeatureSchema::load(&self.features_path())?);

        let model_path = self.model_path();
        let model_bytes = read_file(&model_path)?;
        let checksum = hex::encode(Sha256::digest(&model_bytes));
        let forest = Forest::from_json_slice(&model_bytes)
            .map_err(|reason| ArtifactLoadError::corrupt(&model_path, reason))?;

        check_model_against_schema(&forest, &schema)?;

        let config = match PreprocessingConfig::load(&self.preprocessing_path())? {
            Some(config) => config,
            None => {
                log::warn!(
                    "{} not found, using built-in bank-marketing preprocessing tables",
                    PREPROCESSING_FILE
                );
                PreprocessingConfig::default()
            }
        };
        config.verify_schema(&schema)?;
        for warning in config.drift_warnings(&schema) {
            log::warn!("Preprocessing drift: {}", warning);
        }

        let rules = RuleTable::load(&self.scripts_path())?.unwrap_or_default();

        let metadata = ModelMetadata {
            model_path: model_path.display().to_string(),
            checksum,
            schema_hash: format!("{:08x}", schema.layout_hash()),
            feature_count: schema.len(),
            tree_count: forest.trees().len(),
            preprocessing_version: config.version.clone(),
            script_version: rules.version.clone(),
            loaded_at: Utc::now(),
        };

        log::info!(
            "Artifacts loaded: {} trees, {} features, schema {}, sha256 {}",
            metadata.tree_count,
            metadata.feature_count,
            metadata.schema_hash,
            metadata.checksum
        );

        Ok(LoadedArtifacts {
            schema,
            forest: Arc::new(forest),
            config: Arc::new(config),
            rules: Arc::new(rules),
            metadata,
        })
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    if !path.exists() {
        return Err(ArtifactLoadError::Missing { path: path.to_path_buf() });
    }
    std::fs::read(path).map_err(|source| ArtifactLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn check_model_against_schema(forest: &Forest, schema: &FeatureSchema) -> Result<(), ArtifactLoadError> {
    if forest.num_features() != schema.len() {
        return Err(ArtifactLoadError::SchemaMismatch(format!(
            "model expects {} features, schema lists {}",
            forest.num_features(),
            schema.len()
        )));
    }

    let embedded = forest.feature_names();
    if !embedded.is_empty() {
        if let Some((i, (model, listed))) = embedded
            .iter()
            .zip(schema.names())
            .enumerate()
            .find(|(_, (m, s))| m != s)
        {
            return Err(ArtifactLoadError::SchemaMismatch(format!(
                "feature {} is '{}' in the model but '{}' in {}",
                i, model, listed, FEATURES_FILE
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::test_support::{write_artifacts, write_features, stump_model_json};

    #[test]
    fn test_load_valid_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let loaded = ArtifactStore::new(dir.path()).load().unwrap();
        assert_eq!(loaded.metadata.feature_count, loaded.schema.len());
        assert_eq!(loaded.metadata.checksum.len(), 64);
        assert_eq!(loaded.metadata.schema_hash, format!("{:08x}", loaded.schema.layout_hash()));
        assert_eq!(loaded.metadata.preprocessing_version, "bank-marketing-v2");
        assert!(loaded.metadata.tree_count > 0);
    }

    #[test]
    fn test_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        write_features(dir.path(), &["age", "campaign"]);

        let err = ArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Missing { .. }));
    }

    #[test]
    fn test_missing_features() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_FILE), stump_model_json(2, 1, &[])).unwrap();

        let err = ArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Missing { .. }));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_features(dir.path(), &["age", "campaign", "previous"]);
        std::fs::write(dir.path().join(MODEL_FILE), stump_model_json(2, 1, &[])).unwrap();

        let err = ArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactLoadError::SchemaMismatch(_)), "{}", err);
    }

    #[test]
    fn test_embedded_names_must_match() {
        let dir = tempfile::tempdir().unwrap();
        write_features(dir.path(), &["age", "campaign"]);
        std::fs::write(
            dir.path().join(MODEL_FILE),
            stump_model_json(2, 1, &["campaign", "age"]),
        )
        .unwrap();

        let err = ArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("feature 0"), "{}", err);
    }

    #[test]
    fn test_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        write_features(dir.path(), &["age"]);
        std::fs::write(dir.path().join(MODEL_FILE), b"{ not json").unwrap();

        let err = ArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Corrupt { .. }));
    }

    #[test]
    fn test_out_of_range_split_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_features(dir.path(), &["age", "campaign"]);
        // split on feature 5 with only 2 features
        std::fs::write(dir.path().join(MODEL_FILE), stump_model_json(2, 5, &[])).unwrap();

        let err = ArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Corrupt { .. }), "{}", err);
    }

    #[test]
    fn test_schema_hash_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_features(dir.path(), &["age", "campaign"]);
        std::fs::write(dir.path().join(MODEL_FILE), stump_model_json(2, 1, &[])).unwrap();
        std::fs::write(
            dir.path().join(PREPROCESSING_FILE),
            r#"{"schema_hash": 1}"#,
        )
        .unwrap();

        let err = ArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactLoadError::SchemaMismatch(_)));
    }
}
