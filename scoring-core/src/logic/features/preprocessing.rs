//! Preprocessing Config - versioned reconstruction tables
//!
//! Rename tables and reference categories are part of the model contract:
//! they ship in `preprocessing.json` next to the model and are validated
//! against the loaded schema. The defaults reproduce the bank-marketing
//! training notebook.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::layout::FeatureSchema;
use crate::error::ArtifactLoadError;

/// `pdays`-style sentinel-coded recency field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactRecency {
    /// Raw field carrying "days since last contact"
    pub source_field: String,
    /// Value meaning "never contacted"
    pub never_contacted_sentinel: f64,
    /// Binary feature emitted in place of the raw field
    pub derived_feature: String,
}

impl Default for ContactRecency {
    fn default() -> Self {
        Self {
            source_field: "pdays".to_string(),
            never_contacted_sentinel: 999.0,
            derived_feature: "pernah_dihubungi".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Version tag, bumped together with the model artifact
    pub version: String,

    /// Expected layout hash of `model_features.json` (checked when set)
    pub schema_hash: Option<u32>,

    /// Post-outcome fields, dropped before anything else
    pub leakage_fields: BTreeSet<String>,

    pub contact_recency: Option<ContactRecency>,

    /// Canonical names of fields that must coerce to numbers
    pub numeric_fields: BTreeSet<String>,

    /// Raw field name → canonical field name
    pub field_renames: BTreeMap<String, String>,

    /// Expanded indicator name → canonical indicator name
    pub indicator_renames: BTreeMap<String, String>,

    /// Categorical field → value omitted from indicator expansion
    pub reference_categories: BTreeMap<String, String>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        fn set(items: &[&str]) -> BTreeSet<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        Self {
            version: "bank-marketing-v2".to_string(),
            schema_hash: None,
            leakage_fields: set(&["duration", "y"]),
            contact_recency: Some(ContactRecency::default()),
            numeric_fields: set(&[
                "age",
                "campaign",
                "previous",
                "emp.var.rate",
                "cons.price.idx",
                "cons.conf.idx",
                "euribor3m",
                "nr.employed",
            ]),
            field_renames: map(&[
                ("emp_var_rate", "emp.var.rate"),
                ("cons_price_idx", "cons.price.idx"),
                ("cons_conf_idx", "cons.conf.idx"),
                ("nr_employed", "nr.employed"),
            ]),
            indicator_renames: map(&[
                ("job_admin_", "job_admin."),
                ("education_basic_4y", "education_basic.4y"),
                ("education_basic_6y", "education_basic.6y"),
                ("education_basic_9y", "education_basic.9y"),
                ("education_high_school", "education_high.school"),
                ("education_professional_course", "education_professional.course"),
                ("education_university_degree", "education_university.degree"),
            ]),
            reference_categories: map(&[
                ("job", "admin."),
                ("marital", "divorced"),
                ("education", "basic.4y"),
                ("default", "no"),
                ("housing", "no"),
                ("loan", "no"),
                ("contact", "cellular"),
                ("month", "apr"),
                ("day_of_week", "fri"),
                ("poutcome", "failure"),
            ]),
        }
    }
}

impl PreprocessingConfig {
    /// Load `preprocessing.json`; `Ok(None)` when the file is absent
    pub fn load(path: &Path) -> Result<Option<Self>, ArtifactLoadError> {
        if !path.exists() {
            return Ok(None);
        }

        let data = std::fs::read(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| ArtifactLoadError::corrupt(path, e.to_string()))
    }

    /// Canonical name for a normalized raw field name
    pub fn canonical_field<'a>(&'a self, name: &'a str) -> &'a str {
        self.field_renames.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Canonical name for an expanded indicator
    pub fn canonical_indicator<'a>(&'a self, name: &'a str) -> &'a str {
        self.indicator_renames.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_leakage(&self, name: &str) -> bool {
        self.leakage_fields.contains(name)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric_fields.contains(name)
    }

    pub fn reference_category(&self, field: &str) -> Option<&str> {
        self.reference_categories.get(field).map(String::as_str)
    }

    /// Indicator names that must never be emitted
    pub fn reference_indicators(&self) -> BTreeSet<String> {
        self.reference_categories
            .iter()
            .map(|(field, value)| indicator_name(field, value))
            .collect()
    }

    /// Hard check: the config was built for a different schema
    pub fn verify_schema(&self, schema: &FeatureSchema) -> Result<(), ArtifactLoadError> {
        match self.schema_hash {
            Some(expected) if expected != schema.layout_hash() => {
                Err(ArtifactLoadError::SchemaMismatch(format!(
                    "preprocessing config {} expects schema {:08x}, loaded schema is {:08x}",
                    self.version,
                    expected,
                    schema.layout_hash()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Soft check: table entries pointing at names the schema lacks.
    ///
    /// Not fatal because a numeric field may be legitimately unused, but each
    /// entry is a candidate for silent encoding drift.
    pub fn drift_warnings(&self, schema: &FeatureSchema) -> Vec<String> {
        let mut warnings = Vec::new();

        for (raw, canonical) in &self.field_renames {
            if self.is_numeric(canonical) && !schema.contains(canonical) {
                warnings.push(format!(
                    "field rename '{}' -> '{}' targets a feature missing from the schema",
                    raw, canonical
                ));
            }
        }

        let references = self.reference_indicators();
        for (raw, canonical) in &self.indicator_renames {
            if !schema.contains(canonical) && !references.contains(canonical) {
                warnings.push(format!(
                    "indicator rename '{}' -> '{}' targets a feature missing from the schema",
                    raw, canonical
                ));
            }
        }

        for reference in &references {
            if schema.contains(reference) {
                warnings.push(format!(
                    "reference indicator '{}' is present in the schema and will always be 0",
                    reference
                ));
            }
        }

        if let Some(recency) = &self.contact_recency {
            if !schema.contains(&recency.derived_feature) {
                warnings.push(format!(
                    "derived feature '{}' is missing from the schema",
                    recency.derived_feature
                ));
            }
        }

        warnings
    }
}

/// `{field}_{value}`
pub fn indicator_name(field: &str, value: &str) -> String {
    format!("{}_{}", field, value)
}
