//! Feature Reconstructor - raw record → aligned FeatureVector
//!
//! Reproduces the training-time transformation, one step per function:
//!
//! 1. [`drop_leakage`] - post-outcome fields removed
//! 2. [`derive_contact_recency`] - sentinel `pdays` → binary feature
//! 3. [`canonicalize_names`] - underscore → dot convention via rename table
//! 4. [`expand_categoricals`] - `{field}_{value}` indicators, reference skipped
//! 5. [`canonicalize_indicators`] - indicator rename table
//! 6. [`FeatureVector::align`] - reindex against the schema
//!
//! Missing, extra and unseen fields are absorbed by step 6. Only values that
//! cannot be coerced produce [`ScoringError::MalformedRecord`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::layout::FeatureSchema;
use super::preprocessing::{indicator_name, PreprocessingConfig};
use super::raw::{normalize_field_name, RawLeadRecord, RawValue};
use super::vector::FeatureVector;
use crate::error::{Result, ScoringError};

/// Field name → raw value, keyed by normalized name
pub type RawFields = BTreeMap<String, RawValue>;

/// Numeric column set before alignment
pub type Columns = BTreeMap<String, f64>;

// ============================================================================
// RECONSTRUCTOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct FeatureReconstructor {
    schema: Arc<FeatureSchema>,
    config: Arc<PreprocessingConfig>,
    reference_indicators: BTreeSet<String>,
}

impl FeatureReconstructor {
    pub fn new(schema: Arc<FeatureSchema>, config: Arc<PreprocessingConfig>) -> Self {
        let reference_indicators = config.reference_indicators();
        Self {
            schema,
            config,
            reference_indicators,
        }
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Run all steps. Stateless: the same record always yields the same vector.
    pub fn reconstruct(&self, record: &RawLeadRecord) -> Result<FeatureVector> {
        let fields = normalize_names(record);
        let fields = drop_leakage(fields, &self.config);
        let fields = derive_contact_recency(fields, &self.config)?;
        let fields = canonicalize_names(fields, &self.config);
        let columns = expand_categoricals(fields, &self.config)?;
        let columns = canonicalize_indicators(columns, &self.config, &self.reference_indicators);

        Ok(FeatureVector::align(Arc::clone(&self.schema), &columns))
    }
}

// ============================================================================
// STEPS
// ============================================================================

/// Lowercase/trim column names. On collisions the lexically last raw key wins.
pub fn normalize_names(record: &RawLeadRecord) -> RawFields {
    record
        .iter()
        .map(|(name, value)| (normalize_field_name(name), value.clone()))
        .collect()
}

/// Step 1: drop post-outcome fields, under raw or canonical spelling
pub fn drop_leakage(mut fields: RawFields, config: &PreprocessingConfig) -> RawFields {
    fields.retain(|name, _| {
        !config.is_leakage(name) && !config.is_leakage(config.canonical_field(name))
    });
    fields
}

/// Step 2: replace the sentinel-coded recency field with a 0/1 feature
pub fn derive_contact_recency(mut fields: RawFields, config: &PreprocessingConfig) -> Result<RawFields> {
    let Some(recency) = &config.contact_recency else {
        return Ok(fields);
    };

    let Some(raw) = fields.remove(&recency.source_field) else {
        return Ok(fields);
    };

    let days = match raw {
        RawValue::Null => return Ok(fields),
        RawValue::Number(n) => n,
        RawValue::Text(ref s) if s.trim().is_empty() => return Ok(fields),
        RawValue::Text(ref s) => s.trim().parse::<f64>().map_err(|_| {
            ScoringError::malformed(&recency.source_field, format!("expected days since last contact, got '{}'", s))
        })?,
        other => {
            return Err(ScoringError::malformed(
                &recency.source_field,
                format!("expected days since last contact, got {}", other.type_name()),
            ))
        }
    };

    if !days.is_finite() || days < 0.0 {
        return Err(ScoringError::malformed(
            &recency.source_field,
            format!("days since last contact must be non-negative, got {}", days),
        ));
    }

    let contacted = if days == recency.never_contacted_sentinel { 0.0 } else { 1.0 };
    fields.insert(recency.derived_feature.clone(), RawValue::Number(contacted));
    Ok(fields)
}

/// Step 3: apply the field rename table.
///
/// A field already spelled canonically wins over a renamed duplicate.
pub fn canonicalize_names(fields: RawFields, config: &PreprocessingConfig) -> RawFields {
    let (renamed, unchanged): (Vec<_>, Vec<_>) = fields
        .into_iter()
        .partition(|(name, _)| config.field_renames.contains_key(name));

    let mut out: RawFields = unchanged.into_iter().collect();
    for (name, value) in renamed {
        let canonical = config.canonical_field(&name).to_string();
        out.entry(canonical).or_insert(value);
    }
    out
}

/// Step 4: coerce numeric fields, expand the rest into indicators
pub fn expand_categoricals(fields: RawFields, config: &PreprocessingConfig) -> Result<Columns> {
    let mut columns = Columns::new();

    for (name, value) in fields {
        if let RawValue::Nested(_) = value {
            return Err(ScoringError::malformed(
                &name,
                format!("expected a scalar, got {}", value.type_name()),
            ));
        }

        if config.is_numeric(&name) {
            if let Some(n) = coerce_numeric(&name, &value)? {
                columns.insert(name, n);
            }
            continue;
        }

        match value {
            RawValue::Number(n) => {
                columns.insert(name, n);
            }
            RawValue::Bool(b) => {
                columns.insert(name, if b { 1.0 } else { 0.0 });
            }
            RawValue::Text(s) => {
                let category = s.trim();
                if category.is_empty() || config.reference_category(&name) == Some(category) {
                    continue;
                }
                columns.insert(indicator_name(&name, category), 1.0);
            }
            RawValue::Null | RawValue::Nested(_) => {}
        }
    }

    Ok(columns)
}

/// Step 5: force indicator names into canonical form
pub fn canonicalize_indicators(
    columns: Columns,
    config: &PreprocessingConfig,
    reference_indicators: &BTreeSet<String>,
) -> Columns {
    columns
        .into_iter()
        .filter_map(|(name, value)| {
            let canonical = config.canonical_indicator(&name);
            if reference_indicators.contains(canonical) {
                None
            } else {
                Some((canonical.to_string(), value))
            }
        })
        .collect()
}

fn coerce_numeric(field: &str, value: &RawValue) -> Result<Option<f64>> {
    match value {
        RawValue::Null => Ok(None),
        RawValue::Number(n) => Ok(Some(*n)),
        RawValue::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(ScoringError::malformed(
                    field,
                    format!("expected a number, got '{}'", s),
                )),
            }
        }
        RawValue::Nested(_) => Err(ScoringError::malformed(
            field,
            format!("expected a number, got {}", value.type_name()),
        )),
    }
}

// ============================================================================
// TESTS
// ============================================================================
