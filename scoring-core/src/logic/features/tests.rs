//! Integration Tests for Feature Reconstruction
//!
//! Full reconstructor over the bank-marketing schema and default tables.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use crate::error::ScoringError;
    use crate::logic::features::{
        FeatureReconstructor, FeatureSchema, PreprocessingConfig, RawLeadRecord, RawValue,
    };
    use crate::logic::test_support::{bank_schema, sample_lead, BANK_FEATURES};

    fn reconstructor() -> FeatureReconstructor {
        FeatureReconstructor::new(bank_schema(), Arc::new(PreprocessingConfig::default()))
    }

    fn assert_schema_keys(names: &[String]) {
        assert_eq!(names.len(), BANK_FEATURES.len());
        for (got, want) in names.iter().zip(BANK_FEATURES) {
            assert_eq!(got, want);
        }
    }

    /// Key set and order equal the schema whatever the input shape
    #[test]
    fn test_output_keys_always_match_schema() {
        let r = reconstructor();
        let inputs = vec![
            RawLeadRecord::new(),
            sample_lead(),
            RawLeadRecord::new().with("favourite_colour", "green").with("zzz", 1.0),
            RawLeadRecord::new().with("JOB", "astronaut").with("Month", "jan"),
            sample_lead().with("extra_numeric", 42i64).with("marital", RawValue::Null),
        ];

        for record in &inputs {
            let vector = r.reconstruct(record).unwrap();
            assert_schema_keys(vector.feature_names());
            assert_eq!(vector.len(), BANK_FEATURES.len());
        }
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let r = reconstructor();
        let record = sample_lead();
        assert_eq!(r.reconstruct(&record).unwrap(), r.reconstruct(&record).unwrap());
    }

    #[test]
    fn test_column_order_and_casing_do_not_matter() {
        let r = reconstructor();
        let shuffled: RawLeadRecord = sample_lead()
            .into_iter()
            .rev()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        assert_eq!(r.reconstruct(&shuffled).unwrap(), r.reconstruct(&sample_lead()).unwrap());
    }

    #[test]
    fn test_duration_never_influences_output() {
        let r = reconstructor();
        let base = r.reconstruct(&sample_lead()).unwrap();
        for duration in [0.0, 1.0, 4918.0] {
            let record = sample_lead().with("duration", duration);
            assert_eq!(r.reconstruct(&record).unwrap(), base);
        }
        // even a value that would otherwise be malformed
        let record = sample_lead().with("duration", "very long");
        assert_eq!(r.reconstruct(&record).unwrap(), base);
    }

    #[test]
    fn test_pdays_sentinel_mapping() {
        let r = reconstructor();
        let never = r.reconstruct(&sample_lead().with("pdays", 999i64)).unwrap();
        assert_eq!(never.get_by_name("pernah_dihubungi"), Some(0.0));

        for days in [0i64, 3, 27] {
            let v = r.reconstruct(&sample_lead().with("pdays", days)).unwrap();
            assert_eq!(v.get_by_name("pernah_dihubungi"), Some(1.0), "pdays={}", days);
        }
        assert!(!never.feature_names().iter().any(|n| n == "pdays"));
    }

    /// Default tables against a minimal training-side feature list
    #[test]
    fn test_default_derived_feature_reaches_training_schema() {
        let schema = FeatureSchema::from_names(
            ["age", "pernah_dihubungi", "poutcome_success"].iter().map(|s| s.to_string()).collect(),
        )
        .unwrap();
        let config = Arc::new(PreprocessingConfig::default());
        assert!(config.drift_warnings(&schema).iter().all(|w| !w.contains("pernah_dihubungi")));

        let r = FeatureReconstructor::new(Arc::new(schema), config);
        let record = RawLeadRecord::new().with("age", 40i64).with("pdays", 6i64);
        let v = r.reconstruct(&record).unwrap();
        assert_eq!(v.get_by_name("pernah_dihubungi"), Some(1.0));
        assert_eq!(v.get_by_name("age"), Some(40.0));
    }

    #[test]
    fn test_missing_categorical_fills_zero() {
        let r = reconstructor();
        let mut record = sample_lead();
        record.remove("education");
        let vector = r.reconstruct(&record).unwrap();

        let education: Vec<_> = vector
            .iter()
            .filter(|(name, _)| name.starts_with("education_"))
            .collect();
        assert_eq!(education.len(), 7);
        assert!(education.iter().all(|(_, v)| *v == 0.0));
    }

    #[test]
    fn test_underscore_spellings_reach_dotted_features() {
        let r = reconstructor();
        let record = sample_lead()
            .with("education", "high_school")
            .with("job", "admin_");
        let vector = r.reconstruct(&record).unwrap();

        assert_eq!(vector.get_by_name("emp.var.rate"), Some(1.1));
        assert_eq!(vector.get_by_name("nr.employed"), Some(5191.0));
        assert_eq!(vector.get_by_name("education_high.school"), Some(1.0));
        // admin. is the reference category: no job indicator at all
        assert!(vector.iter().filter(|(n, _)| n.starts_with("job_")).all(|(_, v)| v == 0.0));
    }

    #[test]
    fn test_sample_lead_indicators() {
        let r = reconstructor();
        let vector = r.reconstruct(&sample_lead()).unwrap();

        for hot in [
            "job_technician",
            "marital_married",
            "education_university.degree",
            "housing_yes",
            "month_may",
            "day_of_week_mon",
            "poutcome_nonexistent",
        ] {
            assert_eq!(vector.get_by_name(hot), Some(1.0), "{}", hot);
        }
        // reference categories: cellular contact, no loan, no default
        assert_eq!(vector.get_by_name("contact_telephone"), Some(0.0));
        assert_eq!(vector.get_by_name("loan_yes"), Some(0.0));
        assert_eq!(vector.get_by_name("age"), Some(35.0));
    }

    #[test]
    fn test_non_numeric_in_numeric_field_is_malformed() {
        let r = reconstructor();
        let err = r.reconstruct(&sample_lead().with("euribor3m", "high")).unwrap_err();
        assert!(matches!(err, ScoringError::MalformedRecord { ref field, .. } if field == "euribor3m"));
    }

    #[test]
    fn test_nested_value_is_malformed() {
        let r = reconstructor();
        let record = sample_lead().with("job", RawValue::from(serde_json::json!(["a", "b"])));
        assert!(r.reconstruct(&record).unwrap_err().is_malformed());
    }
}
