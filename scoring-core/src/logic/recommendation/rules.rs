//! Script Rules - keyword table → outreach script
//!
//! First rule whose keyword is a substring of the (lowercased) feature name
//! wins. The fallback always matches, including the placeholder driver.
//! Tables load from `scripts.json`; the built-in one targets term-deposit
//! campaigns.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::NO_POSITIVE_DRIVER;
use crate::error::ArtifactLoadError;
use crate::logic::explain::FeatureContribution;

/// Placeholder substituted into templates
const DRIVER_TOKEN: &str = "{driver}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub template: String,
}

impl ScriptRule {
    fn new(name: &str, keywords: &[&str], template: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            template: template.to_string(),
        }
    }

    fn matches(&self, feature: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && feature.contains(&k.to_lowercase()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleTable {
    pub version: String,
    /// Ordered: specific rules first
    pub rules: Vec<ScriptRule>,
    pub fallback: String,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            version: "term-deposit-v1".to_string(),
            rules: vec![
                ScriptRule::new(
                    "returning-customer",
                    &["poutcome_success", "pernah_dihubungi", "previous"],
                    "Good day! Thanks to your {driver} with us, we have prepared a term deposit offer reserved for returning customers. Could we take five minutes to walk you through it?",
                ),
                ScriptRule::new(
                    "market-conditions",
                    &["euribor", "emp.var.rate", "cons.price.idx", "cons.conf.idx", "nr.employed"],
                    "Hello! Current market conditions ({driver}) make fixed-rate term deposits especially attractive right now. Would you like to hear the rate we can lock in for you today?",
                ),
                ScriptRule::new(
                    "preferred-channel",
                    &["contact_"],
                    "Hi! We are reaching out through your preferred channel about a savings plan that fits your profile. Is now a good time for a quick two-minute overview?",
                ),
                ScriptRule::new(
                    "seasonal-timing",
                    &["month_", "day_of_week_"],
                    "Hello! This is a great moment to start growing your savings, and our seasonal term deposit offer is open now. May I share the details with you?",
                ),
                // job_ precedes the age rule: "management" contains "age"
                ScriptRule::new(
                    "career-profile",
                    &["job_", "education_"],
                    "Good day! Many customers with a similar background ({driver}) use our term deposits to build a secure financial cushion. Would you be open to a short conversation about your savings goals?",
                ),
                ScriptRule::new(
                    "life-stage",
                    &["age", "marital_"],
                    "Hello! We have savings plans shaped around your stage of life. Could I briefly explain how a term deposit could support your plans?",
                ),
                ScriptRule::new(
                    "credit-profile",
                    &["housing_", "loan_", "default_"],
                    "Hello! We can help you balance your existing commitments with a flexible savings option. Would you like to hear how it works?",
                ),
                ScriptRule::new(
                    "follow-up",
                    &["campaign"],
                    "Hello again! Following up on our earlier conversations, we now have an updated term deposit offer for you. Do you have a moment to review it together?",
                ),
            ],
            fallback: "Hello! We have a term deposit product that could help you grow your savings securely. Would you be interested in hearing more?".to_string(),
        }
    }
}

impl RuleTable {
    /// Load `scripts.json`; `Ok(None)` when the file is absent
    pub fn load(path: &Path) -> Result<Option<Self>, ArtifactLoadError> {
        if !path.exists() {
            return Ok(None);
        }

        let data = std::fs::read(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let table: Self = serde_json::from_slice(&data)
            .map_err(|e| ArtifactLoadError::corrupt(path, e.to_string()))?;
        table
            .validate()
            .map_err(|reason| ArtifactLoadError::corrupt(path, reason))?;
        Ok(Some(table))
    }

    /// Every script must close with a question
    pub fn validate(&self) -> Result<(), String> {
        if !self.fallback.trim_end().ends_with('?') {
            return Err("fallback script must end with a question".to_string());
        }
        for rule in &self.rules {
            if rule.keywords.iter().all(|k| k.is_empty()) {
                return Err(format!("rule '{}' has no keywords", rule.name));
            }
            if !rule.template.trim_end().ends_with('?') {
                return Err(format!("rule '{}' must end with a question", rule.name));
            }
        }
        Ok(())
    }

    /// Name of the rule that handles `feature`, `None` for the fallback
    pub fn matching_rule(&self, feature: &str) -> Option<&ScriptRule> {
        if feature == NO_POSITIVE_DRIVER {
            return None;
        }
        let lowered = feature.to_lowercase();
        self.rules.iter().find(|r| r.matches(&lowered))
    }

    /// Script for one driver feature
    pub fn generate(&self, feature: &str) -> String {
        match self.matching_rule(feature) {
            Some(rule) => rule.template.replace(DRIVER_TOKEN, &humanize_feature(feature)),
            None => self.fallback.replace(DRIVER_TOKEN, &humanize_feature(feature)),
        }
    }

    /// Script for a ranked driver list (first entry decides)
    pub fn generate_for(&self, top: &[FeatureContribution]) -> String {
        let driver = top.first().map(|c| c.feature.as_str()).unwrap_or(NO_POSITIVE_DRIVER);
        self.generate(driver)
    }
}

/// Readable rendering of a schema feature name
pub fn humanize_feature(feature: &str) -> String {
    let known = match feature {
        "pernah_dihubungi" => Some("previous contact history"),
        "poutcome_success" => Some("successful previous campaign"),
        "euribor3m" => Some("3-month Euribor rate"),
        "emp.var.rate" => Some("employment variation rate"),
        "cons.price.idx" => Some("consumer price index"),
        "cons.conf.idx" => Some("consumer confidence index"),
        "nr.employed" => Some("employment level"),
        NO_POSITIVE_DRIVER => Some("overall profile"),
        _ => None,
    };
    if let Some(label) = known {
        return label.to_string();
    }

    feature
        .split(|c: char| c == '_' || c == '.')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let table = RuleTable::default();
        assert_eq!(table.matching_rule("poutcome_success").unwrap().name, "returning-customer");
        assert_eq!(table.matching_rule("euribor3m").unwrap().name, "market-conditions");
        assert_eq!(table.matching_rule("contact_telephone").unwrap().name, "preferred-channel");
        assert_eq!(table.matching_rule("month_may").unwrap().name, "seasonal-timing");
        assert_eq!(table.matching_rule("job_management").unwrap().name, "career-profile");
        assert_eq!(table.matching_rule("age").unwrap().name, "life-stage");
        assert_eq!(table.matching_rule("loan_yes").unwrap().name, "credit-profile");
        assert_eq!(table.matching_rule("campaign").unwrap().name, "follow-up");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let table = RuleTable::default();
        assert_eq!(table.matching_rule("Euribor3M").unwrap().name, "market-conditions");
    }

    #[test]
    fn test_placeholder_uses_fallback() {
        let table = RuleTable::default();
        assert!(table.matching_rule(NO_POSITIVE_DRIVER).is_none());
        assert_eq!(table.generate(NO_POSITIVE_DRIVER), table.fallback);
        assert_eq!(table.generate_for(&[]), table.fallback);
        assert_eq!(
            table.generate_for(&[FeatureContribution::placeholder()]),
            table.fallback
        );
    }

    #[test]
    fn test_unknown_feature_uses_fallback() {
        let table = RuleTable::default();
        assert_eq!(table.generate("poutcome_nonexistent"), table.fallback);
    }

    #[test]
    fn test_scripts_close_with_question() {
        let table = RuleTable::default();
        assert!(table.validate().is_ok());
        for feature in ["pernah_dihubungi", "nr.employed", "job_retired", "age", "zzz"] {
            let script = table.generate(feature);
            assert!(!script.is_empty());
            assert!(script.ends_with('?'), "{}", script);
            assert!(!script.contains(DRIVER_TOKEN));
        }
    }

    #[test]
    fn test_contact_history_maps_to_returning_customer() {
        let table = RuleTable::default();
        for feature in ["pernah_dihubungi", "poutcome_success", "previous"] {
            assert_eq!(table.matching_rule(feature).unwrap().name, "returning-customer");
        }
        assert!(table.generate("pernah_dihubungi").contains("previous contact history"));
    }

    #[test]
    fn test_driver_is_humanized() {
        let table = RuleTable::default();
        let script = table.generate("job_blue-collar");
        assert!(script.contains("(job blue-collar)"), "{}", script);
        assert!(table.generate("cons.conf.idx").contains("consumer confidence index"));
    }

    #[test]
    fn test_humanize_feature() {
        assert_eq!(humanize_feature("education_university.degree"), "education university degree");
        assert_eq!(humanize_feature("pernah_dihubungi"), "previous contact history");
    }

    #[test]
    fn test_validate_rejects_statement_script() {
        let mut table = RuleTable::default();
        table.rules[0].template = "Call them now.".to_string();
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_load_absent_and_custom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scripts.json");
        assert!(RuleTable::load(&path).unwrap().is_none());

        std::fs::write(
            &path,
            r#"{"rules":[{"name":"rates","keywords":["euribor"],"template":"Rates are moving. Shall we talk?"}],
                "fallback":"Can I help you save?"}"#,
        )
        .unwrap();
        let table = RuleTable::load(&path).unwrap().unwrap();
        assert_eq!(table.generate("euribor3m"), "Rates are moving. Shall we talk?");
        assert_eq!(table.generate("age"), "Can I help you save?");

        std::fs::write(&path, r#"{"fallback":"No question here."}"#).unwrap();
        assert!(matches!(RuleTable::load(&path), Err(ArtifactLoadError::Corrupt { .. })));
    }
}
