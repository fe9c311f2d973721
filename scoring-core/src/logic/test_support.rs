//! Shared fixtures: bank-marketing schema, a small hand-built forest and
//! sample leads.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::constants::{FEATURES_FILE, MODEL_FILE};
use crate::logic::artifacts::ArtifactStore;
use crate::logic::features::{FeatureSchema, RawLeadRecord};
use crate::logic::pipeline::InferencePipeline;

/// Training-time column order (numeric first, then drop-first dummies)
pub const BANK_FEATURES: &[&str] = &[
    "age",
    "campaign",
    "previous",
    "emp.var.rate",
    "cons.price.idx",
    "cons.conf.idx",
    "euribor3m",
    "nr.employed",
    "pernah_dihubungi",
    "job_blue-collar",
    "job_entrepreneur",
    "job_housemaid",
    "job_management",
    "job_retired",
    "job_self-employed",
    "job_services",
    "job_student",
    "job_technician",
    "job_unemployed",
    "job_unknown",
    "marital_married",
    "marital_single",
    "marital_unknown",
    "education_basic.6y",
    "education_basic.9y",
    "education_high.school",
    "education_illiterate",
    "education_professional.course",
    "education_university.degree",
    "education_unknown",
    "default_unknown",
    "default_yes",
    "housing_unknown",
    "housing_yes",
    "loan_unknown",
    "loan_yes",
    "contact_telephone",
    "month_aug",
    "month_dec",
    "month_jul",
    "month_jun",
    "month_mar",
    "month_may",
    "month_nov",
    "month_oct",
    "month_sep",
    "day_of_week_mon",
    "day_of_week_thu",
    "day_of_week_tue",
    "day_of_week_wed",
    "poutcome_nonexistent",
    "poutcome_success",
];

pub fn bank_schema() -> Arc<FeatureSchema> {
    Arc::new(FeatureSchema::from_names(BANK_FEATURES.iter().map(|s| s.to_string()).collect()).unwrap())
}

fn feature(name: &str) -> usize {
    BANK_FEATURES.iter().position(|f| *f == name).unwrap()
}

enum NodeDef {
    Split(usize, f32, usize, usize, f64),
    Leaf(f32, f64),
}

fn tree_json(nodes: &[NodeDef]) -> Value {
    let mut doc = json!({
        "left_children": [], "right_children": [], "split_indices": [],
        "split_conditions": [], "default_left": [], "sum_hessian": []
    });
    for node in nodes {
        let (left, right, index, condition, cover) = match *node {
            NodeDef::Split(f, t, l, r, c) => (l as i64, r as i64, f, t, c),
            NodeDef::Leaf(v, c) => (-1, -1, 0, v, c),
        };
        doc["left_children"].as_array_mut().unwrap().push(json!(left));
        doc["right_children"].as_array_mut().unwrap().push(json!(right));
        doc["split_indices"].as_array_mut().unwrap().push(json!(index));
        doc["split_conditions"].as_array_mut().unwrap().push(json!(condition));
        doc["default_left"].as_array_mut().unwrap().push(json!(0));
        doc["sum_hessian"].as_array_mut().unwrap().push(json!(cover));
    }
    doc
}

fn model_json(trees: Vec<Value>, num_feature: usize, base_score: &str, names: &[&str]) -> String {
    json!({
        "learner": {
            "feature_names": names,
            "gradient_booster": { "name": "gbtree", "model": { "trees": trees } },
            "learner_model_param": {
                "base_score": base_score,
                "num_class": "0",
                "num_feature": num_feature.to_string()
            },
            "objective": { "name": "binary:logistic" }
        },
        "version": [2, 0, 3]
    })
    .to_string()
}

/// Single stump on `split_feature`
pub fn stump_model_json(num_feature: usize, split_feature: usize, names: &[&str]) -> String {
    let tree = tree_json(&[
        NodeDef::Split(split_feature, 0.5, 1, 2, 2.0),
        NodeDef::Leaf(-1.0, 1.0),
        NodeDef::Leaf(1.0, 1.0),
    ]);
    model_json(vec![tree], num_feature, "5E-1", names)
}

/// Three shallow trees over the bank schema, base rate 11%
pub fn bank_model_json() -> String {
    let history = tree_json(&[
        NodeDef::Split(feature("pernah_dihubungi"), 0.5, 1, 2, 200.0),
        NodeDef::Split(feature("nr.employed"), 5087.0, 3, 4, 180.0),
        NodeDef::Split(feature("poutcome_success"), 0.5, 5, 6, 20.0),
        NodeDef::Leaf(0.9, 30.0),
        NodeDef::Leaf(-1.2, 150.0),
        NodeDef::Leaf(0.3, 10.0),
        NodeDef::Leaf(1.4, 10.0),
    ]);
    let rates = tree_json(&[
        NodeDef::Split(feature("euribor3m"), 1.5, 1, 2, 200.0),
        NodeDef::Leaf(0.6, 40.0),
        NodeDef::Split(feature("month_may"), 0.5, 3, 4, 160.0),
        NodeDef::Leaf(-0.2, 90.0),
        NodeDef::Leaf(-0.6, 70.0),
    ]);
    let profile = tree_json(&[
        NodeDef::Split(feature("age"), 60.0, 1, 2, 200.0),
        NodeDef::Split(feature("contact_telephone"), 0.5, 3, 4, 170.0),
        NodeDef::Leaf(0.8, 30.0),
        NodeDef::Leaf(0.1, 120.0),
        NodeDef::Leaf(-0.4, 50.0),
    ]);
    model_json(vec![history, rates, profile], BANK_FEATURES.len(), "[1.1E-1]", BANK_FEATURES)
}

pub fn write_features(dir: &Path, names: &[&str]) {
    std::fs::write(dir.join(FEATURES_FILE), serde_json::to_vec(names).unwrap()).unwrap();
}

/// Bank schema + bank model, default tables
pub fn write_artifacts(dir: &Path) {
    write_features(dir, BANK_FEATURES);
    std::fs::write(dir.join(MODEL_FILE), bank_model_json()).unwrap();
}

pub fn bank_pipeline() -> InferencePipeline {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    InferencePipeline::new(ArtifactStore::new(dir.path()).load().unwrap())
}

/// Never contacted, high employment, May call: low score
pub fn sample_lead() -> RawLeadRecord {
    RawLeadRecord::new()
        .with("age", 35i64)
        .with("job", "technician")
        .with("marital", "married")
        .with("education", "university.degree")
        .with("default", "no")
        .with("housing", "yes")
        .with("loan", "no")
        .with("contact", "cellular")
        .with("month", "may")
        .with("day_of_week", "mon")
        .with("duration", 210i64)
        .with("campaign", 2i64)
        .with("pdays", 999i64)
        .with("previous", 0i64)
        .with("poutcome", "nonexistent")
        .with("emp_var_rate", 1.1)
        .with("cons_price_idx", 93.994)
        .with("cons_conf_idx", -36.4)
        .with("euribor3m", 4.857)
        .with("nr_employed", 5191.0)
}

/// Returning customer after a successful campaign, low rates: high score
pub fn warm_lead() -> RawLeadRecord {
    sample_lead()
        .with("age", 65i64)
        .with("job", "retired")
        .with("pdays", 6i64)
        .with("previous", 1i64)
        .with("poutcome", "success")
        .with("month", "oct")
        .with("euribor3m", 0.9)
        .with("nr_employed", 5017.5)
}
