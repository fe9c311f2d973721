//! Raw lead records as handed over by ingestion (API payload or CSV row).

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// One raw cell.
///
/// `Nested` only exists so that non-scalar payload values reach the
/// reconstructor and get rejected there as malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Nested(serde_json::Value),
}

impl RawValue {
    /// Parse a CSV cell: empty → Null, numeric-looking → Number, else Text
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return RawValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => RawValue::Number(n),
            _ => RawValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "boolean",
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "text",
            RawValue::Nested(v) if v.is_array() => "array",
            RawValue::Nested(_) => "object",
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => RawValue::Number(f),
                None => RawValue::Nested(serde_json::Value::Number(n)),
            },
            serde_json::Value::String(s) => RawValue::Text(s),
            other => RawValue::Nested(other),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawValue::Null => serializer.serialize_none(),
            RawValue::Bool(b) => serializer.serialize_bool(*b),
            RawValue::Number(n) => serializer.serialize_f64(*n),
            RawValue::Text(s) => serializer.serialize_str(s),
            RawValue::Nested(v) => v.serialize(serializer),
        }
    }
}

/// Column name → raw value, no fixed shape
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawLeadRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawLeadRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.fields.iter()
    }

    /// Build from a JSON object. Anything else is not a record.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => Some(
                map.into_iter()
                    .map(|(k, v)| (k, RawValue::from(v)))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl FromIterator<(String, RawValue)> for RawLeadRecord {
    fn from_iter<T: IntoIterator<Item = (String, RawValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RawLeadRecord {
    type Item = (String, RawValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Normalize a column name: trim, lowercase, spaces/hyphens → `_`.
///
/// Dots survive, since the canonical schema convention uses them.
pub fn normalize_field_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' | '\t' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_cell_detects_numbers() {
        assert_eq!(RawValue::from_cell(" 35 "), RawValue::Number(35.0));
        assert_eq!(RawValue::from_cell("-1.8"), RawValue::Number(-1.8));
        assert_eq!(RawValue::from_cell("technician"), RawValue::Text("technician".into()));
        assert_eq!(RawValue::from_cell("   "), RawValue::Null);
        assert_eq!(RawValue::from_cell("NaN"), RawValue::Text("NaN".into()));
    }

    #[test]
    fn from_json_keeps_non_scalars_for_rejection() {
        let record = RawLeadRecord::from_json(json!({
            "age": 41,
            "job": "retired",
            "tags": ["a", "b"],
            "default": null,
        }))
        .unwrap();

        assert_eq!(record.get("age"), Some(&RawValue::Number(41.0)));
        assert_eq!(record.get("default"), Some(&RawValue::Null));
        assert_eq!(record.get("tags").map(RawValue::type_name), Some("array"));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(RawLeadRecord::from_json(json!([1, 2])).is_none());
    }

    #[test]
    fn to_json_round_trips_scalars() {
        let record = RawLeadRecord::new().with("age", 30i64).with("job", "admin.");
        assert_eq!(record.to_json(), json!({"age": 30.0, "job": "admin."}));
    }

    #[test]
    fn normalize_field_name_lowercases_and_replaces_separators() {
        assert_eq!(normalize_field_name(" Emp-Var Rate "), "emp_var_rate");
        assert_eq!(normalize_field_name("emp.var.rate"), "emp.var.rate");
        assert_eq!(normalize_field_name("Day_Of_Week"), "day_of_week");
    }
}
