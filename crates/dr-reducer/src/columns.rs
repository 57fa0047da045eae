//! Column classifier and per-array field statistics.

use dr_core::{FieldKind, ReducerConfig};
use serde_json::Value;
use std::collections::HashSet;

/// Read-only accessors over an array of records.
#[derive(Debug, Clone, Copy)]
pub struct Records<'a> {
    rows: &'a [Value],
}

impl<'a> Records<'a> {
    pub fn new(rows: &'a [Value]) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &'a [Value] {
        self.rows
    }

    /// Value at row `row`, field `field`.
    pub fn value(&self, row: usize, field: &str) -> Option<&'a Value> {
        self.rows.get(row)?.get(field)
    }

    /// All values of `field` across the array, `None` where a record lacks it.
    pub fn column<'f>(&self, field: &'f str) -> impl Iterator<Item = Option<&'a Value>> + 'f
    where
        'a: 'f,
    {
        let rows = self.rows;
        rows.iter().map(move |r| r.get(field))
    }

    /// Field names in order of first appearance.
    pub fn field_names(&self) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for row in self.rows {
            if let Value::Object(map) = row {
                for key in map.keys() {
                    if seen.insert(key.as_str()) {
                        names.push(key.as_str());
                    }
                }
            }
        }
        names
    }
}

/// True for a non-empty array whose every element is a mapping.
pub fn is_record_array(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}

/// Per-field tags for one array, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    fields: Vec<(String, FieldKind)>,
}

impl Classification {
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(n, k)| (n.as_str(), *k))
    }

    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, k)| *k)
    }

    pub fn fields_of(&self, kind: FieldKind) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(move |(_, k)| *k == kind).map(|(n, _)| n.as_str())
    }
}

/// Tag every field of `records`. The sequence key wins over an explicit
/// significant listing; numeric means every record holds a JSON number.
pub fn classify(records: &Records<'_>, config: &ReducerConfig) -> Classification {
    let fields = records
        .field_names()
        .into_iter()
        .map(|name| {
            let kind = if name == config.sequence_key {
                FieldKind::SequenceKey
            } else if config.significant_cols.iter().any(|c| c == name) {
                FieldKind::Significant
            } else if records.column(name).all(|v| matches!(v, Some(Value::Number(_)))) {
                FieldKind::Numeric
            } else {
                FieldKind::Inert
            };
            (name.to_string(), kind)
        })
        .collect();
    Classification { fields }
}

/// Values and moments of one numeric field.
#[derive(Debug, Clone)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<f64>,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Sample standard deviation (n - 1); 0 for a single value.
    pub sample_std: f64,
}

impl NumericColumn {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        let n = values.len() as f64;
        let mean = if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / n };
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        let std = if values.is_empty() { 0.0 } else { (ss / n).sqrt() };
        let sample_std = if values.len() > 1 { (ss / (n - 1.0)).sqrt() } else { 0.0 };
        Self { name: name.into(), values, mean, std, sample_std }
    }
}

/// Everything downstream steps need about one array, computed once.
#[derive(Debug, Clone)]
pub struct ArrayProfile<'a> {
    pub records: Records<'a>,
    pub classification: Classification,
    pub numeric: Vec<NumericColumn>,
}

impl<'a> ArrayProfile<'a> {
    pub fn build(rows: &'a [Value], config: &ReducerConfig) -> Self {
        let records = Records::new(rows);
        let classification = classify(&records, config);
        let numeric = classification
            .fields_of(FieldKind::Numeric)
            .map(|name| {
                let values = records
                    .column(name)
                    .map(|v| v.and_then(Value::as_f64).unwrap_or(0.0))
                    .collect();
                NumericColumn::new(name, values)
            })
            .collect();
        Self { records, classification, numeric }
    }
}
