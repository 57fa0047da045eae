//! Salience detector: the budget-independent set of indices that must survive.

use crate::columns::{ArrayProfile, NumericColumn, Records};
use dr_core::{FieldKind, ReducerConfig};
use std::collections::BTreeSet;
use tracing::trace;

/// |z| above this marks an anomaly.
pub const Z_THRESHOLD: f64 = 2.5;
/// At most this many anomalies are kept per field, lowest indices first.
pub const MAX_ANOMALIES_PER_FIELD: usize = 5;
/// Guards the z-score division for constant columns.
pub const STD_EPSILON: f64 = 1e-8;

/// First and last index, anomalies, extremes and categorical transitions.
pub fn salient_indices(profile: &ArrayProfile<'_>, config: &ReducerConfig) -> BTreeSet<usize> {
    let n = profile.records.len();
    let mut keep = BTreeSet::new();
    if n == 0 {
        return keep;
    }
    keep.insert(0);
    keep.insert(n - 1);

    if config.preserve_anomalies {
        for col in &profile.numeric {
            keep.extend(anomalies(col));
        }
    }
    if config.preserve_extremes {
        for col in &profile.numeric {
            if let Some((lo, hi)) = extremes(col) {
                keep.insert(lo);
                keep.insert(hi);
            }
        }
    }
    for field in profile.classification.fields_of(FieldKind::Significant) {
        let marks = transitions(&profile.records, field);
        trace!(field, count = marks.len(), "transition indices");
        keep.extend(marks);
    }
    keep
}

/// Indices whose population z-score exceeds [`Z_THRESHOLD`], capped per field.
pub fn anomalies(col: &NumericColumn) -> Vec<usize> {
    let denom = col.std + STD_EPSILON;
    col.values
        .iter()
        .enumerate()
        .filter(|(_, v)| ((*v - col.mean) / denom).abs() > Z_THRESHOLD)
        .map(|(i, _)| i)
        .take(MAX_ANOMALIES_PER_FIELD)
        .collect()
}

/// First argmin and first argmax.
pub fn extremes(col: &NumericColumn) -> Option<(usize, usize)> {
    let first = *col.values.first()?;
    let (mut lo, mut hi) = ((0, first), (0, first));
    for (i, &v) in col.values.iter().enumerate().skip(1) {
        if v < lo.1 {
            lo = (i, v);
        }
        if v > hi.1 {
            hi = (i, v);
        }
    }
    Some((lo.0, hi.0))
}

/// Both sides of every adjacent pair whose `field` values differ.
pub fn transitions(records: &Records<'_>, field: &str) -> Vec<usize> {
    let mut marks = Vec::new();
    for i in 1..records.len() {
        if records.value(i, field) != records.value(i - 1, field) {
            if marks.last() != Some(&(i - 1)) {
                marks.push(i - 1);
            }
            marks.push(i);
        }
    }
    marks
}
