//! Structure walker: finds record arrays anywhere in a tree, shares one
//! budget among them and rebuilds the tree around the compressed arrays.
//!
//! Two passes over the same depth-first order:
//! 1. discovery records every record array with its size, cost and plan;
//! 2. reconstruction consumes the plans in order, so each decision is made
//!    exactly once.

use crate::columns::is_record_array;
use crate::cost::estimate_array_tokens;
use crate::reducer::DataReducer;
use dr_core::{
    percentage, reduction_ratio, ArrayPlan, Budget, CompressionDetail, ReducerConfig, SkipReason,
    SkipRules, SkippedDetail, TargetAllocation, TreeReport,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// One record array found during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredArray {
    pub path: String,
    pub size: usize,
    pub tokens: usize,
    pub plan: ArrayPlan,
}

impl DiscoveredArray {
    pub fn is_compressible(&self) -> bool {
        matches!(self.plan, ArrayPlan::Compress(_))
    }

    pub fn allocated(&self) -> Option<usize> {
        match self.plan {
            ArrayPlan::Compress(Budget::Items(n) | Budget::Tokens(n)) => Some(n),
            _ => None,
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Depth-first discovery. Every record array gets a skip-or-compress plan;
/// compressible arrays start with the configured ratio budget until
/// [`allocate`] assigns their share of an absolute total.
pub fn discover(root: &Value, config: &ReducerConfig, rules: &SkipRules) -> Vec<DiscoveredArray> {
    let mut found = Vec::new();
    collect(root, "", config, rules, &mut found);
    found
}

fn collect(
    value: &Value,
    path: &str,
    config: &ReducerConfig,
    rules: &SkipRules,
    found: &mut Vec<DiscoveredArray>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                collect(child, &child_path(path, key), config, rules, found);
            }
        }
        Value::Array(items) if is_record_array(items) => {
            let tokens = estimate_array_tokens(items);
            let plan = match plan_for(path, items.len(), tokens, config, rules) {
                Some(reason) => {
                    debug!(path, tokens, reason = %reason.describe(), "skipping array");
                    ArrayPlan::Skip(reason)
                }
                None => ArrayPlan::Compress(Budget::Ratio(config.reduction_ratio)),
            };
            debug!(path, size = items.len(), tokens, "found record array");
            found.push(DiscoveredArray { path: path.to_string(), size: items.len(), tokens, plan });
        }
        _ => {}
    }
}

fn plan_for(
    path: &str,
    size: usize,
    tokens: usize,
    config: &ReducerConfig,
    rules: &SkipRules,
) -> Option<SkipReason> {
    if let Some(reason) = rules.check(path) {
        return Some(reason);
    }
    if size < config.min_array_size {
        return Some(SkipReason::BelowMinSize { size, min: config.min_array_size });
    }
    if tokens < config.min_array_tokens {
        return Some(SkipReason::BelowMinTokens { tokens, min: config.min_array_tokens });
    }
    None
}

/// `floor(total * weight / sum(weights))` per weight. Sums to at most `total`.
pub fn proportional_shares(total: usize, weights: &[usize]) -> Vec<usize> {
    let sum: u128 = weights.iter().map(|&w| w as u128).sum();
    weights
        .iter()
        .map(|&w| if sum == 0 { 0 } else { (total as u128 * w as u128 / sum) as usize })
        .collect()
}

/// Replace the ratio placeholder of every compressible array with its share
/// of an absolute total: tokens split by estimated cost, items by size.
pub fn allocate(arrays: &mut [DiscoveredArray], total: Budget) {
    let (total, by_tokens) = match total {
        Budget::Tokens(t) => (t, true),
        Budget::Items(t) => (t, false),
        Budget::Ratio(_) => return,
    };
    let weights: Vec<usize> = arrays
        .iter()
        .filter(|a| a.is_compressible())
        .map(|a| if by_tokens { a.tokens } else { a.size })
        .collect();
    let mut shares = proportional_shares(total, &weights).into_iter();
    for array in arrays.iter_mut().filter(|a| a.is_compressible()) {
        let share = shares.next().unwrap_or(0);
        array.plan = ArrayPlan::Compress(if by_tokens { Budget::Tokens(share) } else { Budget::Items(share) });
        debug!(path = %array.path, weight = if by_tokens { array.tokens } else { array.size }, share, "allocated budget");
    }
}

/// Discover, allocate, compress and rebuild. Never fails: a tree with no
/// compressible arrays comes back unchanged with an explanatory report.
pub fn reduce_tree(reducer: &DataReducer, root: Value) -> (Value, TreeReport) {
    let config = reducer.config();
    let mut arrays = discover(&root, config, reducer.skip_rules());

    let compressible_tokens: usize = arrays.iter().filter(|a| a.is_compressible()).map(|a| a.tokens).sum();
    let compressible_size: usize = arrays.iter().filter(|a| a.is_compressible()).map(|a| a.size).sum();
    let skipped_tokens: usize = arrays.iter().filter(|a| !a.is_compressible()).map(|a| a.tokens).sum();
    let skipped_size: usize = arrays.iter().filter(|a| !a.is_compressible()).map(|a| a.size).sum();
    let compressible_count = arrays.iter().filter(|a| a.is_compressible()).count();

    let target_total = match config.budget() {
        Budget::Ratio(_) => None,
        absolute => Some(absolute),
    };

    let mut report = TreeReport {
        arrays_found: arrays.len(),
        arrays_compressible: compressible_count,
        arrays_skipped: arrays.len() - compressible_count,
        total_original_tokens: compressible_tokens + skipped_tokens,
        total_compressible_tokens: compressible_tokens,
        total_skipped_tokens: skipped_tokens,
        total_compressed_tokens: skipped_tokens,
        total_original_size: compressible_size + skipped_size,
        total_compressed_size: skipped_size,
        target_total,
        skipped_details: arrays
            .iter()
            .filter_map(|a| match &a.plan {
                ArrayPlan::Skip(reason) => Some(SkippedDetail {
                    path: a.path.clone(),
                    size: a.size,
                    tokens: a.tokens,
                    reason: reason.describe(),
                }),
                ArrayPlan::Compress(_) => None,
            })
            .collect(),
        ..TreeReport::default()
    };

    if compressible_count == 0 {
        info!(arrays = arrays.len(), "no compressible arrays found");
        report.message = Some("No compressible arrays found".into());
        finish_ratios(&mut report);
        return (root, report);
    }

    if let Some(total) = target_total {
        info!(?total, arrays = compressible_count, "distributing budget");
        allocate(&mut arrays, total);
    }

    let mut plans = arrays.iter();
    let data = rebuild(root, reducer, &mut plans, compressible_tokens, compressible_size, &mut report);
    finish_ratios(&mut report);
    (data, report)
}

fn rebuild<'p>(
    value: Value,
    reducer: &DataReducer,
    plans: &mut impl Iterator<Item = &'p DiscoveredArray>,
    compressible_tokens: usize,
    compressible_size: usize,
    report: &mut TreeReport,
) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                let child = rebuild(child, reducer, plans, compressible_tokens, compressible_size, report);
                out.insert(key, child);
            }
            Value::Object(out)
        }
        Value::Array(items) if is_record_array(&items) => {
            let Some(array) = plans.next() else {
                return Value::Array(items);
            };
            let &ArrayPlan::Compress(budget) = &array.plan else {
                return Value::Array(items);
            };
            let out = reducer.compress_array(items, budget);
            let meta = &out.metadata;
            let proportion = match budget {
                Budget::Items(_) => share_of(array.size, compressible_size),
                _ => share_of(array.tokens, compressible_tokens),
            };

            report.arrays_compressed += 1;
            report.total_compressed_tokens += meta.compressed_tokens;
            report.total_compressed_size += meta.compressed_size;
            report.compression_details.push(CompressionDetail {
                path: array.path.clone(),
                original_size: meta.original_size,
                compressed_size: meta.compressed_size,
                original_tokens: meta.original_tokens,
                compressed_tokens: meta.compressed_tokens,
                compression_ratio: meta.compression_ratio,
                token_compression_ratio: meta.token_compression_ratio,
                allocated_target: array.allocated(),
                proportion_of_compressible: proportion,
            });
            report.target_distribution.push(TargetAllocation {
                path: array.path.clone(),
                allocated_target: array.allocated(),
                proportion,
            });
            Value::Array(out.records)
        }
        other => other,
    }
}

fn share_of(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn finish_ratios(report: &mut TreeReport) {
    report.overall_compression_ratio =
        reduction_ratio(report.total_original_tokens, report.total_compressed_tokens);
    report.overall_compression_percentage = percentage(report.overall_compression_ratio);
    let compressible_compressed = report.total_compressed_tokens - report.total_skipped_tokens;
    report.compressible_compression_ratio =
        reduction_ratio(report.total_compressible_tokens, compressible_compressed);
    report.compressible_compression_percentage = percentage(report.compressible_compression_ratio);
}
