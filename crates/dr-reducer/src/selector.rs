//! Budgeted selector: grows or trims the salient set toward one budget.
//!
//! Both directions rank candidates by the same significance score. Item
//! budgets are met exactly (within the first/last floor); token budgets are
//! approached greedily and never overshot by growth.

use crate::columns::{ArrayProfile, NumericColumn};
use crate::cost::estimate_selection_tokens;
use dr_core::Budget;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Lowest-significance candidates tried per token-mode shrink step.
pub const SHRINK_WINDOW: usize = 5;

/// Final index set for one array plus its estimated cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Strictly increasing, always containing 0 and n - 1.
    pub indices: Vec<usize>,
    pub tokens: usize,
}

/// Item count an item or ratio budget asks for, clamped to `[min_points, n]`.
/// Token budgets have no item target.
pub fn item_target(budget: Budget, n: usize, min_points: usize) -> Option<usize> {
    let raw = match budget {
        Budget::Items(t) => t,
        Budget::Ratio(r) => (n as f64 * (1.0 - r)).floor().max(0.0) as usize,
        Budget::Tokens(_) => return None,
    };
    Some(raw.max(min_points).min(n))
}

/// Significance of every index: local 3-window variance plus |z| against the
/// field's sample deviation, summed over numeric fields.
pub fn significance_scores(profile: &ArrayProfile<'_>) -> Vec<f64> {
    let n = profile.records.len();
    (0..n)
        .map(|i| profile.numeric.iter().map(|col| column_significance(col, i)).sum())
        .collect()
}

fn column_significance(col: &NumericColumn, i: usize) -> f64 {
    let n = col.values.len();
    let local = if i > 0 && i + 1 < n {
        window_variance(&col.values[i - 1..=i + 1])
    } else {
        0.0
    };
    let z = if col.sample_std > 0.0 {
        ((col.values[i] - col.mean) / col.sample_std).abs()
    } else {
        0.0
    };
    local + z
}

fn window_variance(window: &[f64]) -> f64 {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Most significant first; equal scores keep index order.
fn by_significance_desc(mut candidates: Vec<usize>, scores: &[f64]) -> Vec<usize> {
    candidates.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    candidates
}

/// Least significant first; equal scores drop the later index first.
fn by_significance_asc(mut candidates: Vec<usize>, scores: &[f64]) -> Vec<usize> {
    candidates.sort_by(|&a, &b| match scores[a].total_cmp(&scores[b]) {
        Ordering::Equal => b.cmp(&a),
        other => other,
    });
    candidates
}

/// Grow or trim `salient` until it meets `budget`.
pub fn select(
    profile: &ArrayProfile<'_>,
    salient: BTreeSet<usize>,
    budget: Budget,
    min_points: usize,
) -> Selection {
    let rows = profile.records.rows();
    let n = rows.len();
    if n == 0 {
        return Selection { indices: Vec::new(), tokens: 0 };
    }
    let scores = significance_scores(profile);

    let indices = match budget {
        Budget::Tokens(target) => select_by_tokens(rows, salient, &scores, target),
        _ => {
            let target = item_target(budget, n, min_points).unwrap_or(n);
            select_by_items(salient, &scores, n, target)
        }
    };
    let tokens = estimate_selection_tokens(rows, &indices);
    Selection { indices, tokens }
}

fn select_by_items(
    mut keep: BTreeSet<usize>,
    scores: &[f64],
    n: usize,
    target: usize,
) -> Vec<usize> {
    keep.insert(0);
    keep.insert(n - 1);

    match keep.len().cmp(&target) {
        Ordering::Less => {
            let candidates = (0..n).filter(|i| !keep.contains(i)).collect();
            let needed = target - keep.len();
            let ranked = by_significance_desc(candidates, scores);
            keep.extend(ranked.into_iter().take(needed));
        }
        Ordering::Greater => {
            let removable = keep.iter().copied().filter(|&i| i != 0 && i != n - 1).collect();
            let excess = keep.len() - target;
            for i in by_significance_asc(removable, scores).into_iter().take(excess) {
                keep.remove(&i);
            }
        }
        Ordering::Equal => {}
    }
    trace!(target, kept = keep.len(), "item budget applied");
    keep.into_iter().collect()
}

fn select_by_tokens(
    rows: &[serde_json::Value],
    mut keep: BTreeSet<usize>,
    scores: &[f64],
    target: usize,
) -> Vec<usize> {
    let n = rows.len();
    keep.insert(0);
    keep.insert(n - 1);
    let mut current: Vec<usize> = keep.iter().copied().collect();
    let mut tokens = estimate_selection_tokens(rows, &current);

    if tokens < target && current.len() < n {
        let candidates = (0..n).filter(|i| !keep.contains(i)).collect();
        for idx in by_significance_desc(candidates, scores) {
            let trial = with_index(&current, idx);
            let trial_tokens = estimate_selection_tokens(rows, &trial);
            if trial_tokens > target {
                break;
            }
            current = trial;
            tokens = trial_tokens;
        }
        debug!(target, tokens, kept = current.len(), "token budget grown");
    } else if tokens > target {
        // most significant first, so the tail holds the cheapest losses
        let removable: Vec<usize> = current.iter().copied().filter(|&i| i != 0 && i != n - 1).collect();
        let mut removable = by_significance_desc(removable, scores);
        while tokens > target && !removable.is_empty() {
            let window_start = removable.len().saturating_sub(SHRINK_WINDOW);
            let mut best: Option<(usize, usize, Vec<usize>)> = None;
            for (pos, &idx) in removable.iter().enumerate().skip(window_start) {
                let trial = without_index(&current, idx);
                let trial_tokens = estimate_selection_tokens(rows, &trial);
                let better = match &best {
                    Some((_, t, _)) => trial_tokens <= *t,
                    None => true,
                };
                if better {
                    best = Some((pos, trial_tokens, trial));
                }
            }
            let Some((pos, best_tokens, trial)) = best else { break };
            removable.remove(pos);
            current = trial;
            tokens = best_tokens;
            trace!(tokens, target, kept = current.len(), "shrink step");
        }
        debug!(target, tokens, kept = current.len(), "token budget shrunk");
    }
    current
}

fn with_index(sorted: &[usize], idx: usize) -> Vec<usize> {
    let mut out = sorted.to_vec();
    if let Err(pos) = out.binary_search(&idx) {
        out.insert(pos, idx);
    }
    out
}

fn without_index(sorted: &[usize], idx: usize) -> Vec<usize> {
    sorted.iter().copied().filter(|&i| i != idx).collect()
}
