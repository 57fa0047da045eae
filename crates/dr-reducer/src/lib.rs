//! Budgeted record-array reducer.
//!
//! Shrinks arrays of uniform records to an item count or an estimated token
//! budget while keeping the points a reader would miss most:
//! 1. Cost model: heuristic token estimate for any JSON value
//! 2. Column classifier: numeric / significant / sequence key / inert
//! 3. Salience: first/last, anomalies, extremes, state transitions
//! 4. Selector: grow or trim toward the budget by significance
//! 5. Walker: proportional budget split across arrays in nested trees

pub mod columns;
pub mod cost;
pub mod reducer;
pub mod salience;
pub mod selector;
pub mod walker;

pub use columns::{classify, ArrayProfile, Classification, Records};
pub use cost::{estimate_array_tokens, estimate_tokens};
pub use reducer::{ArrayReduction, DataReducer, Reduction};
pub use selector::Selection;
pub use dr_core::*;
