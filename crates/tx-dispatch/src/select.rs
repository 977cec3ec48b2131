//! Deterministic maximum selection.
//!
//! Inboxes carry no ordering guarantee, so every "pick the best message"
//! decision goes through [`best_by`]: the highest value wins and equal values
//! fall back to the lowest tie-break key.

use std::cmp::Ordering;

/// The item with the greatest `value`; ties go to the smallest `key`.
///
/// `NaN` values compare below every number and never win against one.
pub fn best_by<T, K, V, F>(items: impl IntoIterator<Item = T>, value: V, key: F) -> Option<T>
where
    K: Ord,
    V: Fn(&T) -> f64,
    F: Fn(&T) -> K,
{
    items.into_iter().fold(None, |best, item| match best {
        None => Some(item),
        Some(current) => {
            let by_value = rank(value(&item)).total_cmp(&rank(value(&current)));
            let better = match by_value {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => key(&item) < key(&current),
            };
            Some(if better { item } else { current })
        }
    })
}

#[inline]
fn rank(v: f64) -> f64 {
    if v.is_nan() { f64::NEG_INFINITY } else { v }
}
