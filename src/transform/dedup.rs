use std::hash::Hash;

use itertools::Itertools;

/// Keep the first row for each distinct key, in input order.
pub fn deduplicate<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    rows.into_iter().unique_by(key).collect()
}
