//! Small collection and string helpers shared across the workspace.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Invert a map of keys to value-sets into a map of values to key-sets.
///
/// Every value in every set becomes a key in the result, mapped to the set
/// of original keys under which it appeared.
///
/// # Examples
///
/// ```rust
/// use std::collections::{HashMap, HashSet};
/// use planchette_common::util::inverse;
///
/// let aliases = HashMap::from([
///     (0, HashSet::from(["zero", "naught"])),
///     (1, HashSet::from(["one"])),
/// ]);
/// let by_name = inverse(&aliases);
/// assert_eq!(by_name["zero"], HashSet::from([0]));
/// assert_eq!(by_name["naught"], HashSet::from([0]));
/// assert_eq!(by_name["one"], HashSet::from([1]));
/// ```
pub fn inverse<K, V>(map: &HashMap<K, HashSet<V>>) -> HashMap<V, HashSet<K>>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    let mut result: HashMap<V, HashSet<K>> = HashMap::new();
    for (key, values) in map {
        for value in values {
            result
                .entry(value.clone())
                .or_default()
                .insert(key.clone());
        }
    }
    result
}

/// Truncate `text` to at most `max_chars` characters for log output,
/// replacing the tail with a single ellipsis when anything was cut.
///
/// Operates on characters, not bytes, so multi-byte input stays valid.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
