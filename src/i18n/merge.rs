//! Right-biased deep merge of dictionaries.

use serde_json::{Map, Value};

use crate::i18n::dictionary::Dictionary;

/// What: Deep-merge `overlay` on top of `base`.
///
/// Inputs:
/// - `base`: Lower-priority dictionary (the bundled fallback)
/// - `overlay`: Higher-priority dictionary (cache or fresh fetch)
///
/// Output:
/// - New dictionary; neither input is modified
///
/// Details:
/// - Keys only in `base` are kept, keys only in `overlay` are added
/// - When both sides hold an object, the two are merged recursively
/// - Otherwise the `overlay` value replaces the `base` value outright, even when
///   `base` held a subtree and `overlay` a leaf
#[must_use]
pub fn deep_merge(base: &Dictionary, overlay: &Dictionary) -> Dictionary {
    Dictionary::from(merge_maps(base.as_map(), overlay.as_map()))
}

/// Recursive worker for [`deep_merge`].
fn merge_maps(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut output = base.clone();
    for (key, value) in overlay {
        let merged = match (base.get(key), value) {
            (Some(Value::Object(left)), Value::Object(right)) => {
                Value::Object(merge_maps(left, right))
            }
            (_, other) => other.clone(),
        };
        output.insert(key.clone(), merged);
    }
    output
}
