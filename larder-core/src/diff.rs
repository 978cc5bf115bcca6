//! Value diffing for partial updates.
//!
//! The store treats object-valued writes as patches: the candidate value is
//! merged onto the current value, and `modified` events carry only the
//! fields that actually changed, together with the prior values at exactly
//! those paths. The functions here compute those partials.
//!
//! Equality throughout is deep value equality as defined by
//! [`serde_json::Value`]: object keys compare order-independently, array
//! elements order-dependently. Scalars and arrays are replaced wholesale;
//! only object-valued fields are recursed into.

use serde_json::{Map, Value};

/// Whether a value participates in patch-merge semantics.
///
/// Arrays and scalars are opaque: a changed array replaces the old one
/// wholesale and never merges element-wise.
pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

/// Merge `candidate` onto `current` as a shallow patch.
///
/// Fields present in `candidate` win; fields only in `current` are
/// preserved. The merge is shallow: an object-valued field in `candidate`
/// replaces the whole field, and the differ recovers the nested change set
/// afterwards.
pub fn patch(current: &Map<String, Value>, candidate: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = current.clone();
    for (name, value) in candidate {
        merged.insert(name.clone(), value.clone());
    }
    merged
}

/// Answer "what is new or different about `candidate`?".
///
/// Returns the partial containing every field of `candidate` that is absent
/// from `current` or differs from it. Object-valued fields present on both
/// sides are recursed into and included only if their sub-diff is
/// non-empty.
///
/// ```
/// use serde_json::json;
/// use larder_core::diff::whats_different;
///
/// let current = json!({"a": 1, "b": {"x": 1, "y": 2}});
/// let candidate = json!({"a": 1, "b": {"x": 5, "y": 2}, "c": 9});
/// let diff = whats_different(
///     current.as_object().unwrap(),
///     candidate.as_object().unwrap(),
/// );
/// assert_eq!(serde_json::Value::Object(diff), json!({"b": {"x": 5}, "c": 9}));
/// ```
pub fn whats_different(
    current: &Map<String, Value>,
    candidate: &Map<String, Value>,
) -> Map<String, Value> {
    let mut partial = Map::new();
    for (name, new_value) in candidate {
        match current.get(name) {
            Some(Value::Object(old_fields)) if new_value.is_object() => {
                let new_fields = new_value.as_object().expect("checked is_object");
                let sub = whats_different(old_fields, new_fields);
                if !sub.is_empty() {
                    partial.insert(name.clone(), Value::Object(sub));
                }
            }
            Some(old_value) => {
                if old_value != new_value {
                    partial.insert(name.clone(), new_value.clone());
                }
            }
            None => {
                partial.insert(name.clone(), new_value.clone());
            }
        }
    }
    partial
}

/// Recover the prior values at the paths named by `changed`.
///
/// Mirrors the shape produced by [`whats_different`]: for every path in
/// `changed` that exists in `current`, the result holds `current`'s value
/// at that path. Paths new in the candidate have no prior value and are
/// omitted.
pub fn previously(
    current: &Map<String, Value>,
    changed: &Map<String, Value>,
) -> Map<String, Value> {
    let mut prior = Map::new();
    for (name, changed_value) in changed {
        if let Some(old_value) = current.get(name) {
            match (old_value, changed_value) {
                (Value::Object(old_fields), Value::Object(changed_fields)) => {
                    prior.insert(
                        name.clone(),
                        Value::Object(previously(old_fields, changed_fields)),
                    );
                }
                _ => {
                    prior.insert(name.clone(), old_value.clone());
                }
            }
        }
    }
    prior
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: &Value) -> &Map<String, Value> {
        value.as_object().expect("test value must be an object")
    }

    #[test]
    fn unchanged_fields_are_omitted() {
        let current = json!({"a": 1, "b": 2});
        let candidate = json!({"a": 1, "b": 3});
        let diff = whats_different(obj(&current), obj(&candidate));
        assert_eq!(Value::Object(diff), json!({"b": 3}));
    }

    #[test]
    fn new_fields_are_included() {
        let current = json!({"a": 1});
        let candidate = json!({"a": 2, "d": 1});
        let diff = whats_different(obj(&current), obj(&candidate));
        assert_eq!(Value::Object(diff), json!({"a": 2, "d": 1}));
    }

    #[test]
    fn nested_objects_diff_recursively() {
        let current = json!({"a": 1, "b": {"x": 1, "y": 2}});
        let candidate = json!({"a": 1, "b": {"x": 5, "y": 2}, "c": 9});
        let diff = whats_different(obj(&current), obj(&candidate));
        assert_eq!(Value::Object(diff), json!({"b": {"x": 5}, "c": 9}));
    }

    #[test]
    fn identical_nested_objects_produce_empty_diff() {
        let current = json!({"b": {"x": 1}});
        let candidate = json!({"b": {"x": 1}});
        let diff = whats_different(obj(&current), obj(&candidate));
        assert!(diff.is_empty());
    }

    #[test]
    fn arrays_replace_wholesale() {
        let current = json!({"list": [1, 2, 3]});
        let candidate = json!({"list": [1, 2, 4]});
        let diff = whats_different(obj(&current), obj(&candidate));
        assert_eq!(Value::Object(diff), json!({"list": [1, 2, 4]}));
    }

    #[test]
    fn previously_mirrors_changed_paths() {
        let current = json!({"a": 1, "b": {"x": 1, "y": 2}});
        let candidate = json!({"a": 1, "b": {"x": 5}, "c": 9});
        let merged = patch(obj(&current), obj(&candidate));
        let changed = whats_different(obj(&current), &merged);
        let prior = previously(obj(&current), &changed);

        // Only actually-changed paths appear; `c` is new and has no prior.
        assert_eq!(Value::Object(changed.clone()), json!({"b": {"x": 5}, "c": 9}));
        assert_eq!(Value::Object(prior), json!({"b": {"x": 1}}));
    }

    #[test]
    fn patch_preserves_missing_fields() {
        let current = json!({"a": 1, "b": 2});
        let candidate = json!({"b": 3});
        let merged = patch(obj(&current), obj(&candidate));
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3}));
    }

    #[test]
    fn scalar_to_object_change_is_included_wholesale() {
        let current = json!({"a": 1});
        let candidate = json!({"a": {"nested": true}});
        let diff = whats_different(obj(&current), obj(&candidate));
        assert_eq!(Value::Object(diff), json!({"a": {"nested": true}}));

        let prior = previously(obj(&current), obj(&candidate));
        assert_eq!(Value::Object(prior), json!({"a": 1}));
    }

    #[test]
    fn object_key_order_does_not_affect_equality() {
        let current = json!({"pair": {"x": 1, "y": 2}});
        let candidate = json!({"pair": {"y": 2, "x": 1}});
        let diff = whats_different(obj(&current), obj(&candidate));
        assert!(diff.is_empty());
    }
}
