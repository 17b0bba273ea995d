//! Deep merge for settings sections
//!
//! Rules:
//! - Objects are merged recursively (later layer overrides per key)
//! - Arrays and scalars are replaced entirely by the later layer
//! - `null` in the later layer is skipped, preserving the earlier value

use serde_json::Value;

/// Merge `overlay` on top of `base`
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                if overlay_val.is_null() {
                    continue;
                }
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Look up a dotted path (`doctrine.driver.orm_default.paths`) in a tree
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_objects_merge_recursively() {
        let base = json!({"doctrine": {"driver": {"orm_default": {"cache": "array", "paths": []}}}});
        let overlay = json!({"doctrine": {"driver": {"orm_default": {"cache": "filesystem"}}}});
        let merged = deep_merge(base, overlay);
        assert_eq!(
            merged,
            json!({"doctrine": {"driver": {"orm_default": {"cache": "filesystem", "paths": []}}}})
        );
    }

    #[test]
    fn test_arrays_are_replaced() {
        let merged = deep_merge(json!({"paths": ["a"]}), json!({"paths": ["b", "c"]}));
        assert_eq!(merged, json!({"paths": ["b", "c"]}));
    }

    #[test]
    fn test_null_overlay_preserves_base() {
        let merged = deep_merge(json!({"cache": "array"}), json!({"cache": null}));
        assert_eq!(merged, json!({"cache": "array"}));
        assert_eq!(deep_merge(json!(1), Value::Null), json!(1));
    }

    #[test]
    fn test_empty_object_overlay_keeps_defaults() {
        let merged = deep_merge(json!({"connection": {"orm_default": {}}}), json!({}));
        assert_eq!(merged, json!({"connection": {"orm_default": {}}}));
    }

    #[test]
    fn test_lookup_path() {
        let tree = json!({"doctrine": {"driver": {"orm_default": {"paths": []}}}});
        assert_eq!(
            lookup_path(&tree, "doctrine.driver.orm_default.paths"),
            Some(&json!([]))
        );
        assert_eq!(lookup_path(&tree, "doctrine.connection"), None);
        assert_eq!(lookup_path(&tree, "doctrine.driver.orm_default.paths.x"), None);
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ]
    }

    fn tree() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect()))
        })
    }

    proptest! {
        #[test]
        fn prop_merge_with_self_is_identity(v in tree()) {
            prop_assert_eq!(deep_merge(v.clone(), v.clone()), v);
        }

        #[test]
        fn prop_merge_with_empty_object_keeps_base_objects(v in tree()) {
            if v.is_object() {
                prop_assert_eq!(deep_merge(v.clone(), json!({})), v);
            }
        }

        #[test]
        fn prop_merge_is_deterministic(a in tree(), b in tree()) {
            prop_assert_eq!(deep_merge(a.clone(), b.clone()), deep_merge(a, b));
        }
    }
}
