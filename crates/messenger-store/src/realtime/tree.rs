//! JSON tree operations
//!
//! The tree never stores nulls or empty objects: writing null removes a
//! node and removing the last child of an object removes the object.

use serde_json::{Map, Value};

use messenger_core::{is_server_timestamp, StorePath};

/// Read the value at `path`, null when absent
pub(crate) fn get(root: &Value, path: &StorePath) -> Value {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| node.get(segment.as_str()))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Replace the node at `path`
pub(crate) fn set(root: &mut Value, path: &StorePath, value: Value, now_millis: i64) {
    set_at(root, path.segments(), normalize(value, now_millis));
}

/// Merge `fields` into the node at `path`; field keys may be nested paths
pub(crate) fn update(root: &mut Value, path: &StorePath, fields: Map<String, Value>, now_millis: i64) {
    for (key, value) in fields {
        set_at(root, path.child(&key).segments(), normalize(value, now_millis));
    }
}

fn set_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry(head.clone()).or_insert(Value::Null);
    set_at(child, rest, value);
    if is_empty(child) {
        map.remove(head);
    }

    if map.is_empty() {
        *node = Value::Null;
    }
}

/// Strip nulls and empty objects, resolve server values
fn normalize(value: Value, now_millis: i64) -> Value {
    if is_server_timestamp(&value) {
        return Value::from(now_millis);
    }

    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v, now_millis)))
                .filter(|(_, v)| !is_empty(v))
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
